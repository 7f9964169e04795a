use std::cmp::Ordering;
use std::fmt::{
  self,
  Write as _
};
use std::sync::OnceLock;

use chrono::format::{
  Item,
  StrftimeItems
};
use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;
use serde::{
  Deserialize,
  Serialize
};

use crate::error::DateError;

const TIMEZONE_ENV_VAR: &str =
  "SATURN_TIMEZONE";

const DEFAULT_MONTH_NAMES_LONG: [&str;
  12] = [
  "January",
  "February",
  "March",
  "April",
  "May",
  "June",
  "July",
  "August",
  "September",
  "October",
  "November",
  "December"
];

const DEFAULT_MONTH_NAMES_SHORT: [&str;
  12] = [
  "Jan", "Feb", "Mar", "Apr", "May",
  "Jun", "Jul", "Aug", "Sep", "Oct",
  "Nov", "Dec"
];

const DEFAULT_MONTH_NAMES_NARROW: [&str;
  12] = [
  "J", "F", "M", "A", "M", "J", "J",
  "A", "S", "O", "N", "D"
];

const DEFAULT_DAY_OF_WEEK_NAMES_LONG:
  [&str; 7] = [
  "Sunday",
  "Monday",
  "Tuesday",
  "Wednesday",
  "Thursday",
  "Friday",
  "Saturday"
];

const DEFAULT_DAY_OF_WEEK_NAMES_SHORT:
  [&str; 7] = [
  "Sun", "Mon", "Tue", "Wed", "Thu",
  "Fri", "Sat"
];

const DEFAULT_DAY_OF_WEEK_NAMES_NARROW:
  [&str; 7] =
  ["S", "M", "T", "W", "T", "F", "S"];

/// First day of week per locale (0 =
/// Sunday). Locales missing here fall
/// back to their two-letter language,
/// then to Sunday.
const FIRST_DAY_OF_WEEK: &[(&str, u32)] = &[
  ("af", 1),
  ("ar", 6),
  ("ar-ly", 6),
  ("ar-ma", 6),
  ("ar-tn", 1),
  ("az", 1),
  ("be", 1),
  ("bg", 1),
  ("bm", 1),
  ("br", 1),
  ("bs", 1),
  ("ca", 1),
  ("cs", 1),
  ("cv", 1),
  ("cy", 1),
  ("da", 1),
  ("de", 1),
  ("de-at", 1),
  ("de-ch", 1),
  ("el", 1),
  ("en-au", 1),
  ("en-gb", 1),
  ("en-ie", 1),
  ("en-nz", 1),
  ("eo", 1),
  ("es", 1),
  ("es-do", 1),
  ("et", 1),
  ("eu", 1),
  ("fa", 6),
  ("fi", 1),
  ("fo", 1),
  ("fr", 1),
  ("fr-ch", 1),
  ("fy", 1),
  ("gd", 1),
  ("gl", 1),
  ("gom-latn", 1),
  ("hr", 1),
  ("hu", 1),
  ("hy-am", 1),
  ("id", 1),
  ("is", 1),
  ("it", 1),
  ("jv", 1),
  ("ka", 1),
  ("kk", 1),
  ("km", 1),
  ("ky", 1),
  ("lb", 1),
  ("lt", 1),
  ("lv", 1),
  ("me", 1),
  ("mi", 1),
  ("mk", 1),
  ("ms", 1),
  ("ms-my", 1),
  ("mt", 1),
  ("my", 1),
  ("nb", 1),
  ("nl", 1),
  ("nl-be", 1),
  ("nn", 1),
  ("pl", 1),
  ("pt", 1),
  ("pt-br", 0),
  ("ro", 1),
  ("ru", 1),
  ("sd", 1),
  ("se", 1),
  ("sk", 1),
  ("sl", 1),
  ("sq", 1),
  ("sr", 1),
  ("sr-cyrl", 1),
  ("ss", 1),
  ("sv", 1),
  ("sw", 1),
  ("tet", 1),
  ("tg", 1),
  ("tl-ph", 1),
  ("tlh", 1),
  ("tr", 1),
  ("tzl", 1),
  ("tzm", 6),
  ("tzm-latn", 6),
  ("ug-cn", 1),
  ("uk", 1),
  ("ur", 1),
  ("uz", 1),
  ("uz-latn", 1),
  ("vi", 1),
  ("x-pseudo", 1),
  ("yo", 1),
  ("zh-cn", 1)
];

const ISO_8601_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}(?:T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|(?:(?:\+|-)\d{2}:\d{2}))?)?$";

/// Width of a month or weekday name.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NameStyle {
  Long,
  Short,
  Narrow
}

/// Outcome of turning text into a date.
/// Empty input is not an error; invalid
/// input is remembered by the input
/// binding for its parse validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed<D> {
  Empty,
  Valid(D),
  Invalid
}

impl<D> Parsed<D> {
  pub fn is_valid(&self) -> bool {
    !matches!(self, Self::Invalid)
  }

  pub fn into_option(self) -> Option<D> {
    match self {
      | Self::Valid(date) => Some(date),
      | Self::Empty | Self::Invalid => {
        None
      }
    }
  }
}

/// Patterns used to parse and display
/// dates, in `strftime` syntax.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct DateFormats {
  #[serde(
    default = "default_date_input"
  )]
  pub date_input:            String,
  #[serde(
    default = "default_month_year_label"
  )]
  pub month_year_label:      String,
  #[serde(
    default = "default_date_a11y_label"
  )]
  pub date_a11y_label:       String,
  #[serde(
    default = "default_month_year_a11y_label"
  )]
  pub month_year_a11y_label: String
}

fn default_date_input() -> String {
  "%Y-%m-%d".to_string()
}

fn default_month_year_label() -> String
{
  "%b %Y".to_string()
}

fn default_date_a11y_label() -> String {
  "%B %-d, %Y".to_string()
}

fn default_month_year_a11y_label()
-> String {
  "%B %Y".to_string()
}

impl Default for DateFormats {
  fn default() -> Self {
    Self {
      date_input:
        default_date_input(),
      month_year_label:
        default_month_year_label(),
      date_a11y_label:
        default_date_a11y_label(),
      month_year_a11y_label:
        default_month_year_a11y_label()
    }
  }
}

impl DateFormats {
  /// Replaces blank patterns with the
  /// defaults.
  pub fn sanitize(&mut self) {
    if self.date_input.trim().is_empty() {
      self.date_input =
        default_date_input();
    }
    if self
      .month_year_label
      .trim()
      .is_empty()
    {
      self.month_year_label =
        default_month_year_label();
    }
    if self
      .date_a11y_label
      .trim()
      .is_empty()
    {
      self.date_a11y_label =
        default_date_a11y_label();
    }
    if self
      .month_year_a11y_label
      .trim()
      .is_empty()
    {
      self.month_year_a11y_label =
        default_month_year_a11y_label();
    }
  }
}

/// Date arithmetic, naming and text
/// conversion consumed by the views and
/// controllers. Months are 1-based and
/// weekdays count from Sunday = 0.
pub trait DateAdapter {
  type Date: Clone
    + fmt::Debug
    + PartialEq;

  fn today(&self) -> Self::Date;

  fn create_date(
    &self,
    year: i32,
    month: u32,
    day: u32
  ) -> Result<Self::Date, DateError>;

  fn parse(
    &self,
    text: &str,
    pattern: &str
  ) -> Parsed<Self::Date>;

  fn format(
    &self,
    date: &Self::Date,
    pattern: &str
  ) -> Result<String, DateError>;

  fn is_valid(
    &self,
    _date: &Self::Date
  ) -> bool {
    true
  }

  /// Accepts ISO 8601 text only. Empty
  /// text deserializes to nothing.
  fn deserialize(
    &self,
    raw: &str
  ) -> Parsed<Self::Date>;

  fn add_calendar_days(
    &self,
    date: &Self::Date,
    days: i64
  ) -> Self::Date;

  fn add_calendar_months(
    &self,
    date: &Self::Date,
    months: i32
  ) -> Self::Date;

  fn add_calendar_years(
    &self,
    date: &Self::Date,
    years: i32
  ) -> Self::Date {
    self.add_calendar_months(
      date,
      years.saturating_mul(12)
    )
  }

  fn get_year(
    &self,
    date: &Self::Date
  ) -> i32;

  fn get_month(
    &self,
    date: &Self::Date
  ) -> u32;

  fn get_date(
    &self,
    date: &Self::Date
  ) -> u32;

  fn get_day_of_week(
    &self,
    date: &Self::Date
  ) -> u32;

  fn get_first_day_of_week(&self) -> u32;

  fn get_num_days_in_month(
    &self,
    date: &Self::Date
  ) -> u32;

  fn get_month_names(
    &self,
    style: NameStyle
  ) -> Vec<String>;

  fn get_day_of_week_names(
    &self,
    style: NameStyle
  ) -> Vec<String>;

  fn get_date_names(&self) -> Vec<String>;

  fn get_year_name(
    &self,
    date: &Self::Date
  ) -> String {
    self.get_year(date).to_string()
  }

  fn to_iso8601(
    &self,
    date: &Self::Date
  ) -> String;

  fn compare_date(
    &self,
    first: &Self::Date,
    second: &Self::Date
  ) -> Ordering {
    self
      .get_year(first)
      .cmp(&self.get_year(second))
      .then_with(|| {
        self
          .get_month(first)
          .cmp(&self.get_month(second))
      })
      .then_with(|| {
        self
          .get_date(first)
          .cmp(&self.get_date(second))
      })
  }

  fn same_date(
    &self,
    first: Option<&Self::Date>,
    second: Option<&Self::Date>
  ) -> bool {
    match (first, second) {
      | (Some(a), Some(b)) => {
        self.compare_date(a, b)
          == Ordering::Equal
      }
      | (None, None) => true,
      | _ => false
    }
  }

  fn clamp_date(
    &self,
    date: &Self::Date,
    min: Option<&Self::Date>,
    max: Option<&Self::Date>
  ) -> Self::Date {
    if let Some(min) = min
      && self.compare_date(date, min)
        == Ordering::Less
    {
      return min.clone();
    }
    if let Some(max) = max
      && self.compare_date(date, max)
        == Ordering::Greater
    {
      return max.clone();
    }
    date.clone()
  }
}

/// `DateAdapter` over `chrono::NaiveDate`.
/// Names are English; the locale only
/// picks the first day of the week.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeDateAdapter {
  locale:   String,
  timezone: Tz
}

impl Default for NativeDateAdapter {
  fn default() -> Self {
    Self::new("en-US")
  }
}

impl NativeDateAdapter {
  pub fn new(locale: &str) -> Self {
    Self {
      locale:   locale.trim().to_string(),
      timezone: chrono_tz::UTC
    }
  }

  #[must_use]
  pub fn with_timezone(
    mut self,
    timezone: Tz
  ) -> Self {
    self.timezone = timezone;
    self
  }

  pub fn locale(&self) -> &str {
    &self.locale
  }

  pub fn timezone(&self) -> Tz {
    self.timezone
  }
}

impl DateAdapter for NativeDateAdapter {
  type Date = NaiveDate;

  fn today(&self) -> NaiveDate {
    Utc::now()
      .with_timezone(&self.timezone)
      .date_naive()
  }

  fn create_date(
    &self,
    year: i32,
    month: u32,
    day: u32
  ) -> Result<NaiveDate, DateError> {
    if !(1..=12).contains(&month) {
      return Err(DateError::InvalidMonth {
        month
      });
    }
    NaiveDate::from_ymd_opt(
      year, month, day
    )
    .ok_or(DateError::InvalidDay {
      year,
      month,
      day
    })
  }

  fn parse(
    &self,
    text: &str,
    pattern: &str
  ) -> Parsed<NaiveDate> {
    let token = text.trim();
    if token.is_empty() {
      return Parsed::Empty;
    }

    if let Ok(date) =
      NaiveDate::parse_from_str(
        token, pattern
      )
    {
      return Parsed::Valid(date);
    }

    match NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    ) {
      | Ok(date) => Parsed::Valid(date),
      | Err(err) => {
        tracing::trace!(
          text = token,
          pattern,
          error = %err,
          "date text did not parse"
        );
        Parsed::Invalid
      }
    }
  }

  fn format(
    &self,
    date: &NaiveDate,
    pattern: &str
  ) -> Result<String, DateError> {
    if StrftimeItems::new(pattern)
      .any(|item| {
        matches!(item, Item::Error)
      })
    {
      return Err(
        DateError::InvalidPattern {
          pattern: pattern.to_string()
        }
      );
    }

    let mut out = String::new();
    write!(
      out,
      "{}",
      date.format_with_items(
        StrftimeItems::new(pattern)
      )
    )
    .map_err(|err| {
      DateError::Format {
        reason: err.to_string()
      }
    })?;
    Ok(out)
  }

  fn deserialize(
    &self,
    raw: &str
  ) -> Parsed<NaiveDate> {
    let token = raw.trim();
    if token.is_empty() {
      return Parsed::Empty;
    }

    let Some(iso) = iso_8601_regex()
    else {
      tracing::error!(
        "iso 8601 regex failed to \
         compile"
      );
      return Parsed::Invalid;
    };
    if !iso.is_match(token) {
      return Parsed::Invalid;
    }

    token
      .get(..10)
      .and_then(|day| {
        NaiveDate::parse_from_str(
          day, "%Y-%m-%d"
        )
        .ok()
      })
      .map_or(
        Parsed::Invalid,
        Parsed::Valid
      )
  }

  fn add_calendar_days(
    &self,
    date: &NaiveDate,
    days: i64
  ) -> NaiveDate {
    add_days(*date, days)
  }

  fn add_calendar_months(
    &self,
    date: &NaiveDate,
    months: i32
  ) -> NaiveDate {
    shift_months(*date, months)
  }

  fn get_year(
    &self,
    date: &NaiveDate
  ) -> i32 {
    date.year()
  }

  fn get_month(
    &self,
    date: &NaiveDate
  ) -> u32 {
    date.month()
  }

  fn get_date(
    &self,
    date: &NaiveDate
  ) -> u32 {
    date.day()
  }

  fn get_day_of_week(
    &self,
    date: &NaiveDate
  ) -> u32 {
    date
      .weekday()
      .num_days_from_sunday()
  }

  fn get_first_day_of_week(&self) -> u32 {
    let locale =
      self.locale.to_ascii_lowercase();
    let lookup = |key: &str| {
      FIRST_DAY_OF_WEEK
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, day)| *day)
    };
    lookup(locale.as_str())
      .or_else(|| {
        locale
          .get(..2)
          .and_then(lookup)
      })
      .unwrap_or(0)
  }

  fn get_num_days_in_month(
    &self,
    date: &NaiveDate
  ) -> u32 {
    days_in_month(
      date.year(),
      date.month()
    )
  }

  fn get_month_names(
    &self,
    style: NameStyle
  ) -> Vec<String> {
    let names = match style {
      | NameStyle::Long => {
        &DEFAULT_MONTH_NAMES_LONG
      }
      | NameStyle::Short => {
        &DEFAULT_MONTH_NAMES_SHORT
      }
      | NameStyle::Narrow => {
        &DEFAULT_MONTH_NAMES_NARROW
      }
    };
    names
      .iter()
      .map(|name| name.to_string())
      .collect()
  }

  fn get_day_of_week_names(
    &self,
    style: NameStyle
  ) -> Vec<String> {
    let names = match style {
      | NameStyle::Long => {
        &DEFAULT_DAY_OF_WEEK_NAMES_LONG
      }
      | NameStyle::Short => {
        &DEFAULT_DAY_OF_WEEK_NAMES_SHORT
      }
      | NameStyle::Narrow => {
        &DEFAULT_DAY_OF_WEEK_NAMES_NARROW
      }
    };
    names
      .iter()
      .map(|name| name.to_string())
      .collect()
  }

  fn get_date_names(&self) -> Vec<String> {
    (1..=31)
      .map(|day: u32| day.to_string())
      .collect()
  }

  fn to_iso8601(
    &self,
    date: &NaiveDate
  ) -> String {
    date.format("%Y-%m-%d").to_string()
  }
}

/// Resolves the time zone used for
/// `today()`: `SATURN_TIMEZONE` first,
/// then the configured id, then UTC.
pub fn resolve_timezone(
  configured: Option<&str>
) -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(&raw, TIMEZONE_ENV_VAR)
  {
    return tz;
  }

  if let Some(raw) = configured
    && let Some(tz) =
      parse_timezone(raw, "config")
  {
    return tz;
  }

  chrono_tz::UTC
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured picker timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

fn iso_8601_regex() -> Option<&'static Regex>
{
  static ISO_8601: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  ISO_8601
    .get_or_init(|| {
      Regex::new(ISO_8601_PATTERN).ok()
    })
    .as_ref()
}

fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  let mut year = date.year();
  let mut month =
    date.month() as i32 + months;

  while month < 1 {
    month += 12;
    year = year.saturating_sub(1);
  }
  while month > 12 {
    month -= 12;
    year = year.saturating_add(1);
  }

  let month = month as u32;
  let day = date
    .day()
    .min(days_in_month(year, month));
  NaiveDate::from_ymd_opt(
    year, month, day
  )
  .unwrap_or(date)
}

fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  add_days(
    first_day_of_month(
      next_year, next_month
    ),
    -1
  )
  .day()
}

fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}
