use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{
  Deserialize,
  Serialize
};

use crate::adapter::{
  DateAdapter,
  DateFormats
};
use crate::cell::{
  CellClasses,
  DateClass,
  DateFilter
};
use crate::range::SelectionMode;

/// Years shown on one multi-year page.
pub const YEARS_PER_PAGE: i32 = 24;

/// Years per row of the multi-year grid.
pub const YEARS_PER_ROW: i32 = 4;

/// Months per row of the year grid.
pub const MONTHS_PER_ROW: u32 = 4;

pub const DAYS_PER_WEEK: u32 = 7;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum CalendarView {
  Month,
  Year,
  MultiYear
}

impl CalendarView {
  pub fn all() -> [Self; 3] {
    [
      Self::Month,
      Self::Year,
      Self::MultiYear
    ]
  }

  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Month => "month",
      | Self::Year => "year",
      | Self::MultiYear => "multi-year"
    }
  }

  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    match key.trim() {
      | "month" => Some(Self::Month),
      | "year" => Some(Self::Year),
      | "multi-year" | "multi_year" => {
        Some(Self::MultiYear)
      }
      | _ => None
    }
  }
}

impl fmt::Display for CalendarView {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_key())
  }
}

impl FromStr for CalendarView {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    Self::from_key(s).ok_or_else(|| {
      anyhow!("unknown calendar view: {s}")
    })
  }
}

/// Keys the calendar grids react to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub enum Key {
  Left,
  Right,
  Up,
  Down,
  Home,
  End,
  PageUp,
  PageDown,
  Enter,
  Space,
  Escape,
  Other
}

impl Key {
  pub fn from_name(name: &str) -> Self {
    match name
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "left" | "arrowleft" => Self::Left,
      | "right" | "arrowright" => {
        Self::Right
      }
      | "up" | "arrowup" => Self::Up,
      | "down" | "arrowdown" => Self::Down,
      | "home" => Self::Home,
      | "end" => Self::End,
      | "pageup" => Self::PageUp,
      | "pagedown" => Self::PageDown,
      | "enter" => Self::Enter,
      | "space" | " " => Self::Space,
      | "escape" | "esc" => Self::Escape,
      | _ => Self::Other
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct KeyPress {
  pub key: Key,
  pub alt: bool
}

impl KeyPress {
  pub fn plain(key: Key) -> Self {
    Self { key, alt: false }
  }

  pub fn alt(key: Key) -> Self {
    Self { key, alt: true }
  }
}

/// Everything a grid view reads from its
/// calendar. Bounds and callbacks change at
/// runtime, so views receive the context on
/// each call instead of keeping a copy.
pub struct ViewContext<A: DateAdapter> {
  pub adapter:               Rc<A>,
  pub formats:               Rc<DateFormats>,
  pub min:                   Option<A::Date>,
  pub max:                   Option<A::Date>,
  pub filter:                Option<DateFilter<A::Date>>,
  pub date_class:            Option<DateClass<A::Date>>,
  pub selection_mode:        SelectionMode,
  pub rtl:                   bool,
  pub close_after_selection: bool,
  pub range_hover_effect:    bool
}

impl<A: DateAdapter> Clone for ViewContext<A> {
  fn clone(&self) -> Self {
    Self {
      adapter:               Rc::clone(
        &self.adapter
      ),
      formats:               Rc::clone(
        &self.formats
      ),
      min:                   self.min.clone(),
      max:                   self.max.clone(),
      filter:                self.filter.clone(),
      date_class:            self
        .date_class
        .clone(),
      selection_mode:        self
        .selection_mode,
      rtl:                   self.rtl,
      close_after_selection: self
        .close_after_selection,
      range_hover_effect:    self
        .range_hover_effect
    }
  }
}

impl<A: DateAdapter> fmt::Debug
  for ViewContext<A>
{
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("ViewContext")
      .field("min", &self.min)
      .field("max", &self.max)
      .field(
        "filter",
        &self.filter.is_some()
      )
      .field(
        "selection_mode",
        &self.selection_mode
      )
      .field("rtl", &self.rtl)
      .finish_non_exhaustive()
  }
}

impl<A: DateAdapter> ViewContext<A> {
  pub fn new(
    adapter: Rc<A>,
    formats: Rc<DateFormats>
  ) -> Self {
    Self {
      adapter,
      formats,
      min: None,
      max: None,
      filter: None,
      date_class: None,
      selection_mode: SelectionMode::Date,
      rtl: false,
      close_after_selection: true,
      range_hover_effect: true
    }
  }

  pub fn passes_filter(
    &self,
    date: &A::Date
  ) -> bool {
    self
      .filter
      .as_ref()
      .is_none_or(|filter| filter(date))
  }

  pub fn is_after_min(
    &self,
    date: &A::Date
  ) -> bool {
    self.min.as_ref().is_none_or(|min| {
      self.adapter.compare_date(date, min)
        != Ordering::Less
    })
  }

  pub fn is_before_max(
    &self,
    date: &A::Date
  ) -> bool {
    self.max.as_ref().is_none_or(|max| {
      self.adapter.compare_date(date, max)
        != Ordering::Greater
    })
  }

  /// A day is pickable when it is valid,
  /// passes the filter and lies inside
  /// `[min, max]`.
  pub fn should_enable(
    &self,
    date: &A::Date
  ) -> bool {
    self.adapter.is_valid(date)
      && self.passes_filter(date)
      && self.is_after_min(date)
      && self.is_before_max(date)
  }

  pub fn clamp(
    &self,
    date: &A::Date
  ) -> A::Date {
    self.adapter.clamp_date(
      date,
      self.min.as_ref(),
      self.max.as_ref()
    )
  }

  pub fn classes_for(
    &self,
    date: &A::Date
  ) -> Option<CellClasses> {
    self
      .date_class
      .as_ref()
      .map(|date_class| date_class(date))
  }

  /// Formats with `pattern`, falling back
  /// to ISO text when the pattern is
  /// unusable.
  pub fn format_or_iso(
    &self,
    date: &A::Date,
    pattern: &str
  ) -> String {
    match self.adapter.format(date, pattern) {
      | Ok(text) => text,
      | Err(error) => {
        tracing::warn!(
          %error,
          pattern,
          "falling back to ISO date text"
        );
        self.adapter.to_iso8601(date)
      }
    }
  }

  pub fn same_month_and_year(
    &self,
    first: &A::Date,
    second: &A::Date
  ) -> bool {
    self.adapter.get_month(first)
      == self.adapter.get_month(second)
      && self.adapter.get_year(first)
        == self.adapter.get_year(second)
  }
}

#[cfg(test)]
mod tests {
  use std::rc::Rc;

  use chrono::{
    Datelike,
    NaiveDate
  };

  use super::{
    CalendarView,
    Key,
    ViewContext
  };
  use crate::adapter::{
    DateFormats,
    NativeDateAdapter
  };

  fn ymd(
    year: i32,
    month: u32,
    day: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(
      year, month, day
    )
    .expect("valid date")
  }

  #[test]
  fn enablement_combines_bounds_and_filter()
  {
    let mut ctx = ViewContext::new(
      Rc::new(NativeDateAdapter::default()),
      Rc::new(DateFormats::default())
    );
    ctx.min = Some(ymd(2024, 1, 3));
    ctx.max = Some(ymd(2024, 1, 28));
    ctx.filter = Some(Rc::new(
      |date: &NaiveDate| date.day() != 10
    ));

    assert!(!ctx.should_enable(&ymd(2024, 1, 2)));
    assert!(ctx.should_enable(&ymd(2024, 1, 3)));
    assert!(!ctx.should_enable(&ymd(2024, 1, 10)));
    assert!(ctx.should_enable(&ymd(2024, 1, 28)));
    assert!(!ctx.should_enable(&ymd(2024, 1, 29)));
    assert_eq!(
      ctx.clamp(&ymd(2023, 12, 1)),
      ymd(2024, 1, 3)
    );
  }

  #[test]
  fn view_and_key_names() {
    for view in CalendarView::all() {
      assert_eq!(
        CalendarView::from_key(view.as_key()),
        Some(view)
      );
    }
    assert_eq!(Key::from_name("ArrowLeft"), Key::Left);
    assert_eq!(Key::from_name("PageDown"), Key::PageDown);
    assert_eq!(Key::from_name("F5"), Key::Other);
  }
}
