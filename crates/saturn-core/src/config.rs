use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::rc::Rc;

use anyhow::{
  Context,
  anyhow
};
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::adapter::{
  DateAdapter,
  DateFormats,
  NativeDateAdapter,
  Parsed,
  resolve_timezone
};
use crate::datepicker::{
  PickerOptions,
  dedup_modes
};
use crate::error::PickerError;
use crate::panels::{
  PeriodOrder,
  RangeShortcuts
};
use crate::range::SelectionMode;
use crate::view::CalendarView;

pub const CONFIG_ENV_VAR: &str =
  "SATURN_CONFIG";
pub const CONFIG_FILE: &str = "saturn.toml";

/// Behavior switches of the `[picker]`
/// table.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct PickerSection {
  #[serde(default)]
  pub selection_mode:             Option<String>,
  #[serde(default = "default_selection_modes")]
  pub selection_modes:            Vec<String>,
  #[serde(default)]
  pub start_at:                   Option<String>,
  #[serde(default = "default_start_view")]
  pub start_view:                 String,
  #[serde(default)]
  pub min:                        Option<String>,
  #[serde(default)]
  pub max:                        Option<String>,
  #[serde(default = "default_true")]
  pub close_after_selection:      bool,
  #[serde(default)]
  pub select_first_date_on_close: bool,
  #[serde(default = "default_true")]
  pub range_hover_effect:         bool,
  #[serde(default)]
  pub touch_ui:                   bool,
  #[serde(default)]
  pub rtl:                        bool,
  #[serde(default = "default_order_period_label")]
  pub order_period_label:         String,
  #[serde(default)]
  pub range_shortcuts:            bool
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct LocaleSection {
  #[serde(default = "default_locale")]
  pub locale:   String,
  #[serde(default)]
  pub timezone: Option<String>
}

/// Contents of `saturn.toml`.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct PickerConfig {
  #[serde(default)]
  pub picker:      PickerSection,
  #[serde(default)]
  pub locale:      LocaleSection,
  #[serde(default)]
  pub formats:     DateFormats,
  #[serde(skip)]
  pub loaded_from: Option<PathBuf>
}

fn default_true() -> bool {
  true
}

fn default_selection_modes() -> Vec<String> {
  SelectionMode::all()
    .iter()
    .map(|mode| mode.as_key().to_string())
    .collect()
}

fn default_start_view() -> String {
  CalendarView::Month.as_key().to_string()
}

fn default_order_period_label() -> String {
  "multi-year".to_string()
}

fn default_locale() -> String {
  "en-US".to_string()
}

impl Default for PickerSection {
  fn default() -> Self {
    Self {
      selection_mode:             None,
      selection_modes:            default_selection_modes(),
      start_at:                   None,
      start_view:                 default_start_view(),
      min:                        None,
      max:                        None,
      close_after_selection:      true,
      select_first_date_on_close: false,
      range_hover_effect:         true,
      touch_ui:                   false,
      rtl:                        false,
      order_period_label:         default_order_period_label(),
      range_shortcuts:            false
    }
  }
}

impl Default for LocaleSection {
  fn default() -> Self {
    Self {
      locale:   default_locale(),
      timezone: None
    }
  }
}

impl PickerConfig {
  /// Loads the first config file found;
  /// defaults when there is none.
  #[tracing::instrument(skip(override_path))]
  pub fn load(
    override_path: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      resolve_config_path(override_path)
    else {
      warn!(
        "no saturn.toml found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading config");
    let text = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let mut config = Self::from_toml_str(&text)
      .with_context(|| {
        format!(
          "failed to parse {}",
          path.display()
        )
      })?;
    config.loaded_from = Some(path);
    Ok(config)
  }

  pub fn from_toml_str(
    text: &str
  ) -> anyhow::Result<Self> {
    let mut config =
      toml::from_str::<Self>(text)?;
    config.sanitize();
    Ok(config)
  }

  pub fn to_toml(&self) -> anyhow::Result<String> {
    toml::to_string_pretty(self)
      .context("failed to serialize config")
  }

  /// Drops unknown names and blank values
  /// in favor of the defaults.
  pub fn sanitize(&mut self) {
    let picker = &mut self.picker;

    if let Some(mode) = &picker.selection_mode
      && SelectionMode::from_key(mode).is_none()
    {
      warn!(mode = %mode, "unknown selection mode; ignoring");
      picker.selection_mode = None;
    }

    let known: Vec<SelectionMode> = picker
      .selection_modes
      .iter()
      .filter_map(|key| {
        let mode = SelectionMode::from_key(key);
        if mode.is_none() {
          warn!(mode = %key, "dropping unknown selection mode");
        }
        mode
      })
      .collect();
    picker.selection_modes = dedup_modes(known)
      .iter()
      .map(|mode| mode.as_key().to_string())
      .collect();
    if picker.selection_modes.is_empty() {
      picker.selection_modes =
        default_selection_modes();
    }

    if CalendarView::from_key(&picker.start_view)
      .is_none()
    {
      warn!(
        view = %picker.start_view,
        "unknown start view; using month"
      );
      picker.start_view = default_start_view();
    }

    if PeriodOrder::from_key(
      &picker.order_period_label
    )
    .is_none()
    {
      picker.order_period_label =
        default_order_period_label();
    }

    for bound in [
      &mut picker.start_at,
      &mut picker.min,
      &mut picker.max
    ] {
      if bound
        .as_deref()
        .is_some_and(|raw| raw.trim().is_empty())
      {
        *bound = None;
      }
    }

    if self.locale.locale.trim().is_empty() {
      self.locale.locale = default_locale();
    }
    if self
      .locale
      .timezone
      .as_deref()
      .is_some_and(|raw| raw.trim().is_empty())
    {
      self.locale.timezone = None;
    }

    self.formats.sanitize();
  }

  /// `--set key=value` overrides. Keys are
  /// `section.field`, optionally prefixed
  /// with `saturn.`.
  #[tracing::instrument(skip(self, overrides))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> Result<(), PickerError>
  where
    I: IntoIterator<Item = (String, String)>
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("saturn.")
        .unwrap_or(&k)
        .trim()
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.set(&key, v.trim())?;
    }
    self.sanitize();
    Ok(())
  }

  fn set(
    &mut self,
    key: &str,
    value: &str
  ) -> Result<(), PickerError> {
    let invalid = || PickerError::InvalidConfig {
      key:   key.to_string(),
      value: value.to_string()
    };
    let flag = || parse_bool(value).ok_or_else(invalid);
    let optional = || {
      (!value.is_empty()).then(|| value.to_string())
    };

    let picker = &mut self.picker;
    match key {
      | "picker.selection_mode" => {
        SelectionMode::from_key(value)
          .ok_or_else(invalid)?;
        picker.selection_mode = optional();
      }
      | "picker.selection_modes" => {
        picker.selection_modes = value
          .split(',')
          .map(|mode| mode.trim().to_string())
          .filter(|mode| !mode.is_empty())
          .collect();
      }
      | "picker.start_at" => picker.start_at = optional(),
      | "picker.start_view" => {
        CalendarView::from_key(value)
          .ok_or_else(invalid)?;
        picker.start_view = value.to_string();
      }
      | "picker.min" => picker.min = optional(),
      | "picker.max" => picker.max = optional(),
      | "picker.close_after_selection" => {
        picker.close_after_selection = flag()?
      }
      | "picker.select_first_date_on_close" => {
        picker.select_first_date_on_close = flag()?
      }
      | "picker.range_hover_effect" => {
        picker.range_hover_effect = flag()?
      }
      | "picker.touch_ui" => picker.touch_ui = flag()?,
      | "picker.rtl" => picker.rtl = flag()?,
      | "picker.order_period_label" => {
        PeriodOrder::from_key(value)
          .ok_or_else(invalid)?;
        picker.order_period_label = value.to_string();
      }
      | "picker.range_shortcuts" => {
        picker.range_shortcuts = flag()?
      }
      | "locale.locale" => {
        self.locale.locale = value.to_string()
      }
      | "locale.timezone" => {
        self.locale.timezone = optional()
      }
      | "formats.date_input" => {
        self.formats.date_input = value.to_string()
      }
      | "formats.month_year_label" => {
        self.formats.month_year_label = value.to_string()
      }
      | "formats.date_a11y_label" => {
        self.formats.date_a11y_label = value.to_string()
      }
      | "formats.month_year_a11y_label" => {
        self.formats.month_year_a11y_label =
          value.to_string()
      }
      | _ => return Err(invalid())
    }
    Ok(())
  }

  /// Adapter for the configured locale and
  /// time zone.
  pub fn adapter(&self) -> NativeDateAdapter {
    NativeDateAdapter::new(&self.locale.locale)
      .with_timezone(resolve_timezone(
        self.locale.timezone.as_deref()
      ))
  }
}

impl<A: DateAdapter> PickerOptions<A> {
  /// Options from a sanitized config. Dates
  /// are ISO 8601 and go through the
  /// adapter.
  pub fn from_config(
    config: &PickerConfig,
    adapter: &A
  ) -> Result<Self, PickerError> {
    let picker = &config.picker;
    let date = |key: &str, raw: Option<&String>| {
      let Some(raw) = raw else {
        return Ok(None);
      };
      match adapter.deserialize(raw) {
        | Parsed::Valid(date) => Ok(Some(date)),
        | Parsed::Empty => Ok(None),
        | Parsed::Invalid => {
          Err(PickerError::InvalidConfig {
            key:   key.to_string(),
            value: raw.clone()
          })
        }
      }
    };

    let mut options = Self {
      initial_selection_mode: picker
        .selection_mode
        .as_deref()
        .and_then(SelectionMode::from_key),
      selection_modes: dedup_modes(
        picker
          .selection_modes
          .iter()
          .map(String::as_str)
          .filter_map(SelectionMode::from_key)
      ),
      start_at: date(
        "picker.start_at",
        picker.start_at.as_ref()
      )?,
      start_view: CalendarView::from_key(
        &picker.start_view
      )
      .unwrap_or(CalendarView::Month),
      min: date("picker.min", picker.min.as_ref())?,
      max: date("picker.max", picker.max.as_ref())?,
      close_after_selection: picker
        .close_after_selection,
      select_first_date_on_close: picker
        .select_first_date_on_close,
      range_hover_effect: picker.range_hover_effect,
      touch_ui: picker.touch_ui,
      rtl: picker.rtl,
      order_period_label: PeriodOrder::from_key(
        &picker.order_period_label
      )
      .unwrap_or_default(),
      formats: config.formats.clone(),
      ..Self::default()
    };
    if picker.range_shortcuts {
      options.footer = Rc::new(RangeShortcuts);
    }
    Ok(options)
  }
}

#[tracing::instrument(skip(override_path))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = override_path {
    return Some(path.to_path_buf());
  }

  if let Ok(raw) = std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(trimmed));
    }
  }

  let local = std::env::current_dir()
    .ok()
    .map(|dir| dir.join(CONFIG_FILE))
    .filter(|path| path.exists());
  if local.is_some() {
    return local;
  }

  dirs::config_dir()
    .map(|dir| dir.join("saturn").join(CONFIG_FILE))
    .filter(|path| path.exists())
}

/// Splits a `key=value` override.
pub fn parse_override(
  raw: &str
) -> anyhow::Result<(String, String)> {
  let (key, value) =
    raw.split_once('=').ok_or_else(|| {
      anyhow!(
        "invalid override `{raw}`; expected \
         key=value"
      )
    })?;
  let key = key.trim();
  if key.is_empty() {
    return Err(anyhow!(
      "override key cannot be empty"
    ));
  }
  Ok((key.to_string(), value.trim().to_string()))
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on" | "true" => {
      Some(true)
    }
    | "0" | "n" | "no" | "off" | "false" => {
      Some(false)
    }
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::{
    PickerConfig,
    parse_override
  };
  use crate::adapter::NativeDateAdapter;
  use crate::datepicker::PickerOptions;
  use crate::error::PickerError;
  use crate::panels::PeriodOrder;
  use crate::range::SelectionMode;
  use crate::view::CalendarView;

  #[test]
  fn empty_file_gives_defaults() {
    let config =
      PickerConfig::from_toml_str("").expect("parses");
    assert_eq!(config, PickerConfig::default());
    assert_eq!(config.picker.selection_modes.len(), 4);
    assert!(config.picker.close_after_selection);
  }

  #[test]
  fn sanitize_drops_unknown_names() {
    let config = PickerConfig::from_toml_str(
      r#"
[picker]
selection_mode = "sometimes"
selection_modes = ["until", "weekly", "range", "until"]
start_view = "decade"
order_period_label = "sideways"

[locale]
locale = "  "
timezone = ""

[formats]
date_input = ""
"#
    )
    .expect("parses");
    assert_eq!(config.picker.selection_mode, None);
    assert_eq!(
      config.picker.selection_modes,
      vec!["until".to_string(), "range".to_string()]
    );
    assert_eq!(config.picker.start_view, "month");
    assert_eq!(config.picker.order_period_label, "multi-year");
    assert_eq!(config.locale.locale, "en-US");
    assert_eq!(config.locale.timezone, None);
    assert_eq!(config.formats.date_input, "%Y-%m-%d");
  }

  #[test]
  fn overrides_are_checked() {
    let mut config = PickerConfig::default();
    config
      .apply_overrides(vec![
        ("saturn.picker.selection_mode".to_string(), "range".to_string()),
        ("picker.touch_ui".to_string(), "yes".to_string()),
        ("picker.min".to_string(), "2024-01-01".to_string()),
      ])
      .expect("valid overrides");
    assert_eq!(config.picker.selection_mode.as_deref(), Some("range"));
    assert!(config.picker.touch_ui);

    let bad = config.apply_overrides(vec![(
      "picker.rtl".to_string(),
      "maybe".to_string()
    )]);
    assert!(matches!(bad, Err(PickerError::InvalidConfig { .. })));
    let unknown = config.apply_overrides(vec![(
      "picker.colour".to_string(),
      "red".to_string()
    )]);
    assert!(unknown.is_err());
  }

  #[test]
  fn options_follow_the_config() {
    let config = PickerConfig::from_toml_str(
      r#"
[picker]
selection_mode = "since"
selection_modes = ["since", "until"]
start_view = "multi-year"
min = "2024-01-01"
order_period_label = "month"
range_shortcuts = true
"#
    )
    .expect("parses");
    let options = PickerOptions::from_config(
      &config,
      &NativeDateAdapter::default()
    )
    .expect("valid options");
    assert_eq!(
      options.initial_selection_mode,
      Some(SelectionMode::Since)
    );
    assert_eq!(
      options.selection_modes,
      vec![SelectionMode::Since, SelectionMode::Until]
    );
    assert_eq!(options.start_view, CalendarView::MultiYear);
    assert_eq!(options.order_period_label, PeriodOrder::Month);
    assert_eq!(
      options.min,
      NaiveDate::from_ymd_opt(2024, 1, 1)
    );
  }

  #[test]
  fn bad_dates_are_config_errors() {
    let mut config = PickerConfig::default();
    config.picker.max = Some("31/12/2024".to_string());
    let result = PickerOptions::from_config(
      &config,
      &NativeDateAdapter::default()
    );
    assert!(matches!(
      result,
      Err(PickerError::InvalidConfig { ref key, .. }) if key == "picker.max"
    ));
  }

  #[test]
  fn override_syntax() {
    assert_eq!(
      parse_override("picker.rtl = on").expect("valid"),
      ("picker.rtl".to_string(), "on".to_string())
    );
    assert!(parse_override("picker.rtl").is_err());
    assert!(parse_override("=on").is_err());
  }
}
