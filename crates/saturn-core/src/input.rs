//! Text input bound to a datepicker: keeps
//! the typed text and the form value in
//! step, and validates what was typed.

use std::fmt;
use std::rc::Rc;

use tracing::{
  debug,
  trace
};

use crate::adapter::{
  DateAdapter,
  DateFormats,
  Parsed
};
use crate::cell::DateFilter;
use crate::range::{
  Bound,
  Deserialized,
  PickerValue,
  RangeValue,
  RawValue,
  SelectionMode,
  UNBOUNDED_SYMBOL
};
use crate::validate::{
  Constraints,
  Subject,
  ValidationError,
  validate
};
use crate::view::{
  Key,
  KeyPress
};

/// What the input reports to its picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent<D> {
  /// The value changed, by typing or by a
  /// programmatic write.
  ValueChange(Option<PickerValue<D>>),
  /// Text was typed.
  DateInput(Option<PickerValue<D>>),
  /// The text was committed.
  DateChange(Option<PickerValue<D>>),
  DisabledChange(bool),
  OpenRequested
}

pub struct DatepickerInput<A: DateAdapter> {
  adapter:          Rc<A>,
  formats:          Rc<DateFormats>,
  value:            Option<PickerValue<A::Date>>,
  text:             String,
  last_value_valid: bool,
  constraints:      Constraints<A::Date>,
  selection_mode:   SelectionMode,
  read_only:        bool,
  disabled:         bool,
  touched:          bool
}

impl<A> fmt::Debug for DatepickerInput<A>
where
  A: DateAdapter
{
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("DatepickerInput")
      .field("value", &self.value)
      .field("text", &self.text)
      .field(
        "last_value_valid",
        &self.last_value_valid
      )
      .field("constraints", &self.constraints)
      .field("selection_mode", &self.selection_mode)
      .field("disabled", &self.disabled)
      .finish_non_exhaustive()
  }
}

impl<A: DateAdapter> DatepickerInput<A> {
  pub fn new(
    adapter: Rc<A>,
    formats: Rc<DateFormats>
  ) -> Self {
    Self {
      adapter,
      formats,
      value: None,
      text: String::new(),
      last_value_valid: true,
      constraints: Constraints::default(),
      selection_mode: SelectionMode::Date,
      read_only: false,
      disabled: false,
      touched: false
    }
  }

  pub fn value(
    &self
  ) -> Option<&PickerValue<A::Date>> {
    self.value.as_ref()
  }

  /// Text currently shown in the field.
  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn last_value_valid(&self) -> bool {
    self.last_value_valid
  }

  pub fn is_touched(&self) -> bool {
    self.touched
  }

  pub fn is_disabled(&self) -> bool {
    self.disabled
  }

  pub fn is_read_only(&self) -> bool {
    self.read_only
  }

  pub fn constraints(
    &self
  ) -> &Constraints<A::Date> {
    &self.constraints
  }

  pub fn min(&self) -> Option<&A::Date> {
    self.constraints.min.as_ref()
  }

  pub fn max(&self) -> Option<&A::Date> {
    self.constraints.max.as_ref()
  }

  pub fn date_filter(
    &self
  ) -> Option<&DateFilter<A::Date>> {
    self.constraints.filter.as_ref()
  }

  pub fn set_min(&mut self, min: Option<A::Date>) {
    self.constraints.min = min;
  }

  pub fn set_max(&mut self, max: Option<A::Date>) {
    self.constraints.max = max;
  }

  pub fn set_date_filter(
    &mut self,
    filter: Option<DateFilter<A::Date>>
  ) {
    self.constraints.filter = filter;
  }

  pub fn set_read_only(&mut self, read_only: bool) {
    self.read_only = read_only;
  }

  pub fn set_disabled(
    &mut self,
    disabled: bool
  ) -> Vec<InputEvent<A::Date>> {
    if self.disabled == disabled {
      return Vec::new();
    }
    self.disabled = disabled;
    vec![InputEvent::DisabledChange(disabled)]
  }

  pub(crate) fn set_selection_mode(
    &mut self,
    mode: SelectionMode
  ) {
    self.selection_mode = mode;
  }

  /// Programmatic write of an already
  /// typed value.
  pub fn set_value(
    &mut self,
    value: Option<PickerValue<A::Date>>
  ) -> Vec<InputEvent<A::Date>> {
    self.assign(Deserialized { value, valid: true })
  }

  /// Write of a serialized form value.
  /// Text that does not deserialize leaves
  /// a parse error behind.
  pub fn write_raw(
    &mut self,
    raw: Option<&RawValue>
  ) -> Vec<InputEvent<A::Date>> {
    let deserialized = match raw {
      | Some(raw) => {
        raw.deserialize_with(self.adapter.as_ref())
      }
      | None => Deserialized {
        value: None,
        valid: true
      }
    };
    self.assign(deserialized)
  }

  /// Serialized form of the current value.
  pub fn raw_value(&self) -> Option<RawValue> {
    self.value.as_ref().map(|value| {
      RawValue::from_value(self.adapter.as_ref(), value)
    })
  }

  fn assign(
    &mut self,
    incoming: Deserialized<A::Date>
  ) -> Vec<InputEvent<A::Date>> {
    self.last_value_valid = incoming.valid;
    let adapter = Rc::clone(&self.adapter);
    let old = self.value.take();
    let mut value = incoming.value;
    self.text = value
      .as_ref()
      .map(|value| self.format_value(value))
      .unwrap_or_default();

    let changed = match (&old, &value) {
      | (None, None) => false,
      | (Some(old), Some(new)) => {
        !old.same_as(new, adapter.as_ref())
      }
      | _ => true
    };
    if !changed {
      self.value = old;
      return Vec::new();
    }

    if let Some(PickerValue::Range(range)) = &value
      && range.is_reversed(adapter.as_ref())
    {
      debug!(
        ?range,
        "dropping range that ends before it \
         begins"
      );
      value = None;
    }
    self.value = value.clone();
    vec![InputEvent::ValueChange(value)]
  }

  /// Text typed by the user. The text is
  /// kept as typed.
  #[tracing::instrument(
    skip(self),
    fields(mode = %self.selection_mode)
  )]
  pub fn on_input(
    &mut self,
    text: &str
  ) -> Vec<InputEvent<A::Date>> {
    self.text = text.to_string();
    let value = if self
      .selection_mode
      .is_range_capable()
    {
      self.parse_range(text)
    } else {
      let parsed = self
        .adapter
        .parse(text, &self.formats.date_input);
      self.last_value_valid =
        !matches!(parsed, Parsed::Invalid);
      parsed.into_option().map(PickerValue::Date)
    };
    trace!(
      valid = self.last_value_valid,
      "typed text parsed"
    );
    if !self.last_value_valid {
      debug!(
        text,
        "unparsable text; keeping the last \
         good value"
      );
      return Vec::new();
    }
    self.value = value.clone();
    vec![
      InputEvent::ValueChange(value.clone()),
      InputEvent::DateInput(value),
    ]
  }

  // Splits on '-': the leading half of the
  // parts is the begin, the rest the end,
  // so dashes inside dates survive. Other
  // dashes are tried when the middle one
  // does not give two bounds, as happens
  // with the sentinel on one side.
  fn parse_range(
    &mut self,
    text: &str
  ) -> Option<PickerValue<A::Date>> {
    let parts: Vec<&str> = text.split('-').collect();
    if parts.len() < 2 {
      self.last_value_valid = text.trim().is_empty();
      return None;
    }
    let middle = parts.len() / 2;
    let positions = std::iter::once(middle)
      .chain((1..parts.len()).filter(|&at| at != middle));

    let mut first = None;
    for position in positions {
      let begin = self
        .parse_bound(&parts[..position].join("-"));
      let end = self
        .parse_bound(&parts[position..].join("-"));
      if let (Parsed::Valid(begin), Parsed::Valid(end)) =
        (&begin, &end)
      {
        self.last_value_valid = true;
        return Some(PickerValue::Range(RangeValue::new(
          Some(begin.clone()),
          Some(end.clone())
        )));
      }
      first.get_or_insert((begin, end));
    }

    self.last_value_valid = first.is_none_or(|(begin, end)| {
      matches!(begin, Parsed::Empty)
        || matches!(end, Parsed::Empty)
        || (begin.is_valid() && end.is_valid())
    });
    None
  }

  fn parse_bound(
    &self,
    text: &str
  ) -> Parsed<Bound<A::Date>> {
    if text.trim() == UNBOUNDED_SYMBOL {
      return Parsed::Valid(Bound::Unbounded);
    }
    match self
      .adapter
      .parse(text, &self.formats.date_input)
    {
      | Parsed::Valid(date) => {
        Parsed::Valid(Bound::Date(date))
      }
      | Parsed::Empty => Parsed::Empty,
      | Parsed::Invalid => Parsed::Invalid
    }
  }

  /// Commit of the typed text.
  pub fn on_change(
    &self
  ) -> Vec<InputEvent<A::Date>> {
    vec![InputEvent::DateChange(self.value.clone())]
  }

  /// Reformats a present value, dropping
  /// unparsable text, and marks the field
  /// touched.
  pub fn on_blur(&mut self) {
    if let Some(value) = &self.value {
      self.text = self.format_value(value);
      self.last_value_valid = true;
    }
    self.touched = true;
  }

  /// Alt+Down asks the picker to open
  /// unless the field is read-only.
  pub fn on_keydown(
    &self,
    press: KeyPress
  ) -> Vec<InputEvent<A::Date>> {
    if press.alt
      && press.key == Key::Down
      && !self.read_only
    {
      vec![InputEvent::OpenRequested]
    } else {
      Vec::new()
    }
  }

  pub(crate) fn mark_touched(&mut self) {
    self.touched = true;
  }

  /// Every validator failure, in order.
  pub fn validate(
    &self
  ) -> Vec<ValidationError<A::Date>> {
    validate(
      self.adapter.as_ref(),
      &self.constraints,
      &Subject {
        value:            self.value.as_ref(),
        text:             &self.text,
        last_value_valid: self.last_value_valid
      }
    )
  }

  pub fn is_valid(&self) -> bool {
    self.validate().is_empty()
  }

  fn format_date(&self, date: &A::Date) -> String {
    match self
      .adapter
      .format(date, &self.formats.date_input)
    {
      | Ok(text) => text,
      | Err(error) => {
        debug!(
          %error,
          "falling back to iso 8601"
        );
        self.adapter.to_iso8601(date)
      }
    }
  }

  fn format_bound(
    &self,
    bound: &Bound<A::Date>
  ) -> String {
    match bound {
      | Bound::Date(date) => self.format_date(date),
      | Bound::Unbounded => {
        UNBOUNDED_SYMBOL.to_string()
      }
    }
  }

  /// `begin - end` for a range with both
  /// bounds, empty for a partial one.
  pub fn format_value(
    &self,
    value: &PickerValue<A::Date>
  ) -> String {
    match value {
      | PickerValue::Date(date) => {
        self.format_date(date)
      }
      | PickerValue::Range(range) => {
        match (&range.begin, &range.end) {
          | (Some(begin), Some(end)) => format!(
            "{} - {}",
            self.format_bound(begin),
            self.format_bound(end)
          ),
          | _ => String::new()
        }
      }
    }
  }
}
