//! Form validators for the bound input.
//! They run in a fixed order: parse, min,
//! max, filter, range order.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

use crate::adapter::DateAdapter;
use crate::cell::DateFilter;
use crate::range::{
  Bound,
  PickerValue
};

#[derive(
  Debug, Clone, PartialEq, Eq, Error,
)]
pub enum ValidationError<D: fmt::Debug> {
  #[error("cannot parse `{text}` as a date")]
  Parse { text: String },
  #[error("{actual:?} is before the minimum {min:?}")]
  Min { min: D, actual: D },
  #[error("{actual:?} is after the maximum {max:?}")]
  Max { max: D, actual: D },
  #[error("{date:?} is not an allowed date")]
  Filter { date: D },
  #[error("range ends before it begins")]
  Range { begin: D, end: D }
}

impl<D: fmt::Debug> ValidationError<D> {
  pub fn key(&self) -> &'static str {
    match self {
      | Self::Parse { .. } => "parse",
      | Self::Min { .. } => "min",
      | Self::Max { .. } => "max",
      | Self::Filter { .. } => "filter",
      | Self::Range { .. } => "range"
    }
  }
}

/// Bounds and filter the input checks
/// values against.
pub struct Constraints<D> {
  pub min:    Option<D>,
  pub max:    Option<D>,
  pub filter: Option<DateFilter<D>>
}

impl<D> Default for Constraints<D> {
  fn default() -> Self {
    Self {
      min:    None,
      max:    None,
      filter: None
    }
  }
}

impl<D: Clone> Clone for Constraints<D> {
  fn clone(&self) -> Self {
    Self {
      min:    self.min.clone(),
      max:    self.max.clone(),
      filter: self.filter.clone()
    }
  }
}

impl<D: fmt::Debug> fmt::Debug for Constraints<D> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("Constraints")
      .field("min", &self.min)
      .field("max", &self.max)
      .field("filter", &self.filter.is_some())
      .finish()
  }
}

/// What a validator looks at.
pub struct Subject<'a, D> {
  pub value:            Option<&'a PickerValue<D>>,
  pub text:             &'a str,
  pub last_value_valid: bool
}

// Concrete endpoints in check order:
// the date itself, or begin then end.
fn endpoints<D>(
  value: Option<&PickerValue<D>>
) -> Vec<&D> {
  match value {
    | None => Vec::new(),
    | Some(PickerValue::Date(date)) => {
      vec![date]
    }
    | Some(PickerValue::Range(range)) => [
      range.begin.as_ref(),
      range.end.as_ref()
    ]
    .into_iter()
    .flatten()
    .filter_map(Bound::as_date)
    .collect()
  }
}

pub fn parse_validator<D: fmt::Debug>(
  subject: &Subject<'_, D>
) -> Option<ValidationError<D>> {
  (!subject.last_value_valid).then(|| {
    ValidationError::Parse {
      text: subject.text.to_string()
    }
  })
}

pub fn min_validator<A>(
  adapter: &A,
  constraints: &Constraints<A::Date>,
  subject: &Subject<'_, A::Date>
) -> Option<ValidationError<A::Date>>
where
  A: DateAdapter
{
  let min = constraints.min.as_ref()?;
  endpoints(subject.value)
    .into_iter()
    .find(|&date| {
      adapter.compare_date(min, date)
        == Ordering::Greater
    })
    .map(|actual| ValidationError::Min {
      min:    min.clone(),
      actual: actual.clone()
    })
}

pub fn max_validator<A>(
  adapter: &A,
  constraints: &Constraints<A::Date>,
  subject: &Subject<'_, A::Date>
) -> Option<ValidationError<A::Date>>
where
  A: DateAdapter
{
  let max = constraints.max.as_ref()?;
  endpoints(subject.value)
    .into_iter()
    .find(|&date| {
      adapter.compare_date(max, date)
        == Ordering::Less
    })
    .map(|actual| ValidationError::Max {
      max:    max.clone(),
      actual: actual.clone()
    })
}

pub fn filter_validator<D>(
  constraints: &Constraints<D>,
  subject: &Subject<'_, D>
) -> Option<ValidationError<D>>
where
  D: Clone + fmt::Debug
{
  let filter = constraints.filter.as_ref()?;
  endpoints(subject.value)
    .into_iter()
    .find(|&date| !filter(date))
    .map(|date| ValidationError::Filter {
      date: date.clone()
    })
}

pub fn range_validator<A>(
  adapter: &A,
  subject: &Subject<'_, A::Date>
) -> Option<ValidationError<A::Date>>
where
  A: DateAdapter
{
  let range = subject.value?.as_range()?;
  let begin = range.begin_date()?;
  let end = range.end_date()?;
  (adapter.compare_date(begin, end)
    == Ordering::Greater)
    .then(|| ValidationError::Range {
      begin: begin.clone(),
      end:   end.clone()
    })
}

/// Every failing validator, in order.
pub fn validate<A>(
  adapter: &A,
  constraints: &Constraints<A::Date>,
  subject: &Subject<'_, A::Date>
) -> Vec<ValidationError<A::Date>>
where
  A: DateAdapter
{
  [
    parse_validator(subject),
    min_validator(adapter, constraints, subject),
    max_validator(adapter, constraints, subject),
    filter_validator(constraints, subject),
    range_validator(adapter, subject)
  ]
  .into_iter()
  .flatten()
  .collect()
}
