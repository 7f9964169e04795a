use thiserror::Error;

/// Failures raised at the date adapter
/// boundary. Callers building dates from
/// user-controlled numbers validate first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
  #[error(
    "invalid month \"{month}\"; month has \
     to be between 1 and 12"
  )]
  InvalidMonth { month: u32 },

  #[error(
    "invalid date \"{day}\" for month \
     {month} of year {year}"
  )]
  InvalidDay {
    year:  i32,
    month: u32,
    day:   u32
  },

  #[error("invalid format pattern: {pattern}")]
  InvalidPattern { pattern: String },

  #[error("cannot format date: {reason}")]
  Format { reason: String }
}

/// Configuration and lifecycle errors of
/// the picker. These are not recoverable
/// by the end user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickerError {
  #[error(
    "attempted to open a datepicker with \
     no associated input"
  )]
  NoInput,

  #[error(
    "a datepicker can only be associated \
     with a single input"
  )]
  InputAlreadyBound,

  #[error(
    "selection mode {mode} is not one of \
     the permitted modes"
  )]
  ModeNotPermitted { mode: String },

  #[error("invalid configuration value for {key}: {value}")]
  InvalidConfig { key: String, value: String },

  #[error(transparent)]
  Date(#[from] DateError)
}
