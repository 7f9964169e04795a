use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{
  Deserialize,
  Serialize
};

use crate::adapter::{
  DateAdapter,
  Parsed
};

/// Text shown for an unbounded endpoint.
pub const UNBOUNDED_SYMBOL: &str = "∞";

/// One endpoint of a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound<D> {
  Date(D),
  Unbounded
}

impl<D> Bound<D> {
  pub fn as_date(&self) -> Option<&D> {
    match self {
      | Self::Date(date) => Some(date),
      | Self::Unbounded => None
    }
  }

  pub fn is_unbounded(&self) -> bool {
    matches!(self, Self::Unbounded)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeValue<D> {
  pub begin: Option<Bound<D>>,
  pub end:   Option<Bound<D>>
}

impl<D: Clone> RangeValue<D> {
  /// Builds a range exactly as given,
  /// without reordering.
  pub fn new(
    begin: Option<Bound<D>>,
    end: Option<Bound<D>>
  ) -> Self {
    Self { begin, end }
  }

  /// Builds a complete range, swapping a
  /// reversed pair of concrete dates so
  /// that `begin <= end`.
  pub fn ordered<A>(
    adapter: &A,
    first: Bound<D>,
    second: Bound<D>
  ) -> Self
  where
    A: DateAdapter<Date = D>
  {
    if let (
      Bound::Date(a),
      Bound::Date(b)
    ) = (&first, &second)
      && adapter.compare_date(a, b)
        == Ordering::Greater
    {
      return Self {
        begin: Some(second),
        end:   Some(first)
      };
    }
    Self {
      begin: Some(first),
      end:   Some(second)
    }
  }

  pub fn single_day(date: D) -> Self {
    Self {
      begin: Some(Bound::Date(
        date.clone()
      )),
      end:   Some(Bound::Date(date))
    }
  }

  pub fn since(date: D) -> Self {
    Self {
      begin: Some(Bound::Date(date)),
      end:   Some(Bound::Unbounded)
    }
  }

  pub fn until(date: D) -> Self {
    Self {
      begin: Some(Bound::Unbounded),
      end:   Some(Bound::Date(date))
    }
  }

  pub fn empty() -> Self {
    Self {
      begin: None,
      end:   None
    }
  }

  pub fn is_complete(&self) -> bool {
    self.begin.is_some()
      && self.end.is_some()
  }

  pub fn begin_date(&self) -> Option<&D> {
    self
      .begin
      .as_ref()
      .and_then(Bound::as_date)
  }

  pub fn end_date(&self) -> Option<&D> {
    self
      .end
      .as_ref()
      .and_then(Bound::as_date)
  }

  /// True when both endpoints are
  /// concrete and `begin > end`.
  pub fn is_reversed<A>(
    &self,
    adapter: &A
  ) -> bool
  where
    A: DateAdapter<Date = D>
  {
    match (
      self.begin_date(),
      self.end_date()
    ) {
      | (Some(begin), Some(end)) => {
        adapter.compare_date(begin, end)
          == Ordering::Greater
      }
      | _ => false
    }
  }

  pub fn same_as<A>(
    &self,
    other: &Self,
    adapter: &A
  ) -> bool
  where
    A: DateAdapter<Date = D>
  {
    same_bound(
      adapter,
      self.begin.as_ref(),
      other.begin.as_ref()
    ) && same_bound(
      adapter,
      self.end.as_ref(),
      other.end.as_ref()
    )
  }
}

/// Adapter equality extended to the
/// sentinel: two unbounded endpoints
/// match, a missing endpoint only
/// matches another missing one.
pub fn same_bound<A>(
  adapter: &A,
  first: Option<&Bound<A::Date>>,
  second: Option<&Bound<A::Date>>
) -> bool
where
  A: DateAdapter
{
  match (first, second) {
    | (
      Some(Bound::Date(a)),
      Some(Bound::Date(b))
    ) => adapter.same_date(Some(a), Some(b)),
    | (
      Some(Bound::Unbounded),
      Some(Bound::Unbounded)
    ) => true,
    | (None, None) => true,
    | _ => false
  }
}

/// Selection a calendar and its month view
/// share: the single selected date, the
/// range endpoints and the pending first
/// click of a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState<D> {
  pub selected: Option<D>,
  pub begin:    Option<Bound<D>>,
  pub end:      Option<Bound<D>>,
  pub pending:  Option<D>
}

impl<D> Default for SelectionState<D> {
  fn default() -> Self {
    Self {
      selected: None,
      begin:    None,
      end:      None,
      pending:  None
    }
  }
}

/// The bound form value: a bare date or
/// a `{begin, end}` range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerValue<D> {
  Date(D),
  Range(RangeValue<D>)
}

impl<D: Clone> PickerValue<D> {
  pub fn is_range(&self) -> bool {
    matches!(self, Self::Range(_))
  }

  pub fn as_date(&self) -> Option<&D> {
    match self {
      | Self::Date(date) => Some(date),
      | Self::Range(_) => None
    }
  }

  pub fn as_range(
    &self
  ) -> Option<&RangeValue<D>> {
    match self {
      | Self::Range(range) => Some(range),
      | Self::Date(_) => None
    }
  }

  /// Switching between the bare-date and
  /// range shapes always counts as a
  /// difference.
  pub fn same_as<A>(
    &self,
    other: &Self,
    adapter: &A
  ) -> bool
  where
    A: DateAdapter<Date = D>
  {
    match (self, other) {
      | (Self::Date(a), Self::Date(b)) => {
        adapter
          .same_date(Some(a), Some(b))
      }
      | (
        Self::Range(a),
        Self::Range(b)
      ) => a.same_as(b, adapter),
      | _ => false
    }
  }
}

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
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
  Date,
  Range,
  Since,
  Until
}

impl SelectionMode {
  pub fn all() -> [Self; 4] {
    [
      Self::Date,
      Self::Range,
      Self::Since,
      Self::Until
    ]
  }

  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Date => "date",
      | Self::Range => "range",
      | Self::Since => "since",
      | Self::Until => "until"
    }
  }

  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    match key
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "date" => Some(Self::Date),
      | "range" => Some(Self::Range),
      | "since" => Some(Self::Since),
      | "until" => Some(Self::Until),
      | _ => None
    }
  }

  /// Modes whose value is `{begin, end}`.
  pub fn is_range_capable(self) -> bool {
    !matches!(self, Self::Date)
  }

  /// Modes completed by one click.
  pub fn is_single_endpoint(
    self
  ) -> bool {
    matches!(self, Self::Since | Self::Until)
  }

  /// Derives the mode from the value
  /// shape. An unbounded begin wins over
  /// an unbounded end.
  pub fn infer<D>(
    value: &PickerValue<D>
  ) -> Self {
    match value {
      | PickerValue::Date(_) => {
        Self::Date
      }
      | PickerValue::Range(range) => {
        if matches!(
          range.begin,
          Some(Bound::Unbounded)
        ) {
          Self::Until
        } else if matches!(
          range.end,
          Some(Bound::Unbounded)
        ) {
          Self::Since
        } else {
          Self::Range
        }
      }
    }
  }
}

impl fmt::Display for SelectionMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_key())
  }
}

impl FromStr for SelectionMode {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    Self::from_key(s).ok_or_else(|| {
      anyhow!(
        "unknown selection mode: {s} \
         (expected date, range, since \
         or until)"
      )
    })
  }
}

/// Serialized form value: ISO 8601 text,
/// `∞` for an unbounded endpoint.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(untagged)]
pub enum RawValue {
  Range {
    begin: Option<String>,
    end:   Option<String>
  },
  Date(String)
}

/// A raw value run through the adapter.
/// `valid` is false when some non-empty
/// text failed to deserialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deserialized<D> {
  pub value: Option<PickerValue<D>>,
  pub valid: bool
}

impl RawValue {
  pub fn deserialize_with<A>(
    &self,
    adapter: &A
  ) -> Deserialized<A::Date>
  where
    A: DateAdapter
  {
    match self {
      | Self::Date(raw) => {
        match adapter.deserialize(raw) {
          | Parsed::Empty => {
            Deserialized {
              value: None,
              valid: true
            }
          }
          | Parsed::Valid(date) => {
            Deserialized {
              value: Some(
                PickerValue::Date(date)
              ),
              valid: true
            }
          }
          | Parsed::Invalid => {
            Deserialized {
              value: None,
              valid: false
            }
          }
        }
      }
      | Self::Range { begin, end } => {
        let begin = deserialize_bound(
          adapter,
          begin.as_deref()
        );
        let end = deserialize_bound(
          adapter,
          end.as_deref()
        );
        let valid = matches!(
          begin,
          Parsed::Empty
        ) || matches!(end, Parsed::Empty)
          || (begin.is_valid()
            && end.is_valid());
        Deserialized {
          value: Some(PickerValue::Range(
            RangeValue::new(
              begin.into_option(),
              end.into_option()
            )
          )),
          valid
        }
      }
    }
  }

  pub fn from_value<A>(
    adapter: &A,
    value: &PickerValue<A::Date>
  ) -> Self
  where
    A: DateAdapter
  {
    match value {
      | PickerValue::Date(date) => {
        Self::Date(
          adapter.to_iso8601(date)
        )
      }
      | PickerValue::Range(range) => {
        let serialize =
          |bound: &Option<
            Bound<A::Date>
          >| {
            bound.as_ref().map(|bound| {
              match bound {
                | Bound::Date(date) => {
                  adapter
                    .to_iso8601(date)
                }
                | Bound::Unbounded => {
                  UNBOUNDED_SYMBOL
                    .to_string()
                }
              }
            })
          };
        Self::Range {
          begin: serialize(&range.begin),
          end:   serialize(&range.end)
        }
      }
    }
  }
}

fn deserialize_bound<A>(
  adapter: &A,
  raw: Option<&str>
) -> Parsed<Bound<A::Date>>
where
  A: DateAdapter
{
  let Some(raw) = raw else {
    return Parsed::Empty;
  };
  if raw.trim() == UNBOUNDED_SYMBOL {
    return Parsed::Valid(
      Bound::Unbounded
    );
  }
  match adapter.deserialize(raw) {
    | Parsed::Empty => Parsed::Empty,
    | Parsed::Valid(date) => {
      Parsed::Valid(Bound::Date(date))
    }
    | Parsed::Invalid => Parsed::Invalid
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::{
    Bound,
    PickerValue,
    RangeValue,
    RawValue,
    SelectionMode
  };
  use crate::adapter::NativeDateAdapter;

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
  fn ordered_swaps_reversed_pair() {
    let adapter =
      NativeDateAdapter::default();
    let range = RangeValue::ordered(
      &adapter,
      Bound::Date(ymd(2024, 1, 20)),
      Bound::Date(ymd(2024, 1, 5))
    );
    assert_eq!(
      range.begin_date(),
      Some(&ymd(2024, 1, 5))
    );
    assert_eq!(
      range.end_date(),
      Some(&ymd(2024, 1, 20))
    );
    assert!(!range.is_reversed(&adapter));
  }

  #[test]
  fn ordered_keeps_sentinel_in_place() {
    let adapter =
      NativeDateAdapter::default();
    let range = RangeValue::ordered(
      &adapter,
      Bound::Unbounded,
      Bound::Date(ymd(2024, 1, 5))
    );
    assert_eq!(
      range.begin,
      Some(Bound::Unbounded)
    );
  }

  #[test]
  fn infers_since_from_unbounded_end() {
    let value = PickerValue::Range(
      RangeValue::since(ymd(2024, 1, 1))
    );
    assert_eq!(
      SelectionMode::infer(&value),
      SelectionMode::Since
    );
  }

  #[test]
  fn infers_until_from_unbounded_begin() {
    let value = PickerValue::Range(
      RangeValue::until(ymd(2024, 1, 1))
    );
    assert_eq!(
      SelectionMode::infer(&value),
      SelectionMode::Until
    );
  }

  #[test]
  fn infers_range_and_date() {
    let range = PickerValue::Range(
      RangeValue::single_day(ymd(
        2024, 1, 1
      ))
    );
    assert_eq!(
      SelectionMode::infer(&range),
      SelectionMode::Range
    );
    assert_eq!(
      SelectionMode::infer(
        &PickerValue::Date(ymd(2024, 1, 1))
      ),
      SelectionMode::Date
    );
  }

  #[test]
  fn shape_switch_is_a_change() {
    let adapter =
      NativeDateAdapter::default();
    let date =
      PickerValue::Date(ymd(2024, 1, 1));
    let range = PickerValue::Range(
      RangeValue::single_day(ymd(
        2024, 1, 1
      ))
    );
    assert!(!date.same_as(&range, &adapter));
    assert!(range.same_as(
      &range.clone(),
      &adapter
    ));
  }

  #[test]
  fn raw_values_deserialize_through_adapter()
  {
    let adapter =
      NativeDateAdapter::default();
    let raw: RawValue = serde_json::from_str(
      r#"{"begin":"2024-01-05","end":"∞"}"#
    )
    .expect("raw range json");
    let out = raw.deserialize_with(&adapter);
    assert!(out.valid);
    assert_eq!(
      out.value,
      Some(PickerValue::Range(
        RangeValue::since(ymd(2024, 1, 5))
      ))
    );

    let bad =
      RawValue::Date("yesterday".into())
        .deserialize_with(&adapter);
    assert!(!bad.valid);
    assert_eq!(bad.value, None);
  }

  #[test]
  fn raw_value_serializes_sentinel() {
    let adapter =
      NativeDateAdapter::default();
    let raw = RawValue::from_value(
      &adapter,
      &PickerValue::Range(
        RangeValue::until(ymd(2024, 3, 1))
      )
    );
    assert_eq!(
      raw,
      RawValue::Range {
        begin: Some("∞".to_string()),
        end:   Some(
          "2024-03-01".to_string()
        )
      }
    );
  }

  #[test]
  fn mode_keys_round_trip() {
    for mode in SelectionMode::all() {
      assert_eq!(
        mode
          .as_key()
          .parse::<SelectionMode>()
          .expect("known mode"),
        mode
      );
    }
    assert!(
      "weekly"
        .parse::<SelectionMode>()
        .is_err()
    );
  }
}
