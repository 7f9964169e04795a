use std::collections::BTreeSet;

use serde::Serialize;

/// Extra class names attached to a cell by
/// a date-class callback.
pub type CellClasses = BTreeSet<String>;

/// Callback deciding whether a date may be
/// picked.
pub type DateFilter<D> =
  std::rc::Rc<dyn Fn(&D) -> bool>;

/// Callback attaching class names to a
/// rendered date.
pub type DateClass<D> =
  std::rc::Rc<dyn Fn(&D) -> CellClasses>;

/// One cell of a month, year or multi-year
/// grid. Views rebuild their cells on every
/// render; a cell never changes after it
/// is created.
#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct CalendarCell {
  pub value:         u32,
  pub display_value: String,
  pub aria_label:    String,
  pub enabled:       bool,
  pub css_classes:   Option<CellClasses>
}

impl CalendarCell {
  pub fn new(
    value: u32,
    display_value: impl Into<String>,
    aria_label: impl Into<String>,
    enabled: bool
  ) -> Self {
    Self {
      value,
      display_value: display_value
        .into(),
      aria_label: aria_label.into(),
      enabled,
      css_classes: None
    }
  }

  pub fn with_classes(
    mut self,
    classes: Option<CellClasses>
  ) -> Self {
    self.css_classes =
      classes.filter(|set| !set.is_empty());
    self
  }
}

/// Splits cells into rows of `num_cols`
/// with the first row shortened by
/// `first_row_offset` blank slots.
pub(crate) fn into_rows(
  cells: Vec<CalendarCell>,
  num_cols: usize,
  first_row_offset: usize
) -> Vec<Vec<CalendarCell>> {
  let num_cols = num_cols.max(1);
  let mut rows: Vec<Vec<CalendarCell>> =
    vec![Vec::new()];
  let mut slot = first_row_offset % num_cols;
  for cell in cells {
    if slot == num_cols {
      rows.push(Vec::new());
      slot = 0;
    }
    if let Some(row) = rows.last_mut() {
      row.push(cell);
    }
    slot += 1;
  }
  rows
}
