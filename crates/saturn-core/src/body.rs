//! Grid of calendar cells plus the range
//! highlight predicates evaluated for each
//! cell on every render.
//!
//! Day numbers passed in as `begin`/`end`
//! are `None` when the endpoint is outside
//! the displayed period. Ordering tests
//! treat a missing endpoint as `0`; a
//! missing endpoint never equals a cell.

use serde::Serialize;

use crate::cell::{
  CalendarCell,
  CellClasses
};

pub const DEFAULT_NUM_COLS: usize = 7;

/// Range inputs a view hands to its body.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct RangeMarks {
  pub begin:              Option<u32>,
  pub end:                Option<u32>,
  pub begin_selected:     bool,
  pub is_before_selected: bool,
  pub range_full:         bool,
  pub range_mode:         bool
}

/// Every flag a renderer needs for one
/// cell.
#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct CellState {
  pub value:         u32,
  pub display_value: String,
  pub aria_label:    String,
  pub enabled:       bool,
  pub active:        bool,
  pub selected:      bool,
  pub today:         bool,
  pub begin:         bool,
  pub end:           bool,
  pub semi_selected: bool,
  pub between_over:  bool,
  pub preview_over:  bool,
  pub classes:       Option<CellClasses>
}

#[derive(Debug, Clone)]
pub struct CalendarBody {
  pub label:              String,
  pub today_value:        Option<u32>,
  pub selected_value:     Option<u32>,
  pub range_hover_effect: bool,
  rows:                   Vec<Vec<CalendarCell>>,
  num_cols:               usize,
  first_row_offset:       usize,
  marks:                  RangeMarks,
  active_cell:            Option<usize>,
  cell_over:              Option<u32>
}

impl Default for CalendarBody {
  fn default() -> Self {
    Self::new(DEFAULT_NUM_COLS)
  }
}

impl CalendarBody {
  pub fn new(num_cols: usize) -> Self {
    Self {
      label: String::new(),
      today_value: None,
      selected_value: None,
      range_hover_effect: true,
      rows: Vec::new(),
      num_cols: num_cols.max(1),
      first_row_offset: 0,
      marks: RangeMarks::default(),
      active_cell: None,
      cell_over: None
    }
  }

  pub fn rows(&self) -> &[Vec<CalendarCell>] {
    &self.rows
  }

  pub fn num_cols(&self) -> usize {
    self.num_cols
  }

  pub fn marks(&self) -> RangeMarks {
    self.marks
  }

  pub fn cell_over(&self) -> Option<u32> {
    self.cell_over
  }

  pub fn active_cell(&self) -> usize {
    self.active_cell.unwrap_or(0)
  }

  /// Replaces the grid. The first row may
  /// hold fewer than `num_cols` cells.
  pub fn set_rows(
    &mut self,
    rows: Vec<Vec<CalendarCell>>
  ) {
    self.first_row_offset = rows
      .first()
      .filter(|row| !row.is_empty())
      .map(|row| {
        self.num_cols.saturating_sub(row.len())
      })
      .unwrap_or(0);
    self.rows = rows;
  }

  pub fn set_marks(
    &mut self,
    marks: RangeMarks
  ) {
    self.marks = marks;
  }

  /// Moves the keyboard cursor. With the
  /// hover effect on, the hover cursor
  /// follows it to the cell value
  /// `index + 1`.
  pub fn set_active_cell(
    &mut self,
    index: usize
  ) {
    if self.active_cell == Some(index) {
      return;
    }
    self.active_cell = Some(index);
    if self.range_hover_effect {
      self.cell_over =
        u32::try_from(index + 1).ok();
    }
  }

  /// Value reported upward for a click.
  /// Disabled cells report nothing.
  pub fn cell_clicked(
    &self,
    cell: &CalendarCell
  ) -> Option<u32> {
    cell.enabled.then_some(cell.value)
  }

  pub fn mouse_over_cell(
    &mut self,
    cell: &CalendarCell
  ) {
    if self.range_hover_effect {
      self.cell_over = Some(cell.value);
    }
  }

  pub fn find_cell(
    &self,
    value: u32
  ) -> Option<&CalendarCell> {
    self
      .rows
      .iter()
      .flatten()
      .find(|cell| cell.value == value)
  }

  pub fn is_active_cell(
    &self,
    row: usize,
    col: usize
  ) -> bool {
    let mut number =
      row * self.num_cols + col;
    if row > 0 {
      number = number
        .saturating_sub(self.first_row_offset);
    }
    number == self.active_cell()
  }

  pub fn is_selected(
    &self,
    value: u32
  ) -> bool {
    self.selected_value == Some(value)
  }

  pub fn is_today(&self, value: u32) -> bool {
    self.today_value == Some(value)
  }

  pub fn is_semi_selected(
    &self,
    date: u32
  ) -> bool {
    let RangeMarks {
      begin,
      end,
      range_full,
      range_mode,
      ..
    } = self.marks;
    if !range_mode {
      return false;
    }
    if range_full {
      return true;
    }
    if begin == Some(date)
      || end == Some(date)
    {
      return false;
    }
    match (begin, end) {
      | (Some(begin), None) => date > begin,
      | (None, Some(end)) => date < end,
      | (Some(begin), Some(end)) => {
        date > begin && date < end
      }
      | (None, None) => false
    }
  }

  pub fn is_between_over_and_begin(
    &self,
    date: u32
  ) -> bool {
    let Some(over) = self.cell_over else {
      return false;
    };
    let marks = self.marks;
    if !marks.range_mode
      || !marks.begin_selected
    {
      return false;
    }
    if marks.is_before_selected
      && marks.begin.is_none()
    {
      return date > over;
    }
    let begin = marks.begin.unwrap_or(0);
    if over > begin {
      return date > begin && date < over;
    }
    if over < begin {
      return date < begin && date > over;
    }
    false
  }

  pub fn is_begin(&self, date: u32) -> bool {
    let marks = self.marks;
    if let Some(over) = self.hover_gate() {
      if marks.is_before_selected
        && marks.begin.is_none()
      {
        return over == date;
      }
      let begin = marks.begin.unwrap_or(0);
      return (marks.begin == Some(date)
        && over >= begin)
        || (over == date && over < begin);
    }
    marks.begin == Some(date)
  }

  pub fn is_end(&self, date: u32) -> bool {
    let marks = self.marks;
    if let Some(over) = self.hover_gate() {
      if marks.is_before_selected
        && marks.begin.is_none()
      {
        return false;
      }
      let begin = marks.begin.unwrap_or(0);
      return (marks.end == Some(date)
        && over <= begin)
        || (over == date && over > begin);
    }
    marks.end == Some(date)
  }

  pub fn preview_cell_over(
    &self,
    date: u32
  ) -> bool {
    self.cell_over == Some(date)
      && self.marks.range_mode
      && self.marks.begin_selected
  }

  pub fn cell_state(
    &self,
    row: usize,
    col: usize
  ) -> Option<CellState> {
    let cell =
      self.rows.get(row)?.get(col)?;
    let value = cell.value;
    Some(CellState {
      value,
      display_value: cell
        .display_value
        .clone(),
      aria_label: cell.aria_label.clone(),
      enabled: cell.enabled,
      active: self.is_active_cell(row, col),
      selected: self.is_selected(value),
      today: self.is_today(value),
      begin: self.is_begin(value),
      end: self.is_end(value),
      semi_selected: self
        .is_semi_selected(value),
      between_over: self
        .is_between_over_and_begin(value),
      preview_over: self
        .preview_cell_over(value),
      classes: cell.css_classes.clone()
    })
  }

  /// Hover cursor, when a pending range
  /// selection makes it drive the
  /// endpoint predicates.
  fn hover_gate(&self) -> Option<u32> {
    if self.marks.range_mode
      && self.marks.begin_selected
    {
      self.cell_over
    } else {
      None
    }
  }
}
