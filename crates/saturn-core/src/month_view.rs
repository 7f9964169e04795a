use std::cmp::Ordering;
use std::rc::Rc;

use serde::Serialize;
use tracing::{
  debug,
  warn
};

use crate::adapter::{
  DateAdapter,
  NameStyle
};
use crate::body::{
  CalendarBody,
  RangeMarks
};
use crate::cell::{
  CalendarCell,
  into_rows
};
use crate::events::ViewEvent;
use crate::range::{
  Bound,
  SelectionState
};
use crate::view::{
  DAYS_PER_WEEK,
  Key,
  KeyPress,
  ViewContext
};

#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct WeekdayLabel {
  pub long:   String,
  pub narrow: String
}

/// Day grid of one month.
#[derive(Debug)]
pub struct MonthView<A: DateAdapter> {
  active_date:       A::Date,
  selection:         SelectionState<A::Date>,
  month_label:       String,
  weekdays:          Vec<WeekdayLabel>,
  first_week_offset: u32,
  selected_date:     Option<u32>,
  today_date:        Option<u32>,
  begin_number:      Option<u32>,
  end_number:        Option<u32>,
  range_full:        bool,
  body:              CalendarBody
}

impl<A: DateAdapter> MonthView<A> {
  pub fn new(
    ctx: &ViewContext<A>,
    active_date: &A::Date,
    selection: SelectionState<A::Date>
  ) -> Self {
    let mut body =
      CalendarBody::new(DAYS_PER_WEEK as usize);
    body.range_hover_effect =
      ctx.range_hover_effect;

    let mut view = Self {
      active_date: ctx.clamp(active_date),
      selection,
      month_label: String::new(),
      weekdays: rotated_weekdays(
        ctx.adapter.as_ref()
      ),
      first_week_offset: 0,
      selected_date: None,
      today_date: None,
      begin_number: None,
      end_number: None,
      range_full: false,
      body
    };
    view.init(ctx);
    view
  }

  pub fn active_date(&self) -> &A::Date {
    &self.active_date
  }

  pub fn selection(
    &self
  ) -> &SelectionState<A::Date> {
    &self.selection
  }

  pub fn body(&self) -> &CalendarBody {
    &self.body
  }

  pub fn month_label(&self) -> &str {
    &self.month_label
  }

  pub fn weekdays(&self) -> &[WeekdayLabel] {
    &self.weekdays
  }

  pub fn first_week_offset(&self) -> u32 {
    self.first_week_offset
  }

  pub fn is_range_full(&self) -> bool {
    self.range_full
  }

  /// Clamps into `[min, max]`; the grid
  /// is rebuilt only when the month
  /// changes.
  pub fn set_active_date(
    &mut self,
    ctx: &ViewContext<A>,
    date: &A::Date
  ) {
    let old = self.active_date.clone();
    self.active_date = ctx.clamp(date);
    if ctx.same_month_and_year(
      &old,
      &self.active_date
    ) {
      self.refresh_marks(ctx);
      self.sync_active_cell(ctx);
    } else {
      self.init(ctx);
    }
  }

  pub fn set_selection(
    &mut self,
    ctx: &ViewContext<A>,
    selection: SelectionState<A::Date>
  ) {
    self.selection = selection;
    self.init(ctx);
  }

  /// Recomputes labels, offsets and cells
  /// for the active month.
  pub fn init(
    &mut self,
    ctx: &ViewContext<A>
  ) {
    let adapter = ctx.adapter.as_ref();
    self.update_range_values(ctx);
    self.selected_date = self
      .date_in_current_month(
        ctx,
        self.selection.selected.as_ref()
      );
    self.today_date = self
      .date_in_current_month(
        ctx,
        Some(&adapter.today())
      );

    let month =
      adapter.get_month(&self.active_date);
    self.month_label = adapter
      .get_month_names(NameStyle::Short)
      .get(month as usize - 1)
      .map(|name| name.to_uppercase())
      .unwrap_or_default();

    match adapter.create_date(
      adapter.get_year(&self.active_date),
      month,
      1
    ) {
      | Ok(first_of_month) => {
        let weekday = adapter
          .get_day_of_week(&first_of_month);
        let first_day = adapter
          .get_first_day_of_week()
          % DAYS_PER_WEEK;
        self.first_week_offset =
          (DAYS_PER_WEEK + weekday
            - first_day)
            % DAYS_PER_WEEK;
      }
      | Err(error) => {
        warn!(
          %error,
          "cannot build first day of the \
           active month"
        );
        self.first_week_offset = 0;
      }
    }

    self.create_week_cells(ctx);
  }

  /// Activation of a day of the active
  /// month.
  #[tracing::instrument(
    skip(self, ctx),
    fields(mode = %ctx.selection_mode)
  )]
  pub fn date_selected(
    &mut self,
    ctx: &ViewContext<A>,
    day: u32
  ) -> Vec<ViewEvent<A::Date>> {
    let mut events = Vec::new();
    let Some(date) = self.date_in_view(ctx, day)
    else {
      return events;
    };

    let mode = ctx.selection_mode;
    if mode.is_range_capable() {
      if self.selection.pending.is_none() {
        events.push(ViewEvent::SelectedChange(
          date.clone()
        ));
        if mode.is_single_endpoint() {
          events.push(ViewEvent::UserSelection);
        } else {
          self.selection.pending =
            Some(date.clone());
        }
      } else {
        self.selection.pending = None;
        events.push(ViewEvent::SelectedChange(
          date.clone()
        ));
        events.push(ViewEvent::UserSelection);
      }
      debug!(
        pending = self.selection.pending.is_some(),
        "range activation"
      );
      self.refresh_marks(ctx);
      self.create_week_cells(ctx);
      let old = self.active_date.clone();
      self.set_active_date(ctx, &date);
      if ctx
        .adapter
        .compare_date(&old, &self.active_date)
        != Ordering::Equal
      {
        events.push(
          ViewEvent::ActiveDateChange(
            self.active_date.clone()
          )
        );
      }
      events.push(ViewEvent::FocusActiveCell);
    } else if self.selected_date != Some(day)
    {
      events.push(ViewEvent::SelectedChange(
        date
      ));
      events.push(ViewEvent::UserSelection);
      self.create_week_cells(ctx);
    }
    events
  }

  /// Click on the cell holding `value`.
  /// Disabled or unknown cells do nothing.
  pub fn cell_clicked(
    &mut self,
    ctx: &ViewContext<A>,
    value: u32
  ) -> Vec<ViewEvent<A::Date>> {
    let clicked = self
      .body
      .find_cell(value)
      .and_then(|cell| {
        self.body.cell_clicked(cell)
      });
    match clicked {
      | Some(day) => {
        self.date_selected(ctx, day)
      }
      | None => {
        debug!(
          value,
          "ignored click on disabled cell"
        );
        Vec::new()
      }
    }
  }

  pub fn hover(&mut self, value: u32) {
    if let Some(cell) =
      self.body.find_cell(value).cloned()
    {
      self.body.mouse_over_cell(&cell);
    }
  }

  pub fn handle_keydown(
    &mut self,
    ctx: &ViewContext<A>,
    press: KeyPress
  ) -> Vec<ViewEvent<A::Date>> {
    let adapter = Rc::clone(&ctx.adapter);
    let old = self.active_date.clone();
    let step: i64 =
      if ctx.rtl { -1 } else { 1 };

    let next = match press.key {
      | Key::Left => {
        adapter.add_calendar_days(&old, -step)
      }
      | Key::Right => {
        adapter.add_calendar_days(&old, step)
      }
      | Key::Up => {
        adapter.add_calendar_days(&old, -7)
      }
      | Key::Down => {
        adapter.add_calendar_days(&old, 7)
      }
      | Key::Home => {
        adapter.add_calendar_days(
          &old,
          1 - i64::from(adapter.get_date(&old))
        )
      }
      | Key::End => {
        adapter.add_calendar_days(
          &old,
          i64::from(
            adapter.get_num_days_in_month(&old)
          ) - i64::from(adapter.get_date(&old))
        )
      }
      | Key::PageUp => {
        if press.alt {
          adapter.add_calendar_years(&old, -1)
        } else {
          adapter.add_calendar_months(&old, -1)
        }
      }
      | Key::PageDown => {
        if press.alt {
          adapter.add_calendar_years(&old, 1)
        } else {
          adapter.add_calendar_months(&old, 1)
        }
      }
      | Key::Enter | Key::Space => {
        return self.activate(ctx);
      }
      | Key::Escape | Key::Other => {
        return Vec::new();
      }
    };

    self.set_active_date(ctx, &next);
    let mut events = Vec::new();
    if adapter
      .compare_date(&old, &self.active_date)
      != Ordering::Equal
    {
      events.push(ViewEvent::ActiveDateChange(
        self.active_date.clone()
      ));
    }
    events.push(ViewEvent::FocusActiveCell);
    events
  }

  fn activate(
    &mut self,
    ctx: &ViewContext<A>
  ) -> Vec<ViewEvent<A::Date>> {
    if !ctx.passes_filter(&self.active_date) {
      return Vec::new();
    }
    let day =
      ctx.adapter.get_date(&self.active_date);
    let mut events =
      self.date_selected(ctx, day);
    if self.selection.pending.is_none()
      && !events
        .contains(&ViewEvent::UserSelection)
    {
      events.push(ViewEvent::UserSelection);
    }
    if (self.selection.pending.is_some()
      || !ctx.close_after_selection)
      && !events
        .contains(&ViewEvent::FocusActiveCell)
    {
      events.push(ViewEvent::FocusActiveCell);
    }
    events
  }

  fn date_in_view(
    &self,
    ctx: &ViewContext<A>,
    day: u32
  ) -> Option<A::Date> {
    let adapter = ctx.adapter.as_ref();
    match adapter.create_date(
      adapter.get_year(&self.active_date),
      adapter.get_month(&self.active_date),
      day
    ) {
      | Ok(date) => Some(date),
      | Err(error) => {
        warn!(%error, day, "day outside the active month");
        None
      }
    }
  }

  fn date_in_current_month(
    &self,
    ctx: &ViewContext<A>,
    date: Option<&A::Date>
  ) -> Option<u32> {
    date
      .filter(|date| {
        ctx.same_month_and_year(
          date,
          &self.active_date
        )
      })
      .map(|date| ctx.adapter.get_date(date))
  }

  fn bound_in_current_month(
    &self,
    ctx: &ViewContext<A>,
    bound: Option<&Bound<A::Date>>
  ) -> Option<u32> {
    self.date_in_current_month(
      ctx,
      bound.and_then(Bound::as_date)
    )
  }

  fn update_range_values(
    &mut self,
    ctx: &ViewContext<A>
  ) {
    if !ctx.selection_mode.is_range_capable() {
      self.begin_number = None;
      self.end_number = None;
      self.range_full = false;
      return;
    }

    self.begin_number = self
      .bound_in_current_month(
        ctx,
        self.selection.begin.as_ref()
      );
    self.end_number = self
      .bound_in_current_month(
        ctx,
        self.selection.end.as_ref()
      );

    let adapter = ctx.adapter.as_ref();
    let active = &self.active_date;
    let begin_before_active =
      match &self.selection.begin {
        | Some(Bound::Date(begin)) => {
          adapter.compare_date(begin, active)
            != Ordering::Greater
        }
        | Some(Bound::Unbounded) => true,
        | None => false
      };
    let active_before_end =
      match &self.selection.end {
        | Some(Bound::Date(end)) => {
          adapter.compare_date(active, end)
            != Ordering::Greater
        }
        | Some(Bound::Unbounded) => true,
        | None => false
      };

    self.range_full = self.begin_number.is_none()
      && self.end_number.is_none()
      && begin_before_active
      && active_before_end;
  }

  fn refresh_marks(
    &mut self,
    ctx: &ViewContext<A>
  ) {
    let adapter = ctx.adapter.as_ref();
    let period = |date: &A::Date| {
      (
        adapter.get_year(date),
        adapter.get_month(date)
      )
    };
    let pending =
      self.selection.pending.as_ref();
    // Whole months: a day earlier in the
    // pending month is not "before".
    let is_before_selected = pending
      .is_some_and(|pending| {
        period(&self.active_date)
          < period(pending)
      });
    self.body.set_marks(RangeMarks {
      begin: self.begin_number,
      end: self.end_number,
      begin_selected: pending.is_some(),
      is_before_selected,
      range_full: self.range_full,
      range_mode: ctx
        .selection_mode
        .is_range_capable()
    });
  }

  fn sync_active_cell(
    &mut self,
    ctx: &ViewContext<A>
  ) {
    let day =
      ctx.adapter.get_date(&self.active_date);
    self
      .body
      .set_active_cell(day.saturating_sub(1) as usize);
  }

  fn create_week_cells(
    &mut self,
    ctx: &ViewContext<A>
  ) {
    let adapter = ctx.adapter.as_ref();
    let year =
      adapter.get_year(&self.active_date);
    let month =
      adapter.get_month(&self.active_date);
    let days_in_month = adapter
      .get_num_days_in_month(
        &self.active_date
      );
    let date_names = adapter.get_date_names();

    let cells = (1..=days_in_month)
      .filter_map(|day| {
        let date = adapter
          .create_date(year, month, day)
          .ok()?;
        let display = date_names
          .get(day as usize - 1)
          .cloned()
          .unwrap_or_else(|| day.to_string());
        let aria_label = ctx.format_or_iso(
          &date,
          &ctx.formats.date_a11y_label
        );
        Some(
          CalendarCell::new(
            day,
            display,
            aria_label,
            ctx.should_enable(&date)
          )
          .with_classes(ctx.classes_for(&date))
        )
      })
      .collect();

    self.body.set_rows(into_rows(
      cells,
      DAYS_PER_WEEK as usize,
      self.first_week_offset as usize
    ));
    self.body.label = self.month_label.clone();
    self.body.today_value = self.today_date;
    self.body.selected_value =
      self.selected_date;
    self.refresh_marks(ctx);
    self.sync_active_cell(ctx);
  }
}

/// Weekday labels starting at the locale's
/// first day of the week.
fn rotated_weekdays<A: DateAdapter>(
  adapter: &A
) -> Vec<WeekdayLabel> {
  let narrow = adapter
    .get_day_of_week_names(NameStyle::Narrow);
  let mut weekdays: Vec<WeekdayLabel> =
    adapter
      .get_day_of_week_names(NameStyle::Long)
      .into_iter()
      .zip(narrow)
      .map(|(long, narrow)| {
        WeekdayLabel { long, narrow }
      })
      .collect();
  let first =
    adapter.get_first_day_of_week() as usize;
  if first < weekdays.len() {
    weekdays.rotate_left(first);
  }
  weekdays
}
