use std::cmp::Ordering;
use std::rc::Rc;

use tracing::{
  debug,
  warn
};

use crate::adapter::{
  DateAdapter,
  NameStyle
};
use crate::body::CalendarBody;
use crate::cell::{
  CalendarCell,
  into_rows
};
use crate::events::ViewEvent;
use crate::view::{
  Key,
  KeyPress,
  MONTHS_PER_ROW,
  ViewContext
};

/// Month grid of one year.
#[derive(Debug)]
pub struct YearView<A: DateAdapter> {
  active_date:    A::Date,
  selected:       Option<A::Date>,
  year_label:     String,
  selected_month: Option<u32>,
  today_month:    Option<u32>,
  body:           CalendarBody
}

impl<A: DateAdapter> YearView<A> {
  pub fn new(
    ctx: &ViewContext<A>,
    active_date: &A::Date,
    selected: Option<A::Date>
  ) -> Self {
    let mut view = Self {
      active_date: ctx.clamp(active_date),
      selected,
      year_label: String::new(),
      selected_month: None,
      today_month: None,
      body: CalendarBody::new(
        MONTHS_PER_ROW as usize
      )
    };
    view.body.range_hover_effect = false;
    view.init(ctx);
    view
  }

  pub fn active_date(&self) -> &A::Date {
    &self.active_date
  }

  pub fn body(&self) -> &CalendarBody {
    &self.body
  }

  pub fn year_label(&self) -> &str {
    &self.year_label
  }

  pub fn set_active_date(
    &mut self,
    ctx: &ViewContext<A>,
    date: &A::Date
  ) {
    let old_year =
      ctx.adapter.get_year(&self.active_date);
    self.active_date = ctx.clamp(date);
    if old_year
      == ctx.adapter.get_year(&self.active_date)
    {
      self.sync_active_cell(ctx);
    } else {
      self.init(ctx);
    }
  }

  pub fn set_selected(
    &mut self,
    ctx: &ViewContext<A>,
    selected: Option<A::Date>
  ) {
    self.selected = selected;
    self.init(ctx);
  }

  pub fn init(
    &mut self,
    ctx: &ViewContext<A>
  ) {
    let adapter = ctx.adapter.as_ref();
    let year =
      adapter.get_year(&self.active_date);
    self.selected_month =
      self.selected.as_ref().and_then(
        |selected| {
          (adapter.get_year(selected) == year)
            .then(|| adapter.get_month(selected))
        }
      );
    let today = adapter.today();
    self.today_month = (adapter
      .get_year(&today)
      == year)
      .then(|| adapter.get_month(&today));
    self.year_label =
      adapter.get_year_name(&self.active_date);

    let names =
      adapter.get_month_names(NameStyle::Short);
    let cells = (1..=12u32)
      .filter_map(|month| {
        let first = adapter
          .create_date(year, month, 1)
          .ok()?;
        let name = names
          .get(month as usize - 1)
          .map(|name| name.to_uppercase())
          .unwrap_or_else(|| month.to_string());
        let aria_label = ctx.format_or_iso(
          &first,
          &ctx.formats.month_year_a11y_label
        );
        Some(CalendarCell::new(
          month,
          name,
          aria_label,
          should_enable_month(ctx, year, month)
        ))
      })
      .collect();

    self.body.set_rows(into_rows(
      cells,
      MONTHS_PER_ROW as usize,
      0
    ));
    self.body.label = self.year_label.clone();
    self.body.today_value = self.today_month;
    self.body.selected_value =
      self.selected_month;
    self.sync_active_cell(ctx);
  }

  /// Emits the first of the chosen month,
  /// then the active day moved into it.
  pub fn month_selected(
    &mut self,
    ctx: &ViewContext<A>,
    month: u32
  ) -> Vec<ViewEvent<A::Date>> {
    let adapter = ctx.adapter.as_ref();
    let year =
      adapter.get_year(&self.active_date);
    let normalized =
      match adapter.create_date(year, month, 1) {
        | Ok(date) => date,
        | Err(error) => {
          warn!(%error, month, "cannot select month");
          return Vec::new();
        }
      };
    let days_in_month =
      adapter.get_num_days_in_month(&normalized);
    let day = adapter
      .get_date(&self.active_date)
      .min(days_in_month);
    match adapter.create_date(year, month, day) {
      | Ok(selected) => {
        debug!(year, month, "month selected");
        vec![
          ViewEvent::MonthSelected(normalized),
          ViewEvent::SelectedChange(selected),
        ]
      }
      | Err(error) => {
        warn!(%error, month, "cannot select month");
        Vec::new()
      }
    }
  }

  pub fn cell_clicked(
    &mut self,
    ctx: &ViewContext<A>,
    value: u32
  ) -> Vec<ViewEvent<A::Date>> {
    match self
      .body
      .find_cell(value)
      .and_then(|cell| {
        self.body.cell_clicked(cell)
      }) {
      | Some(month) => {
        self.month_selected(ctx, month)
      }
      | None => Vec::new()
    }
  }

  pub fn handle_keydown(
    &mut self,
    ctx: &ViewContext<A>,
    press: KeyPress
  ) -> Vec<ViewEvent<A::Date>> {
    let adapter = Rc::clone(&ctx.adapter);
    let old = self.active_date.clone();
    let step: i32 =
      if ctx.rtl { -1 } else { 1 };
    let month = adapter.get_month(&old) as i32;

    let next = match press.key {
      | Key::Left => {
        adapter.add_calendar_months(&old, -step)
      }
      | Key::Right => {
        adapter.add_calendar_months(&old, step)
      }
      | Key::Up => {
        adapter.add_calendar_months(
          &old,
          -(MONTHS_PER_ROW as i32)
        )
      }
      | Key::Down => {
        adapter.add_calendar_months(
          &old,
          MONTHS_PER_ROW as i32
        )
      }
      | Key::Home => {
        adapter
          .add_calendar_months(&old, 1 - month)
      }
      | Key::End => {
        adapter
          .add_calendar_months(&old, 12 - month)
      }
      | Key::PageUp => {
        adapter.add_calendar_years(
          &old,
          if press.alt { -10 } else { -1 }
        )
      }
      | Key::PageDown => {
        adapter.add_calendar_years(
          &old,
          if press.alt { 10 } else { 1 }
        )
      }
      | Key::Enter | Key::Space => {
        let month = adapter.get_month(&old);
        return self.cell_clicked(ctx, month);
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

  fn sync_active_cell(
    &mut self,
    ctx: &ViewContext<A>
  ) {
    let month =
      ctx.adapter.get_month(&self.active_date);
    self
      .body
      .set_active_cell(month.saturating_sub(1) as usize);
  }
}

/// A month is pickable when it overlaps
/// `[min, max]` and at least one of its
/// days passes the filter.
fn should_enable_month<A: DateAdapter>(
  ctx: &ViewContext<A>,
  year: i32,
  month: u32
) -> bool {
  let adapter = ctx.adapter.as_ref();
  if let Some(max) = &ctx.max
    && (year, month)
      > (adapter.get_year(max), adapter.get_month(max))
  {
    return false;
  }
  if let Some(min) = &ctx.min
    && (year, month)
      < (adapter.get_year(min), adapter.get_month(min))
  {
    return false;
  }
  if ctx.filter.is_none() {
    return true;
  }

  let Ok(first) =
    adapter.create_date(year, month, 1)
  else {
    return false;
  };
  let days = adapter.get_num_days_in_month(&first);
  (1..=days).any(|day| {
    adapter
      .create_date(year, month, day)
      .is_ok_and(|date| ctx.passes_filter(&date))
  })
}

#[cfg(test)]
mod tests {
  use std::rc::Rc;

  use chrono::{
    Datelike,
    NaiveDate
  };

  use super::YearView;
  use crate::adapter::{
    DateFormats,
    NativeDateAdapter
  };
  use crate::events::ViewEvent;
  use crate::view::{
    Key,
    KeyPress,
    ViewContext
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

  fn context() -> ViewContext<NativeDateAdapter>
  {
    ViewContext::new(
      Rc::new(NativeDateAdapter::default()),
      Rc::new(DateFormats::default())
    )
  }

  #[test]
  fn lays_out_twelve_months_in_rows_of_four()
  {
    let ctx = context();
    let view =
      YearView::new(&ctx, &ymd(2024, 5, 3), None);
    let rows = view.body().rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0].display_value, "JAN");
    assert_eq!(rows[2][3].aria_label, "December 2024");
    assert_eq!(view.year_label(), "2024");
    assert!(view.body().is_active_cell(1, 0));
  }

  #[test]
  fn months_outside_bounds_or_filter_are_disabled()
  {
    let mut ctx = context();
    ctx.min = Some(ymd(2024, 3, 15));
    ctx.max = Some(ymd(2024, 10, 1));
    ctx.filter = Some(Rc::new(
      |date: &NaiveDate| date.month() != 6
    ));
    let mut view =
      YearView::new(&ctx, &ymd(2024, 5, 3), None);

    let enabled: Vec<u32> = view
      .body()
      .rows()
      .iter()
      .flatten()
      .filter(|cell| cell.enabled)
      .map(|cell| cell.value)
      .collect();
    assert_eq!(enabled, vec![3, 4, 5, 7, 8, 9, 10]);
    assert!(view.cell_clicked(&ctx, 6).is_empty());
  }

  #[test]
  fn selecting_month_clamps_day() {
    let ctx = context();
    let mut view = YearView::new(
      &ctx,
      &ymd(2023, 1, 31),
      None
    );
    assert_eq!(
      view.cell_clicked(&ctx, 2),
      vec![
        ViewEvent::MonthSelected(ymd(2023, 2, 1)),
        ViewEvent::SelectedChange(ymd(
          2023, 2, 28
        ))
      ]
    );
  }

  #[test]
  fn keyboard_moves_by_month_and_year() {
    let ctx = context();
    let mut view =
      YearView::new(&ctx, &ymd(2024, 5, 3), None);
    view.handle_keydown(
      &ctx,
      KeyPress::plain(Key::Down)
    );
    assert_eq!(view.active_date(), &ymd(2024, 9, 3));
    view.handle_keydown(
      &ctx,
      KeyPress::plain(Key::End)
    );
    assert_eq!(
      view.active_date(),
      &ymd(2024, 12, 3)
    );
    view.handle_keydown(
      &ctx,
      KeyPress::plain(Key::Home)
    );
    assert_eq!(view.active_date(), &ymd(2024, 1, 3));
    let events = view.handle_keydown(
      &ctx,
      KeyPress::alt(Key::PageDown)
    );
    assert_eq!(
      events[0],
      ViewEvent::ActiveDateChange(ymd(2034, 1, 3))
    );
    assert_eq!(view.year_label(), "2034");
  }
}
