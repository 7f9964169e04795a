use std::cmp::Ordering;
use std::rc::Rc;

use tracing::{
  debug,
  warn
};

use crate::adapter::DateAdapter;
use crate::body::CalendarBody;
use crate::cell::{
  CalendarCell,
  into_rows
};
use crate::events::ViewEvent;
use crate::view::{
  Key,
  KeyPress,
  ViewContext,
  YEARS_PER_PAGE,
  YEARS_PER_ROW
};

/// First year of the page holding `year`.
pub fn page_start(year: i32) -> i32 {
  year - year.rem_euclid(YEARS_PER_PAGE)
}

pub fn same_page(first: i32, second: i32) -> bool {
  first.div_euclid(YEARS_PER_PAGE)
    == second.div_euclid(YEARS_PER_PAGE)
}

/// Year grid, one page of 24 years.
#[derive(Debug)]
pub struct MultiYearView<A: DateAdapter> {
  active_date:   A::Date,
  selected:      Option<A::Date>,
  years:         Vec<i32>,
  selected_year: Option<i32>,
  today_year:    i32,
  body:          CalendarBody
}

impl<A: DateAdapter> MultiYearView<A> {
  pub fn new(
    ctx: &ViewContext<A>,
    active_date: &A::Date,
    selected: Option<A::Date>
  ) -> Self {
    let mut view = Self {
      active_date: ctx.clamp(active_date),
      selected,
      years: Vec::new(),
      selected_year: None,
      today_year: 0,
      body: CalendarBody::new(
        YEARS_PER_ROW as usize
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

  pub fn years(&self) -> &[i32] {
    &self.years
  }

  pub fn set_active_date(
    &mut self,
    ctx: &ViewContext<A>,
    date: &A::Date
  ) {
    let old_year =
      ctx.adapter.get_year(&self.active_date);
    self.active_date = ctx.clamp(date);
    if same_page(
      old_year,
      ctx.adapter.get_year(&self.active_date)
    ) {
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
    self.today_year =
      adapter.get_year(&adapter.today());
    self.selected_year = self
      .selected
      .as_ref()
      .map(|selected| adapter.get_year(selected));

    let first =
      page_start(adapter.get_year(&self.active_date));
    self.years =
      (first..first + YEARS_PER_PAGE).collect();

    let cells = self
      .years
      .iter()
      .filter_map(|&year| {
        let january =
          adapter.create_date(year, 1, 1).ok()?;
        let name = adapter.get_year_name(&january);
        Some(CalendarCell::new(
          cell_value(year),
          name.clone(),
          name,
          should_enable_year(ctx, year)
        ))
      })
      .collect();

    self.body.set_rows(into_rows(
      cells,
      YEARS_PER_ROW as usize,
      0
    ));
    self.body.today_value =
      Some(cell_value(self.today_year));
    self.body.selected_value =
      self.selected_year.map(cell_value);
    self.sync_active_cell(ctx);
  }

  /// Emits January 1st of the chosen year,
  /// then the active month and day moved
  /// into it.
  pub fn year_selected(
    &mut self,
    ctx: &ViewContext<A>,
    year: i32
  ) -> Vec<ViewEvent<A::Date>> {
    let adapter = ctx.adapter.as_ref();
    let month =
      adapter.get_month(&self.active_date);
    let built = adapter
      .create_date(year, 1, 1)
      .and_then(|january| {
        let first_of_month =
          adapter.create_date(year, month, 1)?;
        let day = adapter
          .get_date(&self.active_date)
          .min(
            adapter.get_num_days_in_month(
              &first_of_month
            )
          );
        let selected =
          adapter.create_date(year, month, day)?;
        Ok((january, selected))
      });
    match built {
      | Ok((january, selected)) => {
        debug!(year, "year selected");
        vec![
          ViewEvent::YearSelected(january),
          ViewEvent::SelectedChange(selected),
        ]
      }
      | Err(error) => {
        warn!(%error, year, "cannot select year");
        Vec::new()
      }
    }
  }

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
    match clicked
      .and_then(|value| i32::try_from(value).ok())
    {
      | Some(year) => {
        self.year_selected(ctx, year)
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
    let offset = adapter
      .get_year(&old)
      .rem_euclid(YEARS_PER_PAGE);

    let years = match press.key {
      | Key::Left => -step,
      | Key::Right => step,
      | Key::Up => -YEARS_PER_ROW,
      | Key::Down => YEARS_PER_ROW,
      | Key::Home => -offset,
      | Key::End => {
        YEARS_PER_PAGE - offset - 1
      }
      | Key::PageUp => {
        if press.alt {
          -YEARS_PER_PAGE * 10
        } else {
          -YEARS_PER_PAGE
        }
      }
      | Key::PageDown => {
        if press.alt {
          YEARS_PER_PAGE * 10
        } else {
          YEARS_PER_PAGE
        }
      }
      | Key::Enter | Key::Space => {
        let year = adapter.get_year(&old);
        return self
          .cell_clicked(ctx, cell_value(year));
      }
      | Key::Escape | Key::Other => {
        return Vec::new();
      }
    };

    let next =
      adapter.add_calendar_years(&old, years);
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
    let year =
      ctx.adapter.get_year(&self.active_date);
    self.body.set_active_cell(
      year.rem_euclid(YEARS_PER_PAGE) as usize
    );
  }
}

// Cells carry the year itself; years before
// the common era collapse to 0.
fn cell_value(year: i32) -> u32 {
  u32::try_from(year).unwrap_or(0)
}

fn should_enable_year<A: DateAdapter>(
  ctx: &ViewContext<A>,
  year: i32
) -> bool {
  let adapter = ctx.adapter.as_ref();
  if ctx
    .max
    .as_ref()
    .is_some_and(|max| year > adapter.get_year(max))
    || ctx
      .min
      .as_ref()
      .is_some_and(|min| year < adapter.get_year(min))
  {
    return false;
  }
  if ctx.filter.is_none() {
    return true;
  }

  let Ok(mut date) =
    adapter.create_date(year, 1, 1)
  else {
    return false;
  };
  while adapter.get_year(&date) == year {
    if ctx.passes_filter(&date) {
      return true;
    }
    date = adapter.add_calendar_days(&date, 1);
  }
  false
}

#[cfg(test)]
mod tests {
  use std::rc::Rc;

  use chrono::{
    Datelike,
    NaiveDate
  };

  use super::{
    MultiYearView,
    page_start,
    same_page
  };
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
  fn pages_hold_twenty_four_years() {
    assert_eq!(page_start(2024), 2016);
    assert_eq!(page_start(2016), 2016);
    assert_eq!(page_start(2039), 2016);
    assert!(same_page(2016, 2039));
    assert!(!same_page(2039, 2040));
  }

  #[test]
  fn grid_covers_the_page() {
    let ctx = context();
    let view = MultiYearView::new(
      &ctx,
      &ymd(2024, 6, 1),
      None
    );
    assert_eq!(view.years().first(), Some(&2016));
    assert_eq!(view.years().last(), Some(&2039));
    assert_eq!(view.body().rows().len(), 6);
    // 2024 is the ninth year of the page.
    assert!(view.body().is_active_cell(2, 0));
  }

  #[test]
  fn years_outside_bounds_are_disabled() {
    let mut ctx = context();
    ctx.min = Some(ymd(2020, 6, 1));
    ctx.max = Some(ymd(2030, 1, 1));
    ctx.filter = Some(Rc::new(
      |date: &NaiveDate| date.year() != 2025
    ));
    let mut view = MultiYearView::new(
      &ctx,
      &ymd(2024, 6, 1),
      None
    );
    let enabled: Vec<u32> = view
      .body()
      .rows()
      .iter()
      .flatten()
      .filter(|cell| cell.enabled)
      .map(|cell| cell.value)
      .collect();
    assert_eq!(
      enabled,
      vec![2020, 2021, 2022, 2023, 2024, 2026, 2027, 2028, 2029, 2030]
    );
    assert!(view.cell_clicked(&ctx, 2019).is_empty());
  }

  #[test]
  fn selecting_year_keeps_month_and_clamps_day()
  {
    let ctx = context();
    let mut view = MultiYearView::new(
      &ctx,
      &ymd(2024, 2, 29),
      None
    );
    assert_eq!(
      view.cell_clicked(&ctx, 2023),
      vec![
        ViewEvent::YearSelected(ymd(2023, 1, 1)),
        ViewEvent::SelectedChange(ymd(
          2023, 2, 28
        ))
      ]
    );
  }

  #[test]
  fn keyboard_pages_and_rows() {
    let ctx = context();
    let mut view = MultiYearView::new(
      &ctx,
      &ymd(2024, 6, 1),
      None
    );
    view.handle_keydown(
      &ctx,
      KeyPress::plain(Key::Home)
    );
    assert_eq!(view.active_date(), &ymd(2016, 6, 1));
    view.handle_keydown(
      &ctx,
      KeyPress::plain(Key::End)
    );
    assert_eq!(view.active_date(), &ymd(2039, 6, 1));
    view.handle_keydown(
      &ctx,
      KeyPress::plain(Key::Down)
    );
    assert_eq!(view.active_date(), &ymd(2043, 6, 1));
    assert_eq!(view.years().first(), Some(&2040));
    view.handle_keydown(
      &ctx,
      KeyPress::alt(Key::PageUp)
    );
    assert_eq!(view.active_date(), &ymd(1803, 6, 1));
  }
}
