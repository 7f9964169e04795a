//! Pluggable calendar slots: the header
//! above the grid and the footer/presets
//! panels offering range shortcuts.

use serde::{
  Deserialize,
  Serialize
};

use crate::adapter::DateAdapter;
use crate::calendar::Calendar;
use crate::multi_year_view::{
  page_start,
  same_page
};
use crate::range::{
  Bound,
  RangeValue
};
use crate::view::{
  CalendarView,
  DAYS_PER_WEEK,
  YEARS_PER_PAGE
};

/// Order in which the period button walks
/// through the views.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum PeriodOrder {
  /// month, year, multi-year, month
  Month,
  /// month, multi-year, month
  #[default]
  MultiYear
}

impl PeriodOrder {
  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    match key.trim() {
      | "month" => Some(Self::Month),
      | "multi-year" | "multi_year" => {
        Some(Self::MultiYear)
      }
      | _ => None
    }
  }

  pub fn next_view(
    self,
    current: CalendarView
  ) -> CalendarView {
    match (current, self) {
      | (CalendarView::Month, Self::Month) => {
        CalendarView::Year
      }
      | (
        CalendarView::Month,
        Self::MultiYear
      ) => CalendarView::MultiYear,
      | (CalendarView::Year, Self::Month) => {
        CalendarView::MultiYear
      }
      | (CalendarView::Year, Self::MultiYear)
      | (CalendarView::MultiYear, _) => {
        CalendarView::Month
      }
    }
  }
}

/// Header strategy: period label and the
/// previous/next/period buttons.
pub trait CalendarHeader<A: DateAdapter> {
  fn period_label(
    &self,
    calendar: &Calendar<A>
  ) -> String;

  fn period_clicked(
    &self,
    calendar: &mut Calendar<A>
  );

  fn previous_clicked(
    &self,
    calendar: &mut Calendar<A>
  );

  fn next_clicked(
    &self,
    calendar: &mut Calendar<A>
  );

  fn previous_enabled(
    &self,
    calendar: &Calendar<A>
  ) -> bool;

  fn next_enabled(
    &self,
    calendar: &Calendar<A>
  ) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHeader;

impl DefaultHeader {
  fn step<A: DateAdapter>(
    calendar: &mut Calendar<A>,
    direction: i32
  ) {
    let adapter = calendar.adapter();
    let active = calendar.active_date().clone();
    let next = match calendar.current_view() {
      | CalendarView::Month => adapter
        .add_calendar_months(&active, direction),
      | CalendarView::Year => adapter
        .add_calendar_years(&active, direction),
      | CalendarView::MultiYear => adapter
        .add_calendar_years(
          &active,
          direction * YEARS_PER_PAGE
        )
    };
    calendar.set_active_date(&next);
  }

  fn is_same_view<A: DateAdapter>(
    calendar: &Calendar<A>,
    first: &A::Date,
    second: &A::Date
  ) -> bool {
    let adapter = calendar.adapter();
    let same_year = adapter.get_year(first)
      == adapter.get_year(second);
    match calendar.current_view() {
      | CalendarView::Month => {
        same_year
          && adapter.get_month(first)
            == adapter.get_month(second)
      }
      | CalendarView::Year => same_year,
      | CalendarView::MultiYear => same_page(
        adapter.get_year(first),
        adapter.get_year(second)
      )
    }
  }
}

impl<A: DateAdapter> CalendarHeader<A>
  for DefaultHeader
{
  fn period_label(
    &self,
    calendar: &Calendar<A>
  ) -> String {
    let adapter = calendar.adapter();
    let active = calendar.active_date();
    match calendar.current_view() {
      | CalendarView::Month => calendar
        .context()
        .format_or_iso(
          active,
          &calendar
            .context()
            .formats
            .month_year_label
        )
        .to_uppercase(),
      | CalendarView::Year => {
        adapter.get_year_name(active)
      }
      | CalendarView::MultiYear => {
        let first =
          page_start(adapter.get_year(active));
        let last = first + YEARS_PER_PAGE - 1;
        let name = |year: i32| {
          adapter
            .create_date(year, 1, 1)
            .map(|date| {
              adapter.get_year_name(&date)
            })
            .unwrap_or_else(|_| year.to_string())
        };
        format!(
          "{} \u{2013} {}",
          name(first),
          name(last)
        )
      }
    }
  }

  fn period_clicked(
    &self,
    calendar: &mut Calendar<A>
  ) {
    let next = calendar
      .order_period_label()
      .next_view(calendar.current_view());
    calendar.set_current_view(next);
  }

  fn previous_clicked(
    &self,
    calendar: &mut Calendar<A>
  ) {
    Self::step(calendar, -1);
  }

  fn next_clicked(
    &self,
    calendar: &mut Calendar<A>
  ) {
    Self::step(calendar, 1);
  }

  fn previous_enabled(
    &self,
    calendar: &Calendar<A>
  ) -> bool {
    calendar.min_date().is_none_or(|min| {
      !Self::is_same_view(
        calendar,
        calendar.active_date(),
        min
      )
    })
  }

  fn next_enabled(
    &self,
    calendar: &Calendar<A>
  ) -> bool {
    calendar.max_date().is_none_or(|max| {
      !Self::is_same_view(
        calendar,
        calendar.active_date(),
        max
      )
    })
  }
}

/// Which panel a shortcut came from.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PanelSlot {
  Footer,
  Presets
}

/// A named range a panel offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut<D> {
  pub key:   String,
  pub label: String,
  pub range: RangeValue<D>
}

/// Footer or presets strategy.
pub trait CalendarPanel<A: DateAdapter> {
  fn shortcuts(
    &self,
    adapter: &A
  ) -> Vec<Shortcut<A::Date>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyPanel;

impl<A: DateAdapter> CalendarPanel<A>
  for EmptyPanel
{
  fn shortcuts(
    &self,
    _adapter: &A
  ) -> Vec<Shortcut<A::Date>> {
    Vec::new()
  }
}

/// "Today" and "This week", the week
/// starting on the locale's first day.
#[derive(Debug, Default, Clone, Copy)]
pub struct RangeShortcuts;

impl<A: DateAdapter> CalendarPanel<A>
  for RangeShortcuts
{
  fn shortcuts(
    &self,
    adapter: &A
  ) -> Vec<Shortcut<A::Date>> {
    let today = adapter.today();
    let first_day = adapter
      .get_first_day_of_week()
      % DAYS_PER_WEEK;
    let back = (DAYS_PER_WEEK
      + adapter.get_day_of_week(&today)
      - first_day)
      % DAYS_PER_WEEK;
    let week_start = adapter
      .add_calendar_days(&today, -i64::from(back));
    let week_end = adapter.add_calendar_days(
      &week_start,
      i64::from(DAYS_PER_WEEK) - 1
    );

    vec![
      Shortcut {
        key:   "today".to_string(),
        label: "Today".to_string(),
        range: RangeValue::single_day(today)
      },
      Shortcut {
        key:   "thisWeek".to_string(),
        label: "This Week".to_string(),
        range: RangeValue::new(
          Some(Bound::Date(week_start)),
          Some(Bound::Date(week_end))
        )
      },
    ]
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    Datelike,
    Weekday
  };

  use super::{
    CalendarPanel,
    PeriodOrder,
    RangeShortcuts
  };
  use crate::adapter::NativeDateAdapter;
  use crate::view::CalendarView;

  #[test]
  fn period_orders_cycle_views() {
    let month_first = PeriodOrder::Month;
    assert_eq!(
      month_first.next_view(CalendarView::Month),
      CalendarView::Year
    );
    assert_eq!(
      month_first.next_view(CalendarView::Year),
      CalendarView::MultiYear
    );
    assert_eq!(
      month_first
        .next_view(CalendarView::MultiYear),
      CalendarView::Month
    );

    let default = PeriodOrder::default();
    assert_eq!(
      default.next_view(CalendarView::Month),
      CalendarView::MultiYear
    );
    assert_eq!(
      default.next_view(CalendarView::Year),
      CalendarView::Month
    );
    assert_eq!(
      default.next_view(CalendarView::MultiYear),
      CalendarView::Month
    );
  }

  #[test]
  fn this_week_starts_on_locale_first_day() {
    let adapter = NativeDateAdapter::new("de-DE");
    let shortcuts = adapter_shortcuts(&adapter);
    let week = &shortcuts[1].range;
    let begin = week.begin_date().expect("begin");
    let end = week.end_date().expect("end");
    assert_eq!(begin.weekday(), Weekday::Mon);
    assert_eq!(end.weekday(), Weekday::Sun);
    assert_eq!((*end - *begin).num_days(), 6);

    let us = NativeDateAdapter::new("en-US");
    let shortcuts = adapter_shortcuts(&us);
    assert_eq!(
      shortcuts[1]
        .range
        .begin_date()
        .expect("begin")
        .weekday(),
      Weekday::Sun
    );
    assert_eq!(shortcuts[0].key, "today");
  }

  fn adapter_shortcuts(
    adapter: &NativeDateAdapter
  ) -> Vec<super::Shortcut<chrono::NaiveDate>> {
    RangeShortcuts.shortcuts(adapter)
  }
}
