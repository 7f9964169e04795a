use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::{
  debug,
  info,
  warn
};

use crate::adapter::DateAdapter;
use crate::body::CalendarBody;
use crate::cell::{
  DateClass,
  DateFilter
};
use crate::events::{
  CalendarEvent,
  Emitter,
  ListenerId,
  ViewEvent
};
use crate::month_view::MonthView;
use crate::multi_year_view::MultiYearView;
use crate::panels::{
  CalendarHeader,
  CalendarPanel,
  DefaultHeader,
  EmptyPanel,
  PanelSlot,
  PeriodOrder,
  Shortcut
};
use crate::range::{
  Bound,
  RangeValue,
  SelectionMode,
  SelectionState
};
use crate::view::{
  CalendarView,
  KeyPress,
  ViewContext
};
use crate::year_view::YearView;

/// Snapshot sent to state-change
/// listeners.
#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct CalendarState<D> {
  pub view:        CalendarView,
  pub active_date: D
}

/// Construction options of a calendar.
pub struct CalendarOptions<A: DateAdapter> {
  pub start_at:           Option<A::Date>,
  pub start_view:         CalendarView,
  pub order_period_label: PeriodOrder,
  pub header:             Rc<dyn CalendarHeader<A>>,
  pub footer:             Rc<dyn CalendarPanel<A>>,
  pub presets:            Rc<dyn CalendarPanel<A>>
}

impl<A: DateAdapter> Default
  for CalendarOptions<A>
{
  fn default() -> Self {
    Self {
      start_at:           None,
      start_view:         CalendarView::Month,
      order_period_label: PeriodOrder::default(),
      header:             Rc::new(DefaultHeader),
      footer:             Rc::new(EmptyPanel),
      presets:            Rc::new(EmptyPanel)
    }
  }
}

/// The grid currently shown.
#[derive(Debug)]
pub enum ActiveView<A: DateAdapter> {
  Month(MonthView<A>),
  Year(YearView<A>),
  MultiYear(MultiYearView<A>)
}

impl<A: DateAdapter> ActiveView<A> {
  fn build(
    ctx: &ViewContext<A>,
    view: CalendarView,
    active_date: &A::Date,
    selection: &SelectionState<A::Date>
  ) -> Self {
    match view {
      | CalendarView::Month => {
        Self::Month(MonthView::new(
          ctx,
          active_date,
          selection.clone()
        ))
      }
      | CalendarView::Year => {
        Self::Year(YearView::new(
          ctx,
          active_date,
          selection.selected.clone()
        ))
      }
      | CalendarView::MultiYear => {
        Self::MultiYear(MultiYearView::new(
          ctx,
          active_date,
          selection.selected.clone()
        ))
      }
    }
  }

  pub fn body(&self) -> &CalendarBody {
    match self {
      | Self::Month(view) => view.body(),
      | Self::Year(view) => view.body(),
      | Self::MultiYear(view) => view.body()
    }
  }

  fn init(&mut self, ctx: &ViewContext<A>) {
    match self {
      | Self::Month(view) => view.init(ctx),
      | Self::Year(view) => view.init(ctx),
      | Self::MultiYear(view) => view.init(ctx)
    }
  }

  fn set_active_date(
    &mut self,
    ctx: &ViewContext<A>,
    date: &A::Date
  ) {
    match self {
      | Self::Month(view) => {
        view.set_active_date(ctx, date)
      }
      | Self::Year(view) => {
        view.set_active_date(ctx, date)
      }
      | Self::MultiYear(view) => {
        view.set_active_date(ctx, date)
      }
    }
  }

  fn set_selection(
    &mut self,
    ctx: &ViewContext<A>,
    selection: &SelectionState<A::Date>
  ) {
    match self {
      | Self::Month(view) => {
        view.set_selection(ctx, selection.clone())
      }
      | Self::Year(view) => view.set_selected(
        ctx,
        selection.selected.clone()
      ),
      | Self::MultiYear(view) => view
        .set_selected(
          ctx,
          selection.selected.clone()
        )
    }
  }

  fn cell_clicked(
    &mut self,
    ctx: &ViewContext<A>,
    value: u32
  ) -> Vec<ViewEvent<A::Date>> {
    match self {
      | Self::Month(view) => {
        view.cell_clicked(ctx, value)
      }
      | Self::Year(view) => {
        view.cell_clicked(ctx, value)
      }
      | Self::MultiYear(view) => {
        view.cell_clicked(ctx, value)
      }
    }
  }

  fn handle_keydown(
    &mut self,
    ctx: &ViewContext<A>,
    press: KeyPress
  ) -> Vec<ViewEvent<A::Date>> {
    match self {
      | Self::Month(view) => {
        view.handle_keydown(ctx, press)
      }
      | Self::Year(view) => {
        view.handle_keydown(ctx, press)
      }
      | Self::MultiYear(view) => {
        view.handle_keydown(ctx, press)
      }
    }
  }
}

/// Calendar controller: owns the active
/// date, the current view and the range
/// being built, and turns grid activity
/// into `CalendarEvent`s.
pub struct Calendar<A: DateAdapter> {
  ctx:                ViewContext<A>,
  selection:          SelectionState<A::Date>,
  active_date:        A::Date,
  current_view:       CalendarView,
  view:               ActiveView<A>,
  order_period_label: PeriodOrder,
  move_focus:         bool,
  header:             Rc<dyn CalendarHeader<A>>,
  footer:             Rc<dyn CalendarPanel<A>>,
  presets:            Rc<dyn CalendarPanel<A>>,
  state_changes:      Emitter<CalendarState<A::Date>>
}

impl<A> fmt::Debug for Calendar<A>
where
  A: DateAdapter + fmt::Debug
{
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("Calendar")
      .field("selection", &self.selection)
      .field("active_date", &self.active_date)
      .field("current_view", &self.current_view)
      .field("view", &self.view)
      .finish_non_exhaustive()
  }
}

impl<A: DateAdapter> Calendar<A> {
  #[tracing::instrument(
    skip_all,
    fields(
      mode = %ctx.selection_mode,
      start_view = %options.start_view
    )
  )]
  pub fn new(
    ctx: ViewContext<A>,
    selection: SelectionState<A::Date>,
    options: CalendarOptions<A>
  ) -> Self {
    let start = options
      .start_at
      .unwrap_or_else(|| ctx.adapter.today());
    let active_date = ctx.clamp(&start);
    let view = ActiveView::build(
      &ctx,
      options.start_view,
      &active_date,
      &selection
    );
    debug!(
      active = ?active_date,
      "calendar created"
    );
    Self {
      ctx,
      selection,
      active_date,
      current_view: options.start_view,
      view,
      order_period_label: options
        .order_period_label,
      move_focus: false,
      header: options.header,
      footer: options.footer,
      presets: options.presets,
      state_changes: Emitter::new()
    }
  }

  pub fn adapter(&self) -> &A {
    self.ctx.adapter.as_ref()
  }

  pub fn context(&self) -> &ViewContext<A> {
    &self.ctx
  }

  pub fn selection(
    &self
  ) -> &SelectionState<A::Date> {
    &self.selection
  }

  pub fn selection_mode(&self) -> SelectionMode {
    self.ctx.selection_mode
  }

  pub fn active_date(&self) -> &A::Date {
    &self.active_date
  }

  pub fn current_view(&self) -> CalendarView {
    self.current_view
  }

  pub fn view(&self) -> &ActiveView<A> {
    &self.view
  }

  pub fn body(&self) -> &CalendarBody {
    self.view.body()
  }

  pub fn month_view(
    &self
  ) -> Option<&MonthView<A>> {
    match &self.view {
      | ActiveView::Month(view) => Some(view),
      | _ => None
    }
  }

  pub fn min_date(&self) -> Option<&A::Date> {
    self.ctx.min.as_ref()
  }

  pub fn max_date(&self) -> Option<&A::Date> {
    self.ctx.max.as_ref()
  }

  pub fn order_period_label(
    &self
  ) -> PeriodOrder {
    self.order_period_label
  }

  pub fn begin_date_selected(
    &self
  ) -> Option<&A::Date> {
    self.selection.pending.as_ref()
  }

  pub fn subscribe_state_changes<F>(
    &mut self,
    listener: F
  ) -> ListenerId
  where
    F: FnMut(&CalendarState<A::Date>)
      + 'static
  {
    self.state_changes.subscribe(listener)
  }

  pub fn unsubscribe_state_changes(
    &mut self,
    id: ListenerId
  ) -> bool {
    self.state_changes.unsubscribe(id)
  }

  /// Moves the active date, clamped into
  /// `[min, max]`.
  pub fn set_active_date(
    &mut self,
    date: &A::Date
  ) {
    self.active_date = self.ctx.clamp(date);
    self
      .view
      .set_active_date(&self.ctx, &self.active_date);
    self.notify();
  }

  /// Switches the grid. Focus moves to the
  /// new grid on the next view check.
  pub fn set_current_view(
    &mut self,
    view: CalendarView
  ) {
    debug!(
      from = %self.current_view,
      to = %view,
      "switching calendar view"
    );
    self.current_view = view;
    self.view = ActiveView::build(
      &self.ctx,
      view,
      &self.active_date,
      &self.selection
    );
    self.move_focus = true;
    self.notify();
  }

  pub fn set_selection(
    &mut self,
    selection: SelectionState<A::Date>
  ) {
    self.selection = selection;
    self
      .view
      .set_selection(&self.ctx, &self.selection);
    self.notify();
  }

  pub fn set_selection_mode(
    &mut self,
    mode: SelectionMode
  ) {
    self.ctx.selection_mode = mode;
    self.reinit_view();
  }

  pub fn set_min_date(
    &mut self,
    min: Option<A::Date>
  ) {
    self.ctx.min = min;
    self.reinit_view();
  }

  pub fn set_max_date(
    &mut self,
    max: Option<A::Date>
  ) {
    self.ctx.max = max;
    self.reinit_view();
  }

  pub fn set_date_filter(
    &mut self,
    filter: Option<DateFilter<A::Date>>
  ) {
    self.ctx.filter = filter;
    self.reinit_view();
  }

  pub fn set_date_class(
    &mut self,
    date_class: Option<DateClass<A::Date>>
  ) {
    self.ctx.date_class = date_class;
    self.reinit_view();
  }

  /// Re-reads today's date into the grid.
  pub fn update_todays_date(&mut self) {
    self.view.init(&self.ctx);
  }

  /// Pending focus move requested by a
  /// view switch, consumed once.
  pub fn after_view_checked(
    &mut self
  ) -> Option<CalendarEvent<A::Date>> {
    if self.move_focus {
      self.move_focus = false;
      Some(CalendarEvent::FocusActiveCell)
    } else {
      None
    }
  }

  /// Label of the cell that should hold
  /// focus.
  pub fn active_cell_label(
    &self
  ) -> Option<String> {
    let body = self.view.body();
    body
      .rows()
      .iter()
      .enumerate()
      .flat_map(|(row, cells)| {
        cells
          .iter()
          .enumerate()
          .map(move |(col, cell)| {
            (row, col, cell)
          })
      })
      .find(|(row, col, _)| {
        body.is_active_cell(*row, *col)
      })
      .map(|(_, _, cell)| {
        cell.aria_label.clone()
      })
  }

  pub fn period_label(&self) -> String {
    let header = Rc::clone(&self.header);
    header.period_label(self)
  }

  pub fn period_clicked(&mut self) {
    let header = Rc::clone(&self.header);
    header.period_clicked(self);
  }

  pub fn previous_clicked(&mut self) {
    let header = Rc::clone(&self.header);
    header.previous_clicked(self);
  }

  pub fn next_clicked(&mut self) {
    let header = Rc::clone(&self.header);
    header.next_clicked(self);
  }

  pub fn previous_enabled(&self) -> bool {
    let header = Rc::clone(&self.header);
    header.previous_enabled(self)
  }

  pub fn next_enabled(&self) -> bool {
    let header = Rc::clone(&self.header);
    header.next_enabled(self)
  }

  pub fn cell_clicked(
    &mut self,
    value: u32
  ) -> Vec<CalendarEvent<A::Date>> {
    let events =
      self.view.cell_clicked(&self.ctx, value);
    self.dispatch(events)
  }

  pub fn hover_cell(&mut self, value: u32) {
    if let ActiveView::Month(view) =
      &mut self.view
    {
      view.hover(value);
    }
  }

  pub fn handle_keydown(
    &mut self,
    press: KeyPress
  ) -> Vec<CalendarEvent<A::Date>> {
    let events =
      self.view.handle_keydown(&self.ctx, press);
    self.dispatch(events)
  }

  /// Finalizes a day picked in the month
  /// view according to the selection mode.
  #[tracing::instrument(
    skip(self),
    fields(mode = %self.ctx.selection_mode)
  )]
  pub fn date_selected(
    &mut self,
    date: A::Date
  ) -> Vec<CalendarEvent<A::Date>> {
    let mut events = Vec::new();
    match self.ctx.selection_mode {
      | SelectionMode::Range => {
        match self.selection.pending.take() {
          | None => {
            self.selection.pending =
              Some(date.clone());
            self.selection.begin =
              Some(Bound::Date(date.clone()));
            self.selection.end =
              Some(Bound::Date(date.clone()));
            events.push(
              CalendarEvent::BeginDateSelected(
                date
              )
            );
          }
          | Some(begin) => {
            let range = RangeValue::ordered(
              self.adapter(),
              Bound::Date(begin),
              Bound::Date(date)
            );
            self.selection.begin =
              range.begin.clone();
            self.selection.end =
              range.end.clone();
            info!(range = ?range, "range completed");
            events.push(
              CalendarEvent::DateRangesChange(
                range
              )
            );
          }
        }
      }
      | SelectionMode::Since => {
        let range =
          RangeValue::since(date.clone());
        self.selection.pending = None;
        self.selection.begin =
          range.begin.clone();
        self.selection.end = range.end.clone();
        events.push(
          CalendarEvent::BeginDateSelected(date)
        );
        events.push(
          CalendarEvent::DateRangesChange(range)
        );
      }
      | SelectionMode::Until => {
        let range = RangeValue::until(date);
        self.selection.pending = None;
        self.selection.begin =
          range.begin.clone();
        self.selection.end = range.end.clone();
        events.push(
          CalendarEvent::DateRangesChange(range)
        );
      }
      | SelectionMode::Date => {
        if !self.adapter().same_date(
          Some(&date),
          self.selection.selected.as_ref()
        ) {
          events.push(
            CalendarEvent::SelectedChange(date)
          );
        }
      }
    }
    self
      .view
      .set_selection(&self.ctx, &self.selection);
    self.notify();
    events
  }

  /// Makes `date` active and shows it in
  /// `view`.
  pub fn go_to_date_in_view(
    &mut self,
    date: &A::Date,
    view: CalendarView
  ) {
    self.active_date = self.ctx.clamp(date);
    self.set_current_view(view);
  }

  pub fn shortcuts(
    &self,
    slot: PanelSlot
  ) -> Vec<Shortcut<A::Date>> {
    let panel = match slot {
      | PanelSlot::Footer => &self.footer,
      | PanelSlot::Presets => &self.presets
    };
    panel.shortcuts(self.adapter())
  }

  /// Applies the shortcut `key` of a panel
  /// as the selected range and asks the
  /// picker to close.
  pub fn apply_shortcut(
    &mut self,
    slot: PanelSlot,
    key: &str
  ) -> Vec<CalendarEvent<A::Date>> {
    let Some(shortcut) = self
      .shortcuts(slot)
      .into_iter()
      .find(|shortcut| shortcut.key == key)
    else {
      warn!(?slot, key, "unknown shortcut");
      return Vec::new();
    };

    let range = shortcut.range;
    self.selection.pending = None;
    self.selection.begin = range.begin.clone();
    self.selection.end = range.end.clone();
    self
      .view
      .set_selection(&self.ctx, &self.selection);

    let mut events = Vec::new();
    if let Some(begin) = range.begin_date() {
      let begin = begin.clone();
      self.set_active_date(&begin);
      events.push(
        CalendarEvent::BeginDateSelected(begin)
      );
    }
    info!(key, "applied range shortcut");
    events.push(
      CalendarEvent::DateRangesChange(range)
    );
    events.push(CalendarEvent::ClosePicker);
    events
  }

  fn dispatch(
    &mut self,
    events: Vec<ViewEvent<A::Date>>
  ) -> Vec<CalendarEvent<A::Date>> {
    let mut out = Vec::new();
    for event in events {
      match (self.current_view, event) {
        | (_, ViewEvent::UserSelection) => {
          out.push(CalendarEvent::UserSelection)
        }
        | (_, ViewEvent::FocusActiveCell) => {
          out.push(CalendarEvent::FocusActiveCell)
        }
        | (_, ViewEvent::ActiveDateChange(date)) => {
          self.active_date = self.ctx.clamp(&date);
          self.notify();
        }
        | (_, ViewEvent::MonthSelected(date)) => {
          out.push(CalendarEvent::MonthSelected(date))
        }
        | (_, ViewEvent::YearSelected(date)) => {
          out.push(CalendarEvent::YearSelected(date))
        }
        | (
          CalendarView::Month,
          ViewEvent::SelectedChange(date)
        ) => out.extend(self.date_selected(date)),
        | (
          CalendarView::Year,
          ViewEvent::SelectedChange(date)
        ) => self.go_to_date_in_view(
          &date,
          CalendarView::Month
        ),
        | (
          CalendarView::MultiYear,
          ViewEvent::SelectedChange(date)
        ) => self.go_to_date_in_view(
          &date,
          CalendarView::Year
        )
      }
    }
    out
  }

  fn reinit_view(&mut self) {
    self.view.init(&self.ctx);
    self.notify();
  }

  fn notify(&mut self) {
    let state = CalendarState {
      view:        self.current_view,
      active_date: self.active_date.clone()
    };
    self.state_changes.emit(&state);
  }
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;
  use std::rc::Rc;

  use chrono::NaiveDate;

  use super::{
    Calendar,
    CalendarOptions
  };
  use crate::adapter::{
    DateFormats,
    NativeDateAdapter
  };
  use crate::events::CalendarEvent;
  use crate::panels::{
    PanelSlot,
    PeriodOrder,
    RangeShortcuts
  };
  use crate::range::{
    Bound,
    RangeValue,
    SelectionMode,
    SelectionState
  };
  use crate::view::{
    CalendarView,
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

  fn calendar_at(
    date: NaiveDate,
    mode: SelectionMode
  ) -> Calendar<NativeDateAdapter> {
    let mut ctx = ViewContext::new(
      Rc::new(NativeDateAdapter::default()),
      Rc::new(DateFormats::default())
    );
    ctx.selection_mode = mode;
    Calendar::new(
      ctx,
      SelectionState::default(),
      CalendarOptions {
        start_at: Some(date),
        ..CalendarOptions::default()
      }
    )
  }

  #[test]
  fn two_clicks_complete_a_range() {
    let mut calendar = calendar_at(
      ymd(2024, 1, 1),
      SelectionMode::Range
    );

    let first = calendar.cell_clicked(5);
    assert_eq!(
      first[0],
      CalendarEvent::BeginDateSelected(ymd(
        2024, 1, 5
      ))
    );
    assert_eq!(
      calendar.begin_date_selected(),
      Some(&ymd(2024, 1, 5))
    );

    let second = calendar.cell_clicked(20);
    assert!(second.contains(
      &CalendarEvent::DateRangesChange(
        RangeValue::new(
          Some(Bound::Date(ymd(2024, 1, 5))),
          Some(Bound::Date(ymd(2024, 1, 20)))
        )
      )
    ));
    assert!(
      second.contains(&CalendarEvent::UserSelection)
    );
    assert_eq!(calendar.begin_date_selected(), None);
    assert!(
      calendar.body().is_semi_selected(10)
    );
  }

  #[test]
  fn reversed_clicks_are_swapped() {
    let mut calendar = calendar_at(
      ymd(2024, 1, 1),
      SelectionMode::Range
    );
    calendar.cell_clicked(20);
    let events = calendar.cell_clicked(5);
    assert!(events.contains(
      &CalendarEvent::DateRangesChange(
        RangeValue::new(
          Some(Bound::Date(ymd(2024, 1, 5))),
          Some(Bound::Date(ymd(2024, 1, 20)))
        )
      )
    ));
  }

  #[test]
  fn single_endpoint_modes_finalize_immediately()
  {
    let mut since = calendar_at(
      ymd(2024, 1, 1),
      SelectionMode::Since
    );
    let events = since.cell_clicked(9);
    assert_eq!(
      events[..2],
      [
        CalendarEvent::BeginDateSelected(ymd(
          2024, 1, 9
        )),
        CalendarEvent::DateRangesChange(
          RangeValue::since(ymd(2024, 1, 9))
        )
      ]
    );
    assert!(events.contains(&CalendarEvent::UserSelection));

    let mut until = calendar_at(
      ymd(2024, 1, 1),
      SelectionMode::Until
    );
    let events = until.cell_clicked(9);
    assert_eq!(
      events[0],
      CalendarEvent::DateRangesChange(
        RangeValue::until(ymd(2024, 1, 9))
      )
    );
  }

  #[test]
  fn next_and_previous_roll_over_years() {
    let mut calendar = calendar_at(
      ymd(2024, 12, 15),
      SelectionMode::Date
    );
    assert_eq!(calendar.period_label(), "DEC 2024");
    calendar.next_clicked();
    assert_eq!(
      calendar.active_date(),
      &ymd(2025, 1, 15)
    );
    assert_eq!(calendar.period_label(), "JAN 2025");
    calendar.previous_clicked();
    assert_eq!(
      calendar.active_date(),
      &ymd(2024, 12, 15)
    );
  }

  #[test]
  fn bounds_disable_navigation_buttons() {
    let mut calendar = calendar_at(
      ymd(2024, 1, 15),
      SelectionMode::Date
    );
    calendar.set_min_date(Some(ymd(2024, 1, 3)));
    calendar.set_max_date(Some(ymd(2024, 3, 3)));
    assert!(!calendar.previous_enabled());
    assert!(calendar.next_enabled());
    calendar.next_clicked();
    calendar.next_clicked();
    assert!(!calendar.next_enabled());
    calendar.next_clicked();
    assert_eq!(
      calendar.active_date(),
      &ymd(2024, 3, 3)
    );
  }

  #[test]
  fn period_button_follows_order() {
    let mut calendar = calendar_at(
      ymd(2024, 6, 1),
      SelectionMode::Date
    );
    calendar.period_clicked();
    assert_eq!(
      calendar.current_view(),
      CalendarView::MultiYear
    );
    assert_eq!(
      calendar.period_label(),
      "2016 \u{2013} 2039"
    );
    assert_eq!(
      calendar.after_view_checked(),
      Some(CalendarEvent::FocusActiveCell)
    );
    assert_eq!(calendar.after_view_checked(), None);

    let mut ctx = calendar.context().clone();
    ctx.selection_mode = SelectionMode::Date;
    let mut month_first = Calendar::new(
      ctx,
      SelectionState::default(),
      CalendarOptions {
        start_at: Some(ymd(2024, 6, 1)),
        order_period_label: PeriodOrder::Month,
        ..CalendarOptions::default()
      }
    );
    month_first.period_clicked();
    assert_eq!(
      month_first.current_view(),
      CalendarView::Year
    );
    assert_eq!(month_first.period_label(), "2024");
  }

  #[test]
  fn drilling_down_from_multi_year() {
    let mut calendar = calendar_at(
      ymd(2024, 3, 31),
      SelectionMode::Date
    );
    calendar.set_current_view(CalendarView::MultiYear);

    let events = calendar.cell_clicked(2023);
    assert_eq!(
      events,
      vec![CalendarEvent::YearSelected(ymd(
        2023, 1, 1
      ))]
    );
    assert_eq!(calendar.current_view(), CalendarView::Year);
    assert_eq!(
      calendar.active_date(),
      &ymd(2023, 3, 31)
    );

    let events = calendar.cell_clicked(2);
    assert_eq!(
      events,
      vec![CalendarEvent::MonthSelected(ymd(
        2023, 2, 1
      ))]
    );
    assert_eq!(calendar.current_view(), CalendarView::Month);
    assert_eq!(
      calendar.active_date(),
      &ymd(2023, 2, 28)
    );
  }

  #[test]
  fn keyboard_changes_reach_state_listeners() {
    let mut calendar = calendar_at(
      ymd(2024, 1, 10),
      SelectionMode::Date
    );
    let hits = Rc::new(Cell::new(0));
    {
      let hits = Rc::clone(&hits);
      calendar.subscribe_state_changes(move |_| {
        hits.set(hits.get() + 1);
      });
    }
    let events = calendar
      .handle_keydown(KeyPress::plain(Key::Right));
    assert_eq!(
      events,
      vec![CalendarEvent::FocusActiveCell]
    );
    assert_eq!(
      calendar.active_date(),
      &ymd(2024, 1, 11)
    );
    assert_eq!(hits.get(), 1);
  }

  #[test]
  fn shortcut_sets_range_and_closes() {
    let mut ctx = ViewContext::new(
      Rc::new(NativeDateAdapter::default()),
      Rc::new(DateFormats::default())
    );
    ctx.selection_mode = SelectionMode::Range;
    let mut calendar = Calendar::new(
      ctx,
      SelectionState::default(),
      CalendarOptions {
        footer: Rc::new(RangeShortcuts),
        ..CalendarOptions::default()
      }
    );
    assert_eq!(
      calendar.shortcuts(PanelSlot::Footer).len(),
      2
    );
    assert!(
      calendar
        .shortcuts(PanelSlot::Presets)
        .is_empty()
    );

    let events = calendar
      .apply_shortcut(PanelSlot::Footer, "today");
    assert_eq!(events.len(), 3);
    assert_eq!(
      events.last(),
      Some(&CalendarEvent::ClosePicker)
    );
    assert!(
      calendar
        .apply_shortcut(PanelSlot::Footer, "lastYear")
        .is_empty()
    );
  }
}
