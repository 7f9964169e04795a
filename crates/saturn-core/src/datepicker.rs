//! Datepicker controller: owns the form
//! value and the selection mode, opens and
//! closes the calendar and reports to the
//! host through `PickerEvent`s.

use std::fmt;
use std::rc::Rc;

use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::adapter::{
  DateAdapter,
  DateFormats
};
use crate::calendar::{
  Calendar,
  CalendarOptions
};
use crate::cell::{
  DateClass,
  DateFilter
};
use crate::error::PickerError;
use crate::events::{
  CalendarEvent,
  Emitter,
  ListenerId,
  PickerEvent
};
use crate::focus::{
  DetachedFocus,
  ElementId,
  FocusHost,
  FocusOutcome
};
use crate::input::{
  DatepickerInput,
  InputEvent
};
use crate::panels::{
  CalendarHeader,
  CalendarPanel,
  DefaultHeader,
  EmptyPanel,
  PanelSlot,
  PeriodOrder
};
use crate::range::{
  Bound,
  PickerValue,
  RangeValue,
  RawValue,
  SelectionMode,
  SelectionState,
  same_bound
};
use crate::scheduler::{
  Phase,
  UiTask,
  UiTaskQueue
};
use crate::view::{
  CalendarView,
  Key,
  KeyPress,
  ViewContext
};

/// How the calendar is shown while open.
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
pub enum Presentation {
  Popup,
  Dialog
}

/// Host-side reasons to close.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum DismissReason {
  BackdropClick,
  Escape,
  AltUp,
  DialogClosed,
  Detached
}

/// Everything a picker is configured
/// with. Callbacks and slot strategies
/// are code-only.
pub struct PickerOptions<A: DateAdapter> {
  pub initial_selection_mode:     Option<SelectionMode>,
  pub selection_modes:            Vec<SelectionMode>,
  pub start_at:                   Option<A::Date>,
  pub start_view:                 CalendarView,
  pub min:                        Option<A::Date>,
  pub max:                        Option<A::Date>,
  pub date_filter:                Option<DateFilter<A::Date>>,
  pub date_class:                 Option<DateClass<A::Date>>,
  pub close_after_selection:      bool,
  pub select_first_date_on_close: bool,
  pub range_hover_effect:         bool,
  pub touch_ui:                   bool,
  pub rtl:                        bool,
  pub order_period_label:         PeriodOrder,
  pub formats:                    DateFormats,
  pub header:                     Rc<dyn CalendarHeader<A>>,
  pub footer:                     Rc<dyn CalendarPanel<A>>,
  pub presets:                    Rc<dyn CalendarPanel<A>>
}

impl<A: DateAdapter> Default for PickerOptions<A> {
  fn default() -> Self {
    Self {
      initial_selection_mode:     None,
      selection_modes:            SelectionMode::all().to_vec(),
      start_at:                   None,
      start_view:                 CalendarView::Month,
      min:                        None,
      max:                        None,
      date_filter:                None,
      date_class:                 None,
      close_after_selection:      true,
      select_first_date_on_close: false,
      range_hover_effect:         true,
      touch_ui:                   false,
      rtl:                        false,
      order_period_label:         PeriodOrder::default(),
      formats:                    DateFormats::default(),
      header:                     Rc::new(DefaultHeader),
      footer:                     Rc::new(EmptyPanel),
      presets:                    Rc::new(EmptyPanel)
    }
  }
}

impl<A> fmt::Debug for PickerOptions<A>
where
  A: DateAdapter
{
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("PickerOptions")
      .field(
        "initial_selection_mode",
        &self.initial_selection_mode
      )
      .field("selection_modes", &self.selection_modes)
      .field("start_at", &self.start_at)
      .field("start_view", &self.start_view)
      .field("min", &self.min)
      .field("max", &self.max)
      .field(
        "close_after_selection",
        &self.close_after_selection
      )
      .field(
        "select_first_date_on_close",
        &self.select_first_date_on_close
      )
      .field("touch_ui", &self.touch_ui)
      .field("rtl", &self.rtl)
      .field("formats", &self.formats)
      .finish_non_exhaustive()
  }
}

/// Keeps the known modes in first-seen
/// order.
pub fn dedup_modes(
  modes: impl IntoIterator<Item = SelectionMode>
) -> Vec<SelectionMode> {
  let mut kept = Vec::new();
  for mode in modes {
    if !kept.contains(&mode) {
      kept.push(mode);
    }
  }
  kept
}

pub struct Datepicker<A, F = DetachedFocus>
where
  A: DateAdapter,
  F: FocusHost
{
  adapter:             Rc<A>,
  formats:             Rc<DateFormats>,
  options:             PickerOptions<A>,
  selection_mode:      SelectionMode,
  selected:            Option<A::Date>,
  begin_date:          Option<Bound<A::Date>>,
  end_date:            Option<Bound<A::Date>>,
  begin_date_selected: Option<A::Date>,
  input:               Option<DatepickerInput<A>>,
  calendar:            Option<Calendar<A>>,
  presentation:        Option<Presentation>,
  opened:              bool,
  closing:             bool,
  disabled:            Option<bool>,
  focus:               F,
  focused_before_open: Option<ElementId>,
  tasks:               UiTaskQueue,
  events:              Emitter<PickerEvent<A::Date>>
}

impl<A, F> fmt::Debug for Datepicker<A, F>
where
  A: DateAdapter + fmt::Debug,
  F: FocusHost + fmt::Debug
{
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("Datepicker")
      .field("selection_mode", &self.selection_mode)
      .field("selected", &self.selected)
      .field("begin_date", &self.begin_date)
      .field("end_date", &self.end_date)
      .field("input", &self.input)
      .field("calendar", &self.calendar)
      .field("opened", &self.opened)
      .field("focus", &self.focus)
      .field("tasks", &self.tasks)
      .finish_non_exhaustive()
  }
}

impl<A, F> Datepicker<A, F>
where
  A: DateAdapter,
  F: FocusHost
{
  pub fn new(
    adapter: Rc<A>,
    mut options: PickerOptions<A>,
    focus: F
  ) -> Self {
    options.selection_modes =
      dedup_modes(options.selection_modes);
    let formats =
      Rc::new(options.formats.clone());
    let selection_mode = options
      .initial_selection_mode
      .unwrap_or(SelectionMode::Date);
    Self {
      adapter,
      formats,
      options,
      selection_mode,
      selected: None,
      begin_date: None,
      end_date: None,
      begin_date_selected: None,
      input: None,
      calendar: None,
      presentation: None,
      opened: false,
      closing: false,
      disabled: None,
      focus,
      focused_before_open: None,
      tasks: UiTaskQueue::new(),
      events: Emitter::new()
    }
  }

  /// A fresh input sharing this picker's
  /// adapter and formats.
  pub fn new_input(&self) -> DatepickerInput<A> {
    DatepickerInput::new(
      Rc::clone(&self.adapter),
      Rc::clone(&self.formats)
    )
  }

  pub fn adapter(&self) -> &A {
    self.adapter.as_ref()
  }

  pub fn options(&self) -> &PickerOptions<A> {
    &self.options
  }

  pub fn input(
    &self
  ) -> Option<&DatepickerInput<A>> {
    self.input.as_ref()
  }

  pub fn calendar(&self) -> Option<&Calendar<A>> {
    self.calendar.as_ref()
  }

  /// Header navigation and view switches.
  /// Selections go through the picker.
  pub fn calendar_mut(
    &mut self
  ) -> Option<&mut Calendar<A>> {
    self.calendar.as_mut()
  }

  pub fn focus_host(&self) -> &F {
    &self.focus
  }

  pub fn focus_host_mut(&mut self) -> &mut F {
    &mut self.focus
  }

  pub fn is_opened(&self) -> bool {
    self.opened
  }

  pub fn presentation(
    &self
  ) -> Option<Presentation> {
    self.presentation
  }

  pub fn selection_mode(&self) -> SelectionMode {
    self.selection_mode
  }

  pub fn selection_modes(
    &self
  ) -> &[SelectionMode] {
    &self.options.selection_modes
  }

  pub fn selected(&self) -> Option<&A::Date> {
    self.selected.as_ref()
  }

  pub fn begin_date(
    &self
  ) -> Option<&Bound<A::Date>> {
    self.begin_date.as_ref()
  }

  pub fn end_date(
    &self
  ) -> Option<&Bound<A::Date>> {
    self.end_date.as_ref()
  }

  pub fn begin_date_selected(
    &self
  ) -> Option<&A::Date> {
    self.begin_date_selected.as_ref()
  }

  pub fn pending_tasks(&self) -> &UiTaskQueue {
    &self.tasks
  }

  /// Explicit flag, else the input's.
  pub fn is_disabled(&self) -> bool {
    self.disabled.unwrap_or_else(|| {
      self
        .input
        .as_ref()
        .is_some_and(DatepickerInput::is_disabled)
    })
  }

  pub fn set_disabled(&mut self, disabled: bool) {
    self.disabled = Some(disabled);
  }

  pub fn subscribe<L>(
    &mut self,
    listener: L
  ) -> ListenerId
  where
    L: FnMut(&PickerEvent<A::Date>) + 'static
  {
    self.events.subscribe(listener)
  }

  pub fn unsubscribe(
    &mut self,
    id: ListenerId
  ) -> bool {
    self.events.unsubscribe(id)
  }

  pub fn set_selection_modes(
    &mut self,
    modes: impl IntoIterator<Item = SelectionMode>
  ) {
    self.options.selection_modes = dedup_modes(modes);
  }

  /// Switches mode explicitly; the mode must
  /// be one of the permitted ones.
  pub fn set_selection_mode(
    &mut self,
    mode: SelectionMode
  ) -> Result<(), PickerError> {
    if !self.options.selection_modes.is_empty()
      && !self.options.selection_modes.contains(&mode)
    {
      return Err(PickerError::ModeNotPermitted {
        mode: mode.to_string()
      });
    }
    self.apply_mode(mode);
    Ok(())
  }

  fn apply_mode(&mut self, mode: SelectionMode) {
    if self.selection_mode != mode {
      debug!(
        from = %self.selection_mode,
        to = %mode,
        "selection mode changed"
      );
      self.selection_mode = mode;
    }
    if let Some(input) = self.input.as_mut() {
      input.set_selection_mode(mode);
    }
    if let Some(calendar) = self.calendar.as_mut() {
      calendar.set_selection_mode(mode);
    }
  }

  /// Binds the text input. A picker takes
  /// one input for its lifetime.
  pub fn register_input(
    &mut self,
    mut input: DatepickerInput<A>
  ) -> Result<(), PickerError> {
    if self.input.is_some() {
      return Err(PickerError::InputAlreadyBound);
    }
    if self.options.min.is_some() {
      input.set_min(self.options.min.clone());
    }
    if self.options.max.is_some() {
      input.set_max(self.options.max.clone());
    }
    if self.options.date_filter.is_some() {
      input.set_date_filter(
        self.options.date_filter.clone()
      );
    }
    input.set_selection_mode(self.selection_mode);
    let value = input.value().cloned();
    self.input = Some(input);
    if value.is_some() {
      self.input_value_changed(value.as_ref());
    }
    debug!(mode = %self.selection_mode, "input registered");
    Ok(())
  }

  // Re-derives the mode and the selection
  // from a new input value.
  fn input_value_changed(
    &mut self,
    value: Option<&PickerValue<A::Date>>
  ) {
    let Some(value) = value else {
      self.begin_date = None;
      self.end_date = None;
      self.selected = None;
      self.sync_calendar();
      return;
    };
    let mode = SelectionMode::infer(value);
    if !self.options.selection_modes.is_empty()
      && !self.options.selection_modes.contains(&mode)
    {
      warn!(
        %mode,
        "value implies a mode that is not \
         permitted"
      );
    }
    match value {
      | PickerValue::Range(range) => {
        if range.is_complete() {
          self.begin_date = range.begin.clone();
          self.end_date = range.end.clone();
        } else {
          self.begin_date = None;
          self.end_date = None;
        }
      }
      | PickerValue::Date(date) => {
        self.selected = Some(date.clone());
      }
    }
    self.apply_mode(mode);
    self.sync_calendar();
  }

  fn sync_calendar(&mut self) {
    let selection = self.selection_state();
    if let Some(calendar) = self.calendar.as_mut() {
      calendar.set_selection(selection);
    }
  }

  fn selection_state(
    &self
  ) -> SelectionState<A::Date> {
    SelectionState {
      selected: self.selected.clone(),
      begin:    self.begin_date.clone(),
      end:      self.end_date.clone(),
      pending:  self.begin_date_selected.clone()
    }
  }

  fn handle_input_events(
    &mut self,
    events: Vec<InputEvent<A::Date>>,
    typed: bool
  ) -> Result<(), PickerError> {
    for event in events {
      match event {
        | InputEvent::ValueChange(value) => {
          self.input_value_changed(value.as_ref());
          if typed {
            self.events.emit(
              &PickerEvent::ValueChanged(value)
            );
          }
        }
        | InputEvent::DateInput(value) => {
          self.events.emit(
            &PickerEvent::DateInput(value)
          );
        }
        | InputEvent::DateChange(value) => {
          self.events.emit(
            &PickerEvent::DateChange(value)
          );
        }
        | InputEvent::DisabledChange(disabled) => {
          debug!(disabled, "input disabled state changed");
        }
        | InputEvent::OpenRequested => self.open()?
      }
    }
    Ok(())
  }

  fn input_mut(
    &mut self
  ) -> Result<&mut DatepickerInput<A>, PickerError> {
    self.input.as_mut().ok_or(PickerError::NoInput)
  }

  /// Programmatic write of the form value.
  pub fn write_value(
    &mut self,
    value: Option<PickerValue<A::Date>>
  ) -> Result<(), PickerError> {
    let events = self.input_mut()?.set_value(value);
    self.handle_input_events(events, false)
  }

  /// Write of a serialized form value.
  pub fn write_raw(
    &mut self,
    raw: Option<&RawValue>
  ) -> Result<(), PickerError> {
    let events = self.input_mut()?.write_raw(raw);
    self.handle_input_events(events, false)
  }

  /// Text typed into the input.
  pub fn type_text(
    &mut self,
    text: &str
  ) -> Result<(), PickerError> {
    let events = self.input_mut()?.on_input(text);
    self.handle_input_events(events, true)
  }

  /// Text committed in the input.
  pub fn commit_text(
    &mut self
  ) -> Result<(), PickerError> {
    let events = self.input_mut()?.on_change();
    self.handle_input_events(events, false)
  }

  pub fn blur_input(
    &mut self
  ) -> Result<(), PickerError> {
    self.input_mut()?.on_blur();
    Ok(())
  }

  pub fn input_keydown(
    &mut self,
    press: KeyPress
  ) -> Result<(), PickerError> {
    let events = self.input_mut()?.on_keydown(press);
    self.handle_input_events(events, false)
  }

  pub fn set_input_disabled(
    &mut self,
    disabled: bool
  ) -> Result<(), PickerError> {
    let events =
      self.input_mut()?.set_disabled(disabled);
    self.handle_input_events(events, false)
  }

  pub fn set_min_date(
    &mut self,
    min: Option<A::Date>
  ) -> Result<(), PickerError> {
    self.input_mut()?.set_min(min.clone());
    if let Some(calendar) = self.calendar.as_mut() {
      calendar.set_min_date(min);
    }
    Ok(())
  }

  pub fn set_max_date(
    &mut self,
    max: Option<A::Date>
  ) -> Result<(), PickerError> {
    self.input_mut()?.set_max(max.clone());
    if let Some(calendar) = self.calendar.as_mut() {
      calendar.set_max_date(max);
    }
    Ok(())
  }

  pub fn set_date_filter(
    &mut self,
    filter: Option<DateFilter<A::Date>>
  ) -> Result<(), PickerError> {
    self.input_mut()?.set_date_filter(filter.clone());
    if let Some(calendar) = self.calendar.as_mut() {
      calendar.set_date_filter(filter);
    }
    Ok(())
  }

  /// Where the calendar opens: the explicit
  /// start, else the endpoint the mode
  /// edits, else the date value.
  pub fn start_at(&self) -> Option<A::Date> {
    if let Some(start) = &self.options.start_at {
      return Some(start.clone());
    }
    let value = self.input.as_ref()?.value()?;
    match (self.selection_mode, value) {
      | (
        SelectionMode::Range | SelectionMode::Since,
        PickerValue::Range(range)
      ) => range.begin_date().cloned(),
      | (SelectionMode::Until, PickerValue::Range(range)) => {
        range.end_date().cloned()
      }
      | (_, PickerValue::Date(date)) => Some(date.clone()),
      | (SelectionMode::Date, PickerValue::Range(_)) => None
    }
  }

  fn view_context(&self) -> ViewContext<A> {
    let mut ctx = ViewContext::new(
      Rc::clone(&self.adapter),
      Rc::clone(&self.formats)
    );
    if let Some(input) = &self.input {
      ctx.min = input.min().cloned();
      ctx.max = input.max().cloned();
      ctx.filter = input.date_filter().cloned();
    }
    ctx.date_class = self.options.date_class.clone();
    ctx.selection_mode = self.selection_mode;
    ctx.rtl = self.options.rtl;
    ctx.close_after_selection =
      self.options.close_after_selection;
    ctx.range_hover_effect =
      self.options.range_hover_effect;
    ctx
  }

  /// Opens the calendar. A no-op while open
  /// or disabled.
  #[tracing::instrument(
    skip(self),
    fields(mode = %self.selection_mode)
  )]
  pub fn open(&mut self) -> Result<(), PickerError> {
    if self.opened || self.is_disabled() {
      trace!(
        opened = self.opened,
        "open ignored"
      );
      return Ok(());
    }
    if self.input.is_none() {
      return Err(PickerError::NoInput);
    }

    self.focused_before_open =
      self.focus.active_element();
    let presentation = if self.options.touch_ui {
      Presentation::Dialog
    } else {
      Presentation::Popup
    };
    let calendar = Calendar::new(
      self.view_context(),
      self.selection_state(),
      CalendarOptions {
        start_at:           self.start_at(),
        start_view:         self.options.start_view,
        order_period_label: self
          .options
          .order_period_label,
        header:             Rc::clone(&self.options.header),
        footer:             Rc::clone(&self.options.footer),
        presets:            Rc::clone(&self.options.presets)
      }
    );
    self.calendar = Some(calendar);
    self.presentation = Some(presentation);
    self.opened = true;
    info!(?presentation, "datepicker opened");
    self.events.emit(&PickerEvent::Opened);
    self
      .tasks
      .schedule(Phase::Stable, UiTask::FocusActiveCell);
    Ok(())
  }

  /// Closes the calendar and hands focus
  /// back. Calling it again before the
  /// close completes does nothing.
  #[tracing::instrument(skip(self))]
  pub fn close(&mut self) {
    if !self.opened || self.closing {
      return;
    }
    self.presentation = None;
    self.calendar = None;
    self.tasks.cancel(UiTask::FocusActiveCell);

    if self.options.select_first_date_on_close
      && let Some(begin) = self.begin_date_selected.clone()
    {
      debug!(
        ?begin,
        "finalizing pending begin as one-day range"
      );
      self.select_range(RangeValue::single_day(begin));
    }
    self.begin_date_selected = None;

    let outcome = match self.focused_before_open.clone() {
      | Some(element) => self.focus.focus(&element),
      | None => FocusOutcome::Unavailable
    };
    match outcome {
      | FocusOutcome::Pending => {
        self.closing = true;
        self.tasks.schedule(
          Phase::Macrotask,
          UiTask::CompleteClose
        );
      }
      | FocusOutcome::Restored
      | FocusOutcome::Unavailable => {
        self.complete_close();
      }
    }
  }

  fn complete_close(&mut self) {
    if !self.opened {
      return;
    }
    self.opened = false;
    self.closing = false;
    self.focused_before_open = None;
    info!("datepicker closed");
    self.events.emit(&PickerEvent::Closed);
  }

  /// Host-side close: backdrop click,
  /// Escape, Alt+Up or the dialog going
  /// away.
  pub fn dismiss(&mut self, reason: DismissReason) {
    debug!(?reason, "dismissing datepicker");
    self.close();
  }

  /// Toggle button: opens a closed picker,
  /// closes an open one.
  pub fn toggle(&mut self) -> Result<(), PickerError> {
    if self.opened {
      self.close();
      Ok(())
    } else {
      self.open()
    }
  }

  /// Selects a single date; nothing
  /// happens when it is already selected.
  pub fn select(&mut self, date: A::Date) {
    let unchanged = self
      .adapter
      .same_date(self.selected.as_ref(), Some(&date));
    self.selected = Some(date.clone());
    if !unchanged {
      self.selected_changed(PickerValue::Date(date));
    }
  }

  /// Selects a range; the pending begin is
  /// always cleared.
  pub fn select_range(
    &mut self,
    range: RangeValue<A::Date>
  ) {
    self.begin_date_selected = None;
    let adapter = Rc::clone(&self.adapter);
    let unchanged = same_bound(
      adapter.as_ref(),
      range.begin.as_ref(),
      self.begin_date.as_ref()
    ) && same_bound(
      adapter.as_ref(),
      range.end.as_ref(),
      self.end_date.as_ref()
    );
    self.begin_date = range.begin.clone();
    self.end_date = range.end.clone();
    if !unchanged {
      self.selected_changed(PickerValue::Range(range));
    }
  }

  // A selection made in the calendar flows
  // into the input and out to the host.
  fn selected_changed(
    &mut self,
    value: PickerValue<A::Date>
  ) {
    let Some(input) = self.input.as_mut() else {
      warn!("selection without a bound input");
      return;
    };
    let events = input.set_value(Some(value));
    input.mark_touched();
    let current = input.value().cloned();
    for event in events {
      if let InputEvent::ValueChange(value) = event {
        self.input_value_changed(value.as_ref());
      }
    }
    self.events.emit(&PickerEvent::ValueChanged(
      current.clone()
    ));
    self
      .events
      .emit(&PickerEvent::DateInput(current.clone()));
    self.events.emit(&PickerEvent::DateChange(current));
  }

  /// Feeds calendar output back into the
  /// picker.
  pub fn handle_calendar_events(
    &mut self,
    events: Vec<CalendarEvent<A::Date>>
  ) {
    for event in events {
      match event {
        | CalendarEvent::SelectedChange(date) => {
          self.select(date)
        }
        | CalendarEvent::DateRangesChange(range) => {
          self.select_range(range)
        }
        | CalendarEvent::BeginDateSelected(date) => {
          self.begin_date_selected = Some(date.clone());
          self.events.emit(
            &PickerEvent::BeginDateSelected(date)
          );
        }
        | CalendarEvent::YearSelected(date) => {
          self
            .events
            .emit(&PickerEvent::YearSelected(date));
        }
        | CalendarEvent::MonthSelected(date) => {
          self
            .events
            .emit(&PickerEvent::MonthSelected(date));
        }
        | CalendarEvent::UserSelection => {
          self.events.emit(&PickerEvent::UserSelection);
          if self.options.close_after_selection {
            self.close();
          }
        }
        | CalendarEvent::FocusActiveCell => {
          if self.calendar.is_some() {
            self.tasks.schedule(
              Phase::Stable,
              UiTask::FocusActiveCell
            );
          }
        }
        | CalendarEvent::ClosePicker => self.close()
      }
    }
  }

  pub fn click_cell(&mut self, value: u32) {
    let events = self
      .calendar
      .as_mut()
      .map(|calendar| calendar.cell_clicked(value))
      .unwrap_or_default();
    self.handle_calendar_events(events);
  }

  pub fn hover_cell(&mut self, value: u32) {
    if let Some(calendar) = self.calendar.as_mut() {
      calendar.hover_cell(value);
    }
  }

  /// Keys pressed inside the open calendar.
  /// Escape and Alt+Up close it.
  pub fn calendar_keydown(&mut self, press: KeyPress) {
    if !self.opened {
      return;
    }
    match (press.key, press.alt) {
      | (Key::Escape, _) => {
        self.dismiss(DismissReason::Escape)
      }
      | (Key::Up, true) => {
        self.dismiss(DismissReason::AltUp)
      }
      | _ => {
        let events = self
          .calendar
          .as_mut()
          .map(|calendar| calendar.handle_keydown(press))
          .unwrap_or_default();
        self.handle_calendar_events(events);
      }
    }
  }

  pub fn apply_shortcut(
    &mut self,
    slot: PanelSlot,
    key: &str
  ) {
    let events = self
      .calendar
      .as_mut()
      .map(|calendar| calendar.apply_shortcut(slot, key))
      .unwrap_or_default();
    self.handle_calendar_events(events);
  }

  /// Forwards the calendar's post-render
  /// focus request.
  pub fn after_view_checked(&mut self) {
    let event = self
      .calendar
      .as_mut()
      .and_then(Calendar::after_view_checked);
    if let Some(event) = event {
      self.handle_calendar_events(vec![event]);
    }
  }

  /// Runs every queued UI task, stable work
  /// first. Returns how many ran.
  pub fn run_pending_tasks(&mut self) -> usize {
    let mut ran = 0;
    while let Some(task) = self.tasks.pop() {
      ran += 1;
      trace!(?task, "running ui task");
      match task {
        | UiTask::FocusActiveCell => {
          let label = self
            .calendar
            .as_ref()
            .and_then(Calendar::active_cell_label);
          if let Some(label) = label {
            self.focus.focus_cell(&label);
          }
        }
        | UiTask::CompleteClose => self.complete_close()
      }
    }
    ran
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::rc::Rc;

  use chrono::NaiveDate;

  use super::{
    Datepicker,
    DismissReason,
    PickerOptions,
    Presentation
  };
  use crate::adapter::NativeDateAdapter;
  use crate::error::PickerError;
  use crate::events::PickerEvent;
  use crate::focus::{
    DetachedFocus,
    ElementId,
    FocusTracker
  };
  use crate::range::{
    Bound,
    PickerValue,
    RangeValue,
    SelectionMode
  };
  use crate::view::{
    Key,
    KeyPress
  };

  type Picker = Datepicker<NativeDateAdapter, FocusTracker>;

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

  fn picker_with(
    options: PickerOptions<NativeDateAdapter>,
    focus: FocusTracker
  ) -> (Picker, Rc<RefCell<Vec<&'static str>>>) {
    let mut picker = Datepicker::new(
      Rc::new(NativeDateAdapter::default()),
      options,
      focus
    );
    let input = picker.new_input();
    picker
      .register_input(input)
      .expect("first input binds");
    let names = Rc::new(RefCell::new(Vec::new()));
    {
      let names = Rc::clone(&names);
      picker.subscribe(move |event| {
        names.borrow_mut().push(event.name());
      });
    }
    (picker, names)
  }

  fn picker() -> (Picker, Rc<RefCell<Vec<&'static str>>>) {
    picker_with(
      PickerOptions::default(),
      FocusTracker::focused_on("field")
    )
  }

  #[test]
  fn open_requires_an_input() {
    let mut picker: Datepicker<NativeDateAdapter> =
      Datepicker::new(
        Rc::new(NativeDateAdapter::default()),
        PickerOptions::default(),
        DetachedFocus
      );
    assert!(matches!(
      picker.open(),
      Err(PickerError::NoInput)
    ));
    let input = picker.new_input();
    picker.register_input(input).expect("binds");
    let second = picker.new_input();
    assert!(matches!(
      picker.register_input(second),
      Err(PickerError::InputAlreadyBound)
    ));
  }

  #[test]
  fn open_close_round_trip_restores_focus() {
    let (mut picker, names) = picker();
    picker.open().expect("opens");
    picker.open().expect("second open is a no-op");
    assert_eq!(picker.presentation(), Some(Presentation::Popup));
    assert_eq!(picker.run_pending_tasks(), 1);
    assert!(picker.focus_host().focused_cell.is_some());

    picker.dismiss(DismissReason::BackdropClick);
    assert!(!picker.is_opened());
    assert!(picker.calendar().is_none());
    assert_eq!(
      picker.focus_host().requests,
      vec![ElementId::new("field")]
    );
    picker.close();
    assert_eq!(*names.borrow(), vec!["opened", "closed"]);
  }

  #[test]
  fn asynchronous_focus_defers_completion() {
    let mut focus = FocusTracker::focused_on("field");
    focus.asynchronous = true;
    let (mut picker, names) =
      picker_with(PickerOptions::default(), focus);
    picker.open().expect("opens");
    picker.close();
    picker.close();
    assert!(picker.is_opened());
    assert_eq!(*names.borrow(), vec!["opened"]);
    assert_eq!(picker.focus_host().requests.len(), 1);

    picker.run_pending_tasks();
    assert!(!picker.is_opened());
    assert_eq!(*names.borrow(), vec!["opened", "closed"]);
  }

  #[test]
  fn disabled_picker_stays_closed() {
    let (mut picker, names) = picker();
    picker.set_input_disabled(true).expect("input bound");
    picker.open().expect("no error");
    assert!(!picker.is_opened());
    picker.set_disabled(false);
    picker.open().expect("opens");
    assert!(picker.is_opened());
    assert_eq!(*names.borrow(), vec!["opened"]);
  }

  #[test]
  fn written_values_infer_the_mode() {
    let (mut picker, _) = picker();
    picker
      .write_value(Some(PickerValue::Range(
        RangeValue::since(ymd(2024, 1, 1))
      )))
      .expect("input bound");
    assert_eq!(picker.selection_mode(), SelectionMode::Since);

    picker
      .write_value(Some(PickerValue::Range(
        RangeValue::until(ymd(2024, 1, 1))
      )))
      .expect("input bound");
    assert_eq!(picker.selection_mode(), SelectionMode::Until);
    assert_eq!(picker.start_at(), Some(ymd(2024, 1, 1)));

    picker
      .write_value(Some(PickerValue::Date(ymd(2024, 2, 2))))
      .expect("input bound");
    assert_eq!(picker.selection_mode(), SelectionMode::Date);
    assert_eq!(picker.selected(), Some(&ymd(2024, 2, 2)));

    picker.write_value(None).expect("input bound");
    assert_eq!(picker.selection_mode(), SelectionMode::Date);
    assert_eq!(picker.selected(), None);
  }

  #[test]
  fn modes_outside_the_permitted_set_are_refused() {
    let (mut picker, _) = picker_with(
      PickerOptions {
        selection_modes: vec![
          SelectionMode::Range,
          SelectionMode::Date,
          SelectionMode::Range,
        ],
        ..PickerOptions::default()
      },
      FocusTracker::default()
    );
    assert_eq!(
      picker.selection_modes(),
      &[SelectionMode::Range, SelectionMode::Date]
    );
    assert!(picker.set_selection_mode(SelectionMode::Range).is_ok());
    assert!(matches!(
      picker.set_selection_mode(SelectionMode::Until),
      Err(PickerError::ModeNotPermitted { .. })
    ));
  }

  #[test]
  fn two_clicks_select_a_range_and_close() {
    let (mut picker, names) = picker_with(
      PickerOptions {
        initial_selection_mode: Some(SelectionMode::Range),
        start_at: Some(ymd(2024, 1, 1)),
        ..PickerOptions::default()
      },
      FocusTracker::default()
    );
    picker.open().expect("opens");
    picker.click_cell(5);
    assert_eq!(picker.begin_date_selected(), Some(&ymd(2024, 1, 5)));
    assert!(picker.is_opened());
    picker.click_cell(20);

    assert!(!picker.is_opened());
    let expected = PickerValue::Range(RangeValue::new(
      Some(Bound::Date(ymd(2024, 1, 5))),
      Some(Bound::Date(ymd(2024, 1, 20)))
    ));
    let input = picker.input().expect("bound");
    assert_eq!(input.value(), Some(&expected));
    assert_eq!(input.text(), "2024-01-05 - 2024-01-20");
    assert_eq!(
      *names.borrow(),
      vec![
        "opened",
        "begin_date_selected",
        "value_changed",
        "date_input",
        "date_change",
        "user_selection",
        "closed"
      ]
    );
  }

  #[test]
  fn pending_begin_finalizes_on_close_when_asked() {
    let (mut picker, _) = picker_with(
      PickerOptions {
        initial_selection_mode: Some(SelectionMode::Range),
        start_at: Some(ymd(2024, 1, 1)),
        select_first_date_on_close: true,
        ..PickerOptions::default()
      },
      FocusTracker::default()
    );
    picker.open().expect("opens");
    picker.click_cell(9);
    picker.close();
    assert_eq!(
      picker.input().and_then(|input| input.value()),
      Some(&PickerValue::Range(RangeValue::single_day(
        ymd(2024, 1, 9)
      )))
    );
    assert_eq!(picker.begin_date_selected(), None);
  }

  #[test]
  fn selecting_the_same_date_twice_emits_once() {
    let (mut picker, names) = picker();
    picker.select(ymd(2024, 4, 1));
    picker.select(ymd(2024, 4, 1));
    let changes = names
      .borrow()
      .iter()
      .filter(|name| **name == "value_changed")
      .count();
    assert_eq!(changes, 1);
    assert_eq!(
      picker.input().map(|input| input.text()),
      Some("2024-04-01")
    );
  }

  #[test]
  fn typing_feeds_the_host_and_escape_closes() {
    let (mut picker, names) = picker();
    picker.type_text("2024-05-06").expect("input bound");
    assert_eq!(picker.selected(), Some(&ymd(2024, 5, 6)));
    assert_eq!(*names.borrow(), vec!["value_changed", "date_input"]);

    picker
      .input_keydown(KeyPress::alt(Key::Down))
      .expect("input bound");
    assert!(picker.is_opened());
    assert_eq!(
      picker.calendar().map(|calendar| *calendar.active_date()),
      Some(ymd(2024, 5, 6))
    );
    picker.calendar_keydown(KeyPress::plain(Key::Escape));
    assert!(!picker.is_opened());
  }
}
