use std::fmt;

use crate::range::{
  PickerValue,
  RangeValue
};

pub type ListenerId = u64;

type Listener<E> = Box<dyn FnMut(&E)>;

/// Synchronous listener registry. Events
/// reach listeners in subscription order.
pub struct Emitter<E> {
  next_id:   ListenerId,
  listeners: Vec<(ListenerId, Listener<E>)>
}

impl<E> Default for Emitter<E> {
  fn default() -> Self {
    Self {
      next_id:   0,
      listeners: Vec::new()
    }
  }
}

impl<E> fmt::Debug for Emitter<E> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("Emitter")
      .field(
        "listeners",
        &self.listeners.len()
      )
      .finish()
  }
}

impl<E> Emitter<E> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn subscribe<F>(
    &mut self,
    listener: F
  ) -> ListenerId
  where
    F: FnMut(&E) + 'static
  {
    self.next_id += 1;
    let id = self.next_id;
    self
      .listeners
      .push((id, Box::new(listener)));
    id
  }

  pub fn unsubscribe(
    &mut self,
    id: ListenerId
  ) -> bool {
    let before = self.listeners.len();
    self
      .listeners
      .retain(|(known, _)| *known != id);
    before != self.listeners.len()
  }

  pub fn emit(&mut self, event: &E) {
    for (_, listener) in
      self.listeners.iter_mut()
    {
      listener(event);
    }
  }

  pub fn len(&self) -> usize {
    self.listeners.len()
  }

  pub fn is_empty(&self) -> bool {
    self.listeners.is_empty()
  }
}

/// Raised by the month, year and
/// multi-year views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent<D> {
  SelectedChange(D),
  UserSelection,
  ActiveDateChange(D),
  FocusActiveCell,
  MonthSelected(D),
  YearSelected(D)
}

/// Raised by the calendar controller
/// toward its datepicker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarEvent<D> {
  SelectedChange(D),
  DateRangesChange(RangeValue<D>),
  BeginDateSelected(D),
  YearSelected(D),
  MonthSelected(D),
  UserSelection,
  FocusActiveCell,
  ClosePicker
}

/// Notifications delivered to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent<D> {
  /// The bound form value changed.
  ValueChanged(Option<PickerValue<D>>),
  DateInput(Option<PickerValue<D>>),
  DateChange(Option<PickerValue<D>>),
  Opened,
  Closed,
  YearSelected(D),
  MonthSelected(D),
  UserSelection,
  BeginDateSelected(D)
}

impl<D> PickerEvent<D> {
  pub fn name(&self) -> &'static str {
    match self {
      | Self::ValueChanged(_) => {
        "value_changed"
      }
      | Self::DateInput(_) => "date_input",
      | Self::DateChange(_) => {
        "date_change"
      }
      | Self::Opened => "opened",
      | Self::Closed => "closed",
      | Self::YearSelected(_) => {
        "year_selected"
      }
      | Self::MonthSelected(_) => {
        "month_selected"
      }
      | Self::UserSelection => {
        "user_selection"
      }
      | Self::BeginDateSelected(_) => {
        "begin_date_selected"
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::rc::Rc;

  use super::Emitter;

  #[test]
  fn listeners_run_in_order_until_removed() {
    let seen = Rc::new(RefCell::new(
      Vec::<String>::new()
    ));
    let mut emitter = Emitter::<u32>::new();

    let first = {
      let seen = Rc::clone(&seen);
      emitter.subscribe(move |n| {
        seen
          .borrow_mut()
          .push(format!("a{n}"));
      })
    };
    {
      let seen = Rc::clone(&seen);
      emitter.subscribe(move |n| {
        seen
          .borrow_mut()
          .push(format!("b{n}"));
      });
    }

    emitter.emit(&1);
    assert!(emitter.unsubscribe(first));
    assert!(!emitter.unsubscribe(first));
    emitter.emit(&2);

    assert_eq!(
      *seen.borrow(),
      vec!["a1", "b1", "b2"]
    );
    assert_eq!(emitter.len(), 1);
  }
}
