use serde::Serialize;

/// Host-side handle of a focusable element.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Hash,
  Serialize,
)]
pub struct ElementId(pub String);

impl ElementId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }
}

/// How the host handled a focus request.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum FocusOutcome {
  /// Focus moved before `focus` returned.
  Restored,
  /// Focus moves on a later host turn.
  Pending,
  /// The element cannot take focus.
  Unavailable
}

/// The slice of the host's focus model the
/// picker needs: what was focused before
/// opening, and a way to hand focus back.
pub trait FocusHost {
  fn active_element(&self) -> Option<ElementId>;

  fn focus(
    &mut self,
    element: &ElementId
  ) -> FocusOutcome;

  /// Called when the calendar's active
  /// cell should take focus.
  fn focus_cell(&mut self, _label: &str) {}
}

/// Focus host for headless use: nothing is
/// ever focused.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedFocus;

impl FocusHost for DetachedFocus {
  fn active_element(&self) -> Option<ElementId> {
    None
  }

  fn focus(
    &mut self,
    _element: &ElementId
  ) -> FocusOutcome {
    FocusOutcome::Unavailable
  }
}

/// In-memory focus host recording every
/// request.
#[derive(Debug, Default, Clone)]
pub struct FocusTracker {
  pub focused:      Option<ElementId>,
  pub asynchronous: bool,
  pub focused_cell: Option<String>,
  pub requests:     Vec<ElementId>
}

impl FocusTracker {
  pub fn focused_on(
    id: impl Into<String>
  ) -> Self {
    Self {
      focused: Some(ElementId::new(id)),
      ..Self::default()
    }
  }
}

impl FocusHost for FocusTracker {
  fn active_element(&self) -> Option<ElementId> {
    self.focused.clone()
  }

  fn focus(
    &mut self,
    element: &ElementId
  ) -> FocusOutcome {
    self.requests.push(element.clone());
    self.focused = Some(element.clone());
    if self.asynchronous {
      FocusOutcome::Pending
    } else {
      FocusOutcome::Restored
    }
  }

  fn focus_cell(&mut self, label: &str) {
    self.focused_cell =
      Some(label.to_string());
  }
}
