use std::collections::VecDeque;

use tracing::trace;

/// Deferred work the picker cannot finish
/// inside the call that triggered it.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub enum UiTask {
  /// Move focus to the active cell once
  /// the view has been rebuilt.
  FocusActiveCell,
  /// Finish a close after focus has been
  /// handed back to the host.
  CompleteClose
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub enum Phase {
  /// Runs after the current update
  /// settles.
  Stable,
  /// Runs on the next host turn.
  Macrotask
}

/// Two-phase queue of pending UI tasks.
/// A task already waiting is never queued
/// twice.
#[derive(Debug, Default, Clone)]
pub struct UiTaskQueue {
  stable:    VecDeque<UiTask>,
  macrotask: VecDeque<UiTask>
}

impl UiTaskQueue {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns false when the task was
  /// already queued in some phase.
  pub fn schedule(
    &mut self,
    phase: Phase,
    task: UiTask
  ) -> bool {
    if self.is_scheduled(task) {
      trace!(
        ?task,
        ?phase,
        "ui task already pending"
      );
      return false;
    }
    match phase {
      | Phase::Stable => {
        self.stable.push_back(task)
      }
      | Phase::Macrotask => {
        self.macrotask.push_back(task)
      }
    }
    true
  }

  pub fn is_scheduled(
    &self,
    task: UiTask
  ) -> bool {
    self.stable.contains(&task)
      || self.macrotask.contains(&task)
  }

  pub fn cancel(
    &mut self,
    task: UiTask
  ) -> bool {
    let before = self.len();
    self.stable.retain(|t| *t != task);
    self
      .macrotask
      .retain(|t| *t != task);
    before != self.len()
  }

  /// Next task to run: stable work first,
  /// then macrotasks.
  pub fn pop(&mut self) -> Option<UiTask> {
    self
      .stable
      .pop_front()
      .or_else(|| self.macrotask.pop_front())
  }

  pub fn len(&self) -> usize {
    self.stable.len() + self.macrotask.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[cfg(test)]
mod tests {
  use super::{
    Phase,
    UiTask,
    UiTaskQueue
  };

  #[test]
  fn schedules_each_task_once() {
    let mut queue = UiTaskQueue::new();
    assert!(queue.schedule(
      Phase::Stable,
      UiTask::FocusActiveCell
    ));
    assert!(!queue.schedule(
      Phase::Stable,
      UiTask::FocusActiveCell
    ));
    assert!(!queue.schedule(
      Phase::Macrotask,
      UiTask::FocusActiveCell
    ));
    assert_eq!(queue.len(), 1);
  }

  #[test]
  fn stable_tasks_run_before_macrotasks() {
    let mut queue = UiTaskQueue::new();
    queue.schedule(
      Phase::Macrotask,
      UiTask::CompleteClose
    );
    queue.schedule(
      Phase::Stable,
      UiTask::FocusActiveCell
    );
    assert_eq!(
      queue.pop(),
      Some(UiTask::FocusActiveCell)
    );
    assert_eq!(
      queue.pop(),
      Some(UiTask::CompleteClose)
    );
    assert_eq!(queue.pop(), None);
  }

  #[test]
  fn cancel_removes_pending_task() {
    let mut queue = UiTaskQueue::new();
    queue.schedule(
      Phase::Macrotask,
      UiTask::CompleteClose
    );
    assert!(queue.cancel(UiTask::CompleteClose));
    assert!(queue.is_empty());
  }
}
