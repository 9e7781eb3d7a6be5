//! Test Scheduler for deterministic testing of time-based operators.
//!
//! Provides virtual time that only advances when explicitly instructed,
//! enabling deterministic testing of `interval`, `buffer`, `window`,
//! retry delays and backpressure boundaries.
//!
//! # Usage
//!
//! ```rust
//! use rxcore::prelude::*;
//! use std::time::Duration;
//!
//! let scheduler = TestScheduler::default();
//! let mut seen = vec![];
//! let (tx, rx) = std::sync::mpsc::channel();
//! observable::interval(Duration::from_millis(10), scheduler.clone())
//!   .take(3)
//!   .subscribe(move |v| tx.send(v).unwrap());
//!
//! scheduler.advance_by(Duration::from_millis(30));
//! seen.extend(rx.try_iter());
//! assert_eq!(seen, vec![0, 1, 2]);
//! ```
//!
//! Clones share one virtual clock and task queue; separate instances are
//! fully independent, so tests never interfere with each other.

use super::{Scheduler, TaskHandle};
use crate::subscription::SubscriptionLike;
use parking_lot::Mutex;
use std::{cmp::Ordering, collections::BinaryHeap, sync::Arc, time::Duration};

// ==================== Internal State ====================

#[derive(Default)]
struct TestSchedulerState {
  virtual_time: Duration,
  task_queue: BinaryHeap<ScheduledTask>,
  next_task_id: usize,
}

struct ScheduledTask {
  scheduled_time: Duration,
  task_id: usize,
  task: Box<dyn FnOnce() + Send>,
  handle: TaskHandle,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool {
    self.scheduled_time == other.scheduled_time && self.task_id == other.task_id
  }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by task_id
    other
      .scheduled_time
      .cmp(&self.scheduled_time)
      .then_with(|| other.task_id.cmp(&self.task_id))
  }
}

// ==================== TestScheduler ====================

/// A virtual time scheduler for deterministic testing.
///
/// Tasks run synchronously on the thread that advances the clock.
#[derive(Clone, Default)]
pub struct TestScheduler(Arc<Mutex<TestSchedulerState>>);

impl TestScheduler {
  /// Get the current virtual time.
  pub fn now(&self) -> Duration { self.0.lock().virtual_time }

  /// Get the number of pending, not cancelled tasks.
  pub fn pending_count(&self) -> usize {
    self.0.lock().task_queue.iter().filter(|t| !t.handle.is_closed()).count()
  }

  /// Advance virtual time by `duration`, running every task due on the way.
  pub fn advance_by(&self, duration: Duration) {
    let target = self.now().saturating_add(duration);
    self.advance_to(target);
  }

  /// Advance virtual time to `target`, running every task due on the way.
  /// Tasks scheduled by those tasks run too if they fall due before `target`.
  pub fn advance_to(&self, target: Duration) {
    while let Some(task) = self.pop_due(Some(target)) {
      task.handle.run(task.task);
    }
    let mut state = self.0.lock();
    if state.virtual_time < target {
      state.virtual_time = target;
    }
  }

  /// Run every pending task, jumping the clock forward as needed.
  ///
  /// Never returns while a repeating task keeps rescheduling itself.
  pub fn flush(&self) {
    while let Some(task) = self.pop_due(None) {
      task.handle.run(task.task);
    }
  }

  fn pop_due(&self, limit: Option<Duration>) -> Option<ScheduledTask> {
    let mut state = self.0.lock();
    let due = state.task_queue.peek().map(|t| t.scheduled_time)?;
    if limit.map_or(false, |limit| due > limit) {
      return None;
    }
    let task = state.task_queue.pop()?;
    if state.virtual_time < task.scheduled_time {
      state.virtual_time = task.scheduled_time;
    }
    Some(task)
  }
}

impl Scheduler for TestScheduler {
  fn schedule<T>(&self, task: T, delay: Option<Duration>) -> TaskHandle
  where
    T: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::default();
    let mut state = self.0.lock();
    let task_id = state.next_task_id;
    state.next_task_id += 1;
    let scheduled_time = state.virtual_time.saturating_add(delay.unwrap_or_default());
    state.task_queue.push(ScheduledTask {
      scheduled_time,
      task_id,
      task: Box::new(task),
      handle: handle.clone(),
    });
    handle
  }
}
