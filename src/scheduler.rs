//! Schedulers decide where and when work runs.
//!
//! Every scheduler hands out a [`TaskHandle`] per task. The handle has its own
//! cancellation flag; operators add it to the subscription that owns the work,
//! so unsubscribing cancels the pending task.

use crate::subscription::SubscriptionLike;
use std::{
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
  time::Duration,
};

mod immediate;
mod test_scheduler;
mod thread_pool_scheduler;
mod thread_scheduler;
mod timer;

pub use immediate::ImmediateScheduler;
pub use test_scheduler::TestScheduler;
pub use thread_pool_scheduler::{computation, io, ThreadPoolScheduler, ThreadPoolSchedulerBuilder};
pub use thread_scheduler::NewThreadScheduler;
pub use timer::{timer, TimerScheduler};

pub trait Scheduler: Clone + Send + Sync + 'static {
  /// Runs `task` once, after `delay` if one is given.
  fn schedule<T>(&self, task: T, delay: Option<Duration>) -> TaskHandle
  where
    T: FnOnce() + Send + 'static;

  /// Runs `task` after `delay` (or `period` when no delay is given) and then
  /// every `period`, passing the zero based run index. The task stops
  /// repeating when it returns `false` or when the handle is cancelled.
  fn schedule_repeating<T>(&self, task: T, delay: Option<Duration>, period: Duration) -> TaskHandle
  where
    T: FnMut(usize) -> bool + Send + 'static,
  {
    let handle = TaskHandle::default();
    repeat_step(self.clone(), task, 0, delay.unwrap_or(period), period, handle.clone());
    handle
  }
}

fn repeat_step<S, T>(
  scheduler: S, mut task: T, seq: usize, delay: Duration, period: Duration, handle: TaskHandle,
) where
  S: Scheduler,
  T: FnMut(usize) -> bool + Send + 'static,
{
  let next = scheduler.clone();
  scheduler.schedule(
    move || {
      if handle.is_closed() {
        return;
      }
      if task(seq) && !handle.is_closed() {
        repeat_step(next, task, seq + 1, period, period, handle);
      } else {
        handle.finish();
      }
    },
    Some(delay),
  );
}

#[derive(Default)]
struct TaskState {
  cancelled: AtomicBool,
  finished: AtomicBool,
}

/// Cancellation token of one scheduled task.
///
/// `is_closed` is true once the task was cancelled or has run, so finished
/// handles are pruned from the subscription they were added to.
#[derive(Clone, Default)]
pub struct TaskHandle(Arc<TaskState>);

impl TaskHandle {
  /// Returns `true` once the task ran to its end.
  pub fn is_finished(&self) -> bool { self.0.finished.load(Ordering::Acquire) }

  pub(crate) fn finish(&self) { self.0.finished.store(true, Ordering::Release); }

  /// Runs `task` unless the handle was cancelled first, then marks it
  /// finished.
  pub(crate) fn run<T: FnOnce()>(&self, task: T) {
    if !self.is_closed() {
      task();
    }
    self.finish();
  }
}

impl SubscriptionLike for TaskHandle {
  #[inline]
  fn unsubscribe(&self) { self.0.cancelled.store(true, Ordering::Release); }

  #[inline]
  fn is_closed(&self) -> bool {
    self.0.cancelled.load(Ordering::Acquire) || self.0.finished.load(Ordering::Acquire)
  }
}

impl std::fmt::Debug for TaskHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TaskHandle")
      .field("cancelled", &self.0.cancelled.load(Ordering::Relaxed))
      .field("finished", &self.is_finished())
      .finish()
  }
}
