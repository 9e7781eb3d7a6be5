use super::{Scheduler, TaskHandle};
use crate::subscription::SubscriptionLike;
use std::time::Duration;

/// Runs every task synchronously on the calling thread. A delay blocks the
/// caller for that long.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  fn schedule<T>(&self, task: T, delay: Option<Duration>) -> TaskHandle
  where
    T: FnOnce() + Send + 'static,
  {
    if let Some(delay) = delay {
      std::thread::sleep(delay);
    }
    let handle = TaskHandle::default();
    handle.run(task);
    handle
  }

  /// Loops on the calling thread until the task gives up. Only the task
  /// itself can stop the loop, since the handle is returned afterwards.
  fn schedule_repeating<T>(&self, mut task: T, delay: Option<Duration>, period: Duration) -> TaskHandle
  where
    T: FnMut(usize) -> bool + Send + 'static,
  {
    let handle = TaskHandle::default();
    std::thread::sleep(delay.unwrap_or(period));
    let mut seq = 0;
    while !handle.is_closed() && task(seq) {
      seq += 1;
      std::thread::sleep(period);
    }
    handle.finish();
    handle
  }
}
