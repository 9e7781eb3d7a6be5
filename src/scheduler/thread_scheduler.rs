use super::{Scheduler, TaskHandle};
use crate::subscription::SubscriptionLike;
use std::{thread, time::Duration};

/// Starts a fresh OS thread for every scheduled task.
#[derive(Clone, Copy, Debug, Default)]
pub struct NewThreadScheduler;

impl Scheduler for NewThreadScheduler {
  fn schedule<T>(&self, task: T, delay: Option<Duration>) -> TaskHandle
  where
    T: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::default();
    let c_handle = handle.clone();
    spawn(move || {
      if let Some(delay) = delay {
        thread::sleep(delay);
      }
      c_handle.run(task);
    });
    handle
  }

  /// One thread serves all runs of the repeating task.
  fn schedule_repeating<T>(&self, mut task: T, delay: Option<Duration>, period: Duration) -> TaskHandle
  where
    T: FnMut(usize) -> bool + Send + 'static,
  {
    let handle = TaskHandle::default();
    let c_handle = handle.clone();
    spawn(move || {
      thread::sleep(delay.unwrap_or(period));
      let mut seq = 0;
      while !c_handle.is_closed() && task(seq) {
        seq += 1;
        thread::sleep(period);
      }
      c_handle.finish();
    });
    handle
  }
}

fn spawn<F: FnOnce() + Send + 'static>(f: F) {
  thread::Builder::new()
    .name("rx-new-thread".to_owned())
    .spawn(f)
    .expect("spawn new thread failed.");
}
