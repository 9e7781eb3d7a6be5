use super::{timer, Scheduler, TaskHandle};
use futures::{executor::ThreadPool, future};
use once_cell::sync::Lazy;
use std::time::Duration;
use tracing::debug;

const IO_POOL_SIZE: usize = 64;

static COMPUTATION: Lazy<ThreadPoolScheduler> = Lazy::new(|| {
  let size = std::thread::available_parallelism().map_or(1, |n| n.get());
  ThreadPoolScheduler::builder().pool_size(size).name_prefix("rx-computation-").build()
});

static IO: Lazy<ThreadPoolScheduler> = Lazy::new(|| {
  ThreadPoolScheduler::builder().pool_size(IO_POOL_SIZE).name_prefix("rx-io-").build()
});

/// The shared pool for CPU-bound work, sized to the available parallelism.
pub fn computation() -> ThreadPoolScheduler { COMPUTATION.clone() }

/// The shared pool for blocking I/O work.
pub fn io() -> ThreadPoolScheduler { IO.clone() }

/// Runs tasks on a `futures` thread pool. Delayed tasks wait on the timer
/// thread and are then handed to the pool.
#[derive(Clone)]
pub struct ThreadPoolScheduler {
  pool: ThreadPool,
}

impl ThreadPoolScheduler {
  pub fn builder() -> ThreadPoolSchedulerBuilder { ThreadPoolSchedulerBuilder::default() }

  fn spawn<T: FnOnce() + Send + 'static>(&self, task: T, handle: TaskHandle) {
    self.pool.spawn_ok(future::lazy(move |_| handle.run(task)));
  }
}

impl Scheduler for ThreadPoolScheduler {
  fn schedule<T>(&self, task: T, delay: Option<Duration>) -> TaskHandle
  where
    T: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::default();
    match delay {
      Some(delay) if !delay.is_zero() => {
        let pool = self.clone();
        let c_handle = handle.clone();
        timer().schedule_linked(move || pool.spawn(task, c_handle), delay, handle.clone());
      }
      _ => self.spawn(task, handle.clone()),
    }
    handle
  }
}

pub struct ThreadPoolSchedulerBuilder {
  pool_size: usize,
  name_prefix: String,
}

impl Default for ThreadPoolSchedulerBuilder {
  fn default() -> Self { Self { pool_size: 4, name_prefix: "rx-pool-".to_owned() } }
}

impl ThreadPoolSchedulerBuilder {
  pub fn pool_size(mut self, size: usize) -> Self {
    self.pool_size = size.max(1);
    self
  }

  pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.name_prefix = prefix.into();
    self
  }

  /// # Panics
  ///
  /// Panics when the operating system refuses to start the worker threads.
  pub fn build(self) -> ThreadPoolScheduler {
    let pool = ThreadPool::builder()
      .pool_size(self.pool_size)
      .name_prefix(self.name_prefix.clone())
      .create()
      .expect("create thread pool failed.");
    debug!(pool_size = self.pool_size, name_prefix = %self.name_prefix, "thread pool scheduler created");
    ThreadPoolScheduler { pool }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::subscription::SubscriptionLike;
  use std::{
    sync::mpsc::channel,
    time::{Duration, Instant},
  };

  #[test]
  fn runs_on_pool_thread() {
    let (tx, rx) = channel();
    computation().schedule(
      move || tx.send(std::thread::current().name().map(str::to_owned)).unwrap(),
      None,
    );
    let name = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
    assert!(name.starts_with("rx-computation-"));
  }

  #[test]
  fn delay_is_honoured() {
    let (tx, rx) = channel();
    let start = Instant::now();
    io().schedule(move || tx.send(Instant::now()).unwrap(), Some(Duration::from_millis(20)));
    let fired = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(fired.duration_since(start) >= Duration::from_millis(20));
  }

  #[test]
  fn cancelled_before_delay_never_runs() {
    let (tx, rx) = channel::<()>();
    let pool = ThreadPoolScheduler::builder().pool_size(1).build();
    let handle = pool.schedule(move || tx.send(()).unwrap(), Some(Duration::from_millis(50)));
    handle.unsubscribe();
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
  }

  #[test]
  fn cancelled_delayed_task_is_released_from_the_timer() {
    let pool = ThreadPoolScheduler::builder().pool_size(1).build();
    let payload = std::sync::Arc::new(());
    let c_payload = payload.clone();
    let handle = pool.schedule(move || drop(c_payload), Some(Duration::from_secs(3600)));
    handle.unsubscribe();
    // counting purges cancelled entries
    timer().pending_count();
    assert_eq!(std::sync::Arc::strong_count(&payload), 1);
  }

  #[test]
  fn out_of_range_delay_does_not_panic() {
    let (tx, rx) = channel::<()>();
    let handle = computation().schedule(move || tx.send(()).unwrap(), Some(Duration::MAX));
    assert!(!handle.is_closed());
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
  }
}
