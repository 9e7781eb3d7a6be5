use super::{Scheduler, TaskHandle};
use crate::subscription::SubscriptionLike;
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};
use std::{
  cmp::Ordering,
  collections::BinaryHeap,
  sync::Arc,
  time::{Duration, Instant},
};
use tracing::trace;

static TIMER: Lazy<TimerScheduler> = Lazy::new(TimerScheduler::start);

/// The process wide timer.
pub fn timer() -> TimerScheduler { TIMER.clone() }

/// A single thread that fires tasks at their deadlines.
///
/// Tasks run on the timer thread itself and should stay short; pool based
/// schedulers only use it to wait and then dispatch to their workers.
#[derive(Clone)]
pub struct TimerScheduler(Arc<Shared>);

struct Shared {
  state: Mutex<TimerState>,
  wake: Condvar,
}

/// Cancelled entries are purged once the queue grows past twice its size
/// after the last purge, and never below this length.
const MIN_PURGE_LEN: usize = 64;

#[derive(Default)]
struct TimerState {
  queue: BinaryHeap<Entry>,
  next_id: usize,
  purge_at: usize,
}

impl TimerState {
  fn purge(&mut self) {
    self.queue.retain(|e| !e.handle.is_closed());
    self.purge_at = (self.queue.len() * 2).max(MIN_PURGE_LEN);
  }
}

struct Entry {
  deadline: Instant,
  id: usize,
  task: Box<dyn FnOnce() + Send>,
  handle: TaskHandle,
  /// False when the task only hands the work on and someone else finishes
  /// the handle.
  owns_handle: bool,
}

impl PartialEq for Entry {
  fn eq(&self, other: &Self) -> bool { self.deadline == other.deadline && self.id == other.id }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Entry {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier deadlines first, then FIFO by id
    other.deadline.cmp(&self.deadline).then_with(|| other.id.cmp(&self.id))
  }
}

impl TimerScheduler {
  fn start() -> Self {
    let shared = Arc::new(Shared { state: Mutex::new(TimerState::default()), wake: Condvar::new() });
    let c_shared = shared.clone();
    std::thread::Builder::new()
      .name("rx-timer".to_owned())
      .spawn(move || run(&c_shared))
      .expect("spawn timer thread failed.");
    trace!("timer thread started");
    TimerScheduler(shared)
  }

  /// Count of live tasks waiting for their deadline. Cancelled tasks are
  /// dropped first.
  pub fn pending_count(&self) -> usize {
    let mut state = self.0.state.lock();
    state.purge();
    state.queue.len()
  }

  /// Waits out `delay`, then runs `task` unless `handle` was cancelled. The
  /// handle is left for `task` to finish.
  pub(crate) fn schedule_linked<T>(&self, task: T, delay: Duration, handle: TaskHandle)
  where
    T: FnOnce() + Send + 'static,
  {
    self.enqueue(Box::new(task), delay, handle, false)
  }

  fn enqueue(&self, task: Box<dyn FnOnce() + Send>, delay: Duration, handle: TaskHandle, owns_handle: bool) {
    let Some(deadline) = Instant::now().checked_add(delay) else {
      trace!(?delay, "deadline out of range, task will never run");
      return;
    };
    let mut state = self.0.state.lock();
    if state.queue.len() >= state.purge_at {
      state.purge();
    }
    let id = state.next_id;
    state.next_id += 1;
    state.queue.push(Entry { deadline, id, task, handle, owns_handle });
    drop(state);
    self.0.wake.notify_one();
  }
}

fn run(shared: &Shared) {
  let mut state = shared.state.lock();
  loop {
    let deadline = state.queue.peek().map(|e| e.deadline);
    match deadline {
      None => shared.wake.wait(&mut state),
      Some(deadline) if deadline <= Instant::now() => {
        if let Some(entry) = state.queue.pop() {
          drop(state);
          if entry.owns_handle {
            entry.handle.run(entry.task);
          } else if !entry.handle.is_closed() {
            (entry.task)();
          }
          state = shared.state.lock();
        }
      }
      Some(deadline) => {
        shared.wake.wait_until(&mut state, deadline);
      }
    }
  }
}

impl Scheduler for TimerScheduler {
  fn schedule<T>(&self, task: T, delay: Option<Duration>) -> TaskHandle
  where
    T: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::default();
    self.enqueue(Box::new(task), delay.unwrap_or_default(), handle.clone(), true);
    handle
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use std::sync::mpsc::channel;

  #[test]
  fn fires_in_deadline_order() {
    let (tx, rx) = channel();
    for (value, ms) in [(3, 30), (1, 10), (2, 20)] {
      let tx = tx.clone();
      timer().schedule(move || tx.send(value).unwrap(), Some(Duration::from_millis(ms)));
    }
    let got: Vec<i32> = (0..3).map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap()).collect();
    assert_eq!(got, vec![1, 2, 3]);
  }

  #[test]
  fn cancelled_tasks_are_released() {
    let timer = TimerScheduler::start();
    let payload = Arc::new(());
    let handles: Vec<_> = (0..1000)
      .map(|_| {
        let payload = payload.clone();
        timer.schedule(move || drop(payload), Some(Duration::from_secs(3600)))
      })
      .collect();
    assert_eq!(timer.pending_count(), 1000);
    handles.iter().for_each(|h| h.unsubscribe());
    assert_eq!(timer.pending_count(), 0);
    assert_eq!(Arc::strong_count(&payload), 1);
  }

  #[test]
  fn queue_stays_bounded_while_cancelling() {
    let timer = TimerScheduler::start();
    for _ in 0..10_000 {
      timer.schedule(|| {}, Some(Duration::from_secs(3600))).unsubscribe();
    }
    assert!(timer.0.state.lock().queue.len() <= MIN_PURGE_LEN);
  }

  #[test]
  fn out_of_range_delay_never_fires() {
    let timer = TimerScheduler::start();
    let (tx, rx) = channel::<()>();
    let handle = timer.schedule(move || tx.send(()).unwrap(), Some(Duration::MAX));
    assert!(!handle.is_closed());
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    assert_eq!(timer.pending_count(), 0);
  }
}
