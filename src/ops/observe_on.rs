use super::backpressure::OverflowStrategy;
use crate::{
  observable::Observable,
  observer::{Observer, Terminal},
  scheduler::Scheduler,
  subscriber::Subscriber,
  subscription::{SharedSubscription, SubscriptionLike},
};
use parking_lot::{Condvar, Mutex};
use std::{
  collections::VecDeque,
  sync::Arc,
  time::{Duration, Instant},
};

/// Re-emits every event on `scheduler`, in source order.
#[derive(Clone)]
pub struct ObserveOnOp<S, Sch> {
  pub(crate) source: S,
  pub(crate) scheduler: Sch,
}

impl<S, Sch> Observable for ObserveOnOp<S, Sch>
where
  S: Observable,
  Sch: Scheduler,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let upstream = SharedSubscription::default();
    subscription.add(upstream.clone());
    let boundary = AsyncBoundary::new(subscriber, self.scheduler);
    self.source.actual_subscribe(Subscriber::new(ObserveOnObserver { boundary }, upstream));
    subscription
  }
}

pub struct ObserveOnObserver<Item, Err, O, Sch> {
  boundary: Arc<AsyncBoundary<Item, Err, O, Sch>>,
}

impl<Item, Err, O, Sch> Observer<Item, Err> for ObserveOnObserver<Item, Err, O, Sch>
where
  Item: Send + 'static,
  Err: Send + 'static,
  O: Observer<Item, Err> + Send + 'static,
  Sch: Scheduler,
{
  fn next(&mut self, value: Item) { self.boundary.push(value) }

  fn error(&mut self, err: Err) { self.boundary.terminate(Terminal::Error(err)) }

  fn complete(&mut self) { self.boundary.terminate(Terminal::Complete) }

  fn is_finished(&self) -> bool { self.boundary.is_closed() }
}

pub(crate) struct BoundaryState<Item, Err> {
  queue: VecDeque<Item>,
  terminal: Option<Terminal<Err>>,
  draining: bool,
}

/// Outcome of offering a value to a bounded boundary.
pub(crate) enum Offer<Item> {
  Accepted,
  /// Accepted after evicting the returned oldest value.
  Evicted(Item),
  /// Not accepted, the queue stays as it was.
  Rejected(Item),
  /// Not accepted and the producer must be failed.
  Overflow(Item),
  /// The boundary no longer takes values.
  Closed,
}

/// A FIFO hand-off between a producer and a downstream subscriber served on
/// a scheduler.
///
/// At most one drain task is scheduled at a time; it delivers queued values
/// in order and the terminal event only once the queue is empty.
pub(crate) struct AsyncBoundary<Item, Err, O, Sch> {
  state: Mutex<BoundaryState<Item, Err>>,
  space: Condvar,
  observer: Mutex<Subscriber<O>>,
  subscription: SharedSubscription,
  scheduler: Sch,
}

impl<Item, Err, O, Sch> AsyncBoundary<Item, Err, O, Sch>
where
  Item: Send + 'static,
  Err: Send + 'static,
  O: Observer<Item, Err> + Send + 'static,
  Sch: Scheduler,
{
  pub(crate) fn new(subscriber: Subscriber<O>, scheduler: Sch) -> Arc<Self> {
    let subscription = subscriber.subscription.clone();
    let boundary = Arc::new(AsyncBoundary {
      state: Mutex::new(BoundaryState { queue: VecDeque::new(), terminal: None, draining: false }),
      space: Condvar::new(),
      observer: Mutex::new(subscriber),
      subscription: subscription.clone(),
      scheduler,
    });
    let weak = Arc::downgrade(&boundary);
    subscription.add_teardown(move || {
      if let Some(boundary) = weak.upgrade() {
        boundary.state.lock().queue.clear();
        boundary.space.notify_all();
      }
    });
    boundary
  }

  #[inline]
  pub(crate) fn is_closed(&self) -> bool { self.subscription.is_closed() }

  pub(crate) fn push(self: &Arc<Self>, value: Item) {
    let mut state = self.state.lock();
    if state.terminal.is_some() || self.is_closed() {
      return;
    }
    state.queue.push_back(value);
    let wake = Self::claim_drain(&mut state);
    drop(state);
    if wake {
      self.schedule_drain();
    }
  }

  /// Enqueues `value` unless `capacity` values are already waiting, in which
  /// case `strategy` decides.
  pub(crate) fn offer(self: &Arc<Self>, value: Item, capacity: usize, strategy: OverflowStrategy) -> Offer<Item> {
    let mut state = self.state.lock();
    if state.terminal.is_some() || self.is_closed() {
      return Offer::Closed;
    }
    let mut evicted = None;
    if state.queue.len() >= capacity {
      match strategy {
        OverflowStrategy::DropOldest => evicted = state.queue.pop_front(),
        OverflowStrategy::DropNewest => return Offer::Rejected(value),
        OverflowStrategy::Error => return Offer::Overflow(value),
        OverflowStrategy::BlockWithTimeout(timeout) => {
          self.wait_for_space(&mut state, capacity, timeout);
          if self.is_closed() {
            return Offer::Closed;
          }
          if state.queue.len() >= capacity {
            return Offer::Overflow(value);
          }
        }
      }
    }
    state.queue.push_back(value);
    let wake = Self::claim_drain(&mut state);
    drop(state);
    if wake {
      self.schedule_drain();
    }
    match evicted {
      Some(old) => Offer::Evicted(old),
      None => Offer::Accepted,
    }
  }

  fn wait_for_space(
    &self, state: &mut parking_lot::MutexGuard<'_, BoundaryState<Item, Err>>, capacity: usize, timeout: Duration,
  ) {
    let deadline = Instant::now().checked_add(timeout);
    while state.queue.len() >= capacity && !self.is_closed() {
      match deadline {
        Some(deadline) => {
          if self.space.wait_until(state, deadline).timed_out() {
            break;
          }
        }
        None => self.space.wait(state),
      }
    }
  }

  /// Records the terminal event; it is delivered after every queued value.
  pub(crate) fn terminate(self: &Arc<Self>, terminal: Terminal<Err>) {
    let mut state = self.state.lock();
    if state.terminal.is_some() {
      return;
    }
    state.terminal = Some(terminal);
    let wake = Self::claim_drain(&mut state);
    drop(state);
    if wake {
      self.schedule_drain();
    }
  }

  /// Marks a drain as pending. Returns false when one is already pending.
  fn claim_drain(state: &mut BoundaryState<Item, Err>) -> bool {
    if state.draining {
      return false;
    }
    state.draining = true;
    true
  }

  /// Must be called without holding `state`: a scheduler running the task
  /// in place drains before `schedule` returns.
  fn schedule_drain(self: &Arc<Self>) {
    if self.is_closed() {
      return;
    }
    let this = self.clone();
    let handle = self.scheduler.schedule(move || this.drain(), None);
    self.subscription.add(handle);
  }

  fn drain(&self) {
    loop {
      let mut state = self.state.lock();
      let popped = state.queue.pop_front();
      if let Some(value) = popped {
        drop(state);
        self.space.notify_one();
        self.observer.lock().next(value);
        continue;
      }
      let terminal = state.terminal.take();
      match terminal {
        Some(terminal) => {
          drop(state);
          terminal.accept(&mut *self.observer.lock());
        }
        None => state.draining = false,
      }
      return;
    }
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use parking_lot::Mutex;
  use std::{sync::Arc, time::Duration};

  #[test]
  fn nothing_before_the_scheduler_runs() {
    let scheduler = TestScheduler::default();
    let log = Arc::new(Mutex::new(vec![]));
    let (n, c) = (log.clone(), log.clone());
    observable::from_iter(0..5)
      .observe_on(scheduler.clone())
      .subscribe_all(move |v| n.lock().push(v), |_| {}, move || c.lock().push(-1));
    assert!(log.lock().is_empty());
    scheduler.advance_by(Duration::ZERO);
    assert_eq!(*log.lock(), vec![0, 1, 2, 3, 4, -1]);
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn error_after_queued_values() {
    let scheduler = TestScheduler::default();
    let log = Arc::new(Mutex::new(vec![]));
    let (n, e) = (log.clone(), log.clone());
    observable::create(|mut emitter: Emitter<i32, RxError>| {
      emitter.next(1);
      emitter.next(2);
      emitter.error(RxError::msg("late"));
    })
    .observe_on(scheduler.clone())
    .subscribe_err(move |v| n.lock().push(format!("{v}")), move |err| e.lock().push(format!("{err}")));
    scheduler.flush();
    assert_eq!(*log.lock(), vec!["1", "2", "late"]);
  }

  #[test]
  fn unsubscribe_drops_queued_values() {
    let scheduler = TestScheduler::default();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let subscription = observable::from_iter(0..5).observe_on(scheduler.clone()).subscribe(move |v| c_seen.lock().push(v));
    subscription.unsubscribe();
    scheduler.flush();
    assert!(seen.lock().is_empty());
  }

  #[test]
  fn immediate_scheduler_delivers_in_place() {
    let log = Arc::new(Mutex::new(vec![]));
    let (n, c) = (log.clone(), log.clone());
    observable::from_iter(0..3)
      .observe_on(ImmediateScheduler)
      .subscribe_all(move |v| n.lock().push(v), |_| {}, move || c.lock().push(-1));
    assert_eq!(*log.lock(), vec![0, 1, 2, -1]);
  }

  #[test]
  fn chained_immediate_boundaries() {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    observable::from_iter(0..4)
      .observe_on(ImmediateScheduler)
      .map(|v| v * 2)
      .observe_on(ImmediateScheduler)
      .subscribe(move |v| c_seen.lock().push(v));
    assert_eq!(*seen.lock(), vec![0, 2, 4, 6]);
  }

  #[test]
  fn fifo_across_threads() {
    let (tx, rx) = std::sync::mpsc::channel();
    let caller = std::thread::current().id();
    observable::from_iter(0..1000).observe_on(scheduler::computation()).subscribe(move |v| {
      tx.send((v, std::thread::current().id())).unwrap();
    });
    let got: Vec<_> = (0..1000).map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap()).collect();
    assert_eq!(got.iter().map(|(v, _)| *v).collect::<Vec<_>>(), (0..1000).collect::<Vec<_>>());
    assert!(got.iter().all(|(_, id)| *id != caller));
  }
}
