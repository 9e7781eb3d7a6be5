//! Batching operators. Values are collected into `Vec`s that are closed by a
//! count, a time span, or whichever of the two comes first.
//!
//! Empty buffers are never emitted. Completion flushes a non-empty partial
//! buffer before completing; an error discards it.
//!
//! On [`ImmediateScheduler`](crate::scheduler::ImmediateScheduler) a span
//! blocks the thread that starts it until it ends, so the time based
//! variants only suit sources that finish before their first span.

use crate::{
  observable::Observable,
  observer::Observer,
  scheduler::{Scheduler, TaskHandle},
  subscriber::Subscriber,
  subscription::{SharedSubscription, SubscriptionLike},
};
use parking_lot::Mutex;
use std::{marker::PhantomData, sync::Arc, time::Duration};

#[derive(Clone)]
pub struct BufferCountOp<S> {
  pub(crate) source: S,
  pub(crate) count: usize,
}

impl<S> Observable for BufferCountOp<S>
where
  S: Observable,
{
  type Item = Vec<S::Item>;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let count = self.count.max(1);
    let observer = BufferCountObserver { observer: subscriber, buffer: Vec::with_capacity(count), count };
    self.source.actual_subscribe(Subscriber::new(observer, subscription))
  }
}

pub struct BufferCountObserver<O, Item> {
  observer: O,
  buffer: Vec<Item>,
  count: usize,
}

impl<O, Item, Err> Observer<Item, Err> for BufferCountObserver<O, Item>
where
  O: Observer<Vec<Item>, Err>,
{
  fn next(&mut self, value: Item) {
    self.buffer.push(value);
    if self.buffer.len() >= self.count {
      let buffer = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.count));
      self.observer.next(buffer);
    }
  }

  fn error(&mut self, err: Err) {
    self.buffer.clear();
    self.observer.error(err)
  }

  fn complete(&mut self) {
    if !self.buffer.is_empty() {
      let buffer = std::mem::take(&mut self.buffer);
      self.observer.next(buffer);
    }
    self.observer.complete()
  }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

/// Closes a buffer every `span`, or earlier when it reaches `count` values.
/// Closing by count restarts the span.
#[derive(Clone)]
pub struct BufferTimeOp<S, Sch> {
  pub(crate) source: S,
  pub(crate) span: Duration,
  pub(crate) count: Option<usize>,
  pub(crate) scheduler: Sch,
}

struct BufferState<Item, O> {
  observer: Subscriber<O>,
  buffer: Vec<Item>,
  /// Bumped whenever a buffer closes; a timer of an older generation does
  /// nothing when it fires.
  generation: u64,
  timer: Option<TaskHandle>,
}

struct BufferCtx<Item, Err, O, Sch> {
  state: Mutex<BufferState<Item, O>>,
  span: Duration,
  count: Option<usize>,
  scheduler: Sch,
  subscription: SharedSubscription,
  _err: PhantomData<fn(Err)>,
}

impl<S, Sch> Observable for BufferTimeOp<S, Sch>
where
  S: Observable,
  Sch: Scheduler,
{
  type Item = Vec<S::Item>;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let ctx = Arc::new(BufferCtx {
      state: Mutex::new(BufferState { observer: subscriber, buffer: vec![], generation: 0, timer: None }),
      span: self.span,
      count: self.count.map(|c| c.max(1)),
      scheduler: self.scheduler,
      subscription: subscription.clone(),
      _err: PhantomData,
    });
    let observer = BufferTimeObserver { ctx: ctx.clone() };
    let subscription = self.source.actual_subscribe(Subscriber::new(observer, subscription));
    // after the source: an in-place scheduler runs the span before returning
    ctx.arm(0);
    subscription
  }
}

impl<Item, Err, O, Sch> BufferCtx<Item, Err, O, Sch>
where
  Item: Send + 'static,
  Err: Send + 'static,
  O: Observer<Vec<Item>, Err> + Send + 'static,
  Sch: Scheduler,
{
  /// Starts the span of `generation` unless a newer buffer already took
  /// over. Called without holding `state`, since a scheduler may run the
  /// timer in place.
  fn arm(self: &Arc<Self>, generation: u64) {
    if self.subscription.is_closed() || self.state.lock().generation != generation {
      return;
    }
    let this = self.clone();
    let handle = self.scheduler.schedule(move || this.on_span_end(generation), Some(self.span));
    self.subscription.add(handle.clone());
    let mut state = self.state.lock();
    if state.generation == generation {
      if let Some(stale) = state.timer.replace(handle) {
        stale.unsubscribe();
      }
    } else {
      handle.unsubscribe();
    }
  }

  fn on_span_end(self: &Arc<Self>, generation: u64) {
    let mut state = self.state.lock();
    if state.generation != generation || state.observer.is_finished() {
      return;
    }
    let next = self.close(&mut state);
    drop(state);
    self.arm(next);
  }

  /// Emits the current buffer if it holds anything, cancels its timer and
  /// returns the generation of the next buffer.
  fn close(&self, state: &mut BufferState<Item, O>) -> u64 {
    if !state.buffer.is_empty() {
      let buffer = std::mem::take(&mut state.buffer);
      state.observer.next(buffer);
    }
    if let Some(timer) = state.timer.take() {
      timer.unsubscribe();
    }
    state.generation = state.generation.wrapping_add(1);
    state.generation
  }
}

pub struct BufferTimeObserver<Item, Err, O, Sch> {
  ctx: Arc<BufferCtx<Item, Err, O, Sch>>,
}

impl<Item, Err, O, Sch> Observer<Item, Err> for BufferTimeObserver<Item, Err, O, Sch>
where
  Item: Send + 'static,
  Err: Send + 'static,
  O: Observer<Vec<Item>, Err> + Send + 'static,
  Sch: Scheduler,
{
  fn next(&mut self, value: Item) {
    let mut state = self.ctx.state.lock();
    state.buffer.push(value);
    if self.ctx.count.map_or(false, |count| state.buffer.len() >= count) {
      let next = self.ctx.close(&mut state);
      drop(state);
      self.ctx.arm(next);
    }
  }

  fn error(&mut self, err: Err) {
    let mut state = self.ctx.state.lock();
    state.buffer.clear();
    state.observer.error(err)
  }

  fn complete(&mut self) {
    let mut state = self.ctx.state.lock();
    if !state.buffer.is_empty() {
      let buffer = std::mem::take(&mut state.buffer);
      state.observer.next(buffer);
    }
    state.observer.complete()
  }

  fn is_finished(&self) -> bool { self.ctx.subscription.is_closed() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use parking_lot::Mutex;
  use std::{sync::Arc, time::Duration};

  #[test]
  fn count_boundaries() {
    let log = Arc::new(Mutex::new(vec![]));
    let (n, c) = (log.clone(), log.clone());
    observable::from_iter(0..7)
      .buffer_count(3)
      .subscribe_all(move |v| n.lock().push(v), |_| {}, move || c.lock().push(vec![-1]));
    assert_eq!(*log.lock(), vec![vec![0, 1, 2], vec![3, 4, 5], vec![6], vec![-1]]);
  }

  #[test]
  fn exact_multiple_has_no_trailing_empty_buffer() {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    observable::from_iter(0..4).buffer_count(2).subscribe(move |v| c_seen.lock().push(v));
    assert_eq!(*seen.lock(), vec![vec![0, 1], vec![2, 3]]);
  }

  #[test]
  fn error_discards_partial_buffer() {
    let log = Arc::new(Mutex::new(vec![]));
    let (n, e) = (log.clone(), log.clone());
    observable::create(|mut emitter: Emitter<i32, RxError>| {
      emitter.next(1);
      emitter.next(2);
      emitter.next(3);
      emitter.error(RxError::msg("boom"));
    })
    .buffer_count(2)
    .subscribe_err(move |v| n.lock().push(format!("{v:?}")), move |err| e.lock().push(format!("{err}")));
    assert_eq!(*log.lock(), vec!["[1, 2]", "boom"]);
  }

  #[test]
  fn time_boundaries() {
    let scheduler = TestScheduler::default();
    let subject = Subject::<i32, RxError>::new();
    let log = Arc::new(Mutex::new(vec![]));
    let (n, c) = (log.clone(), log.clone());
    subject
      .clone()
      .buffer_time(Duration::from_millis(10), scheduler.clone())
      .subscribe_all(move |v| n.lock().push(v), |_| {}, move || c.lock().push(vec![-1]));

    subject.next(1);
    subject.next(2);
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*log.lock(), vec![vec![1, 2]]);

    // an empty span emits nothing
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(log.lock().len(), 1);

    subject.next(3);
    subject.complete();
    assert_eq!(*log.lock(), vec![vec![1, 2], vec![3], vec![-1]]);
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn count_or_time_whichever_first() {
    let scheduler = TestScheduler::default();
    let subject = Subject::<i32, RxError>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let (c_seen, clock) = (seen.clone(), scheduler.clone());
    subject
      .clone()
      .buffer(2, Duration::from_millis(10), scheduler.clone())
      .subscribe(move |v| c_seen.lock().push((clock.now(), v)));

    scheduler.advance_by(Duration::from_millis(4));
    subject.next(1);
    subject.next(2);
    subject.next(3);
    // the count closed the first buffer at 4ms and restarted the span
    scheduler.advance_by(Duration::from_millis(9));
    assert_eq!(seen.lock().len(), 1);
    scheduler.advance_by(Duration::from_millis(1));
    assert_eq!(
      *seen.lock(),
      vec![(Duration::from_millis(4), vec![1, 2]), (Duration::from_millis(14), vec![3])]
    );
  }

  #[test]
  fn immediate_scheduler_with_synchronous_source() {
    let log = Arc::new(Mutex::new(vec![]));
    let (n, c) = (log.clone(), log.clone());
    observable::from_iter(0..3)
      .buffer_time(Duration::from_millis(10), ImmediateScheduler)
      .subscribe_all(move |v| n.lock().push(v), |_| {}, move || c.lock().push(vec![-1]));
    assert_eq!(*log.lock(), vec![vec![0, 1, 2], vec![-1]]);

    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    observable::from_iter(0..6)
      .buffer(2, Duration::from_millis(1), ImmediateScheduler)
      .take(1)
      .subscribe(move |v| c_seen.lock().push(v));
    assert_eq!(*seen.lock(), vec![vec![0, 1]]);
  }
}
