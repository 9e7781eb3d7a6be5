//! Splits a stream into consecutive windows, each one a [`HoldSubject`] of
//! its own. The first window opens at subscription and closing a window
//! opens the next one right away, so windows cover the whole stream without
//! gaps. A window keeps its values until someone subscribes to it.
//!
//! On [`ImmediateScheduler`](crate::scheduler::ImmediateScheduler) a span
//! blocks the thread that starts it until it ends, so the time based
//! variants only suit sources that finish before their first span.

use crate::{
  observable::Observable,
  observer::Observer,
  scheduler::{Scheduler, TaskHandle},
  subject::HoldSubject,
  subscriber::Subscriber,
  subscription::{SharedSubscription, SubscriptionLike},
};
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};

#[derive(Clone)]
pub struct WindowCountOp<S> {
  pub(crate) source: S,
  pub(crate) count: usize,
}

impl<S> Observable for WindowCountOp<S>
where
  S: Observable,
  S::Item: Clone,
  S::Err: Clone,
{
  type Item = HoldSubject<S::Item, S::Err>;
  type Err = S::Err;

  fn actual_subscribe<O>(self, mut subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let current = HoldSubject::new();
    subscriber.next(current.clone());
    let observer = WindowCountObserver { observer: subscriber, current, size: 0, count: self.count.max(1) };
    self.source.actual_subscribe(Subscriber::new(observer, subscription))
  }
}

pub struct WindowCountObserver<O, Item, Err> {
  observer: O,
  current: HoldSubject<Item, Err>,
  size: usize,
  count: usize,
}

impl<O, Item, Err> Observer<Item, Err> for WindowCountObserver<O, Item, Err>
where
  O: Observer<HoldSubject<Item, Err>, Err>,
  Item: Clone,
  Err: Clone,
{
  fn next(&mut self, value: Item) {
    self.current.next(value);
    self.size += 1;
    if self.size >= self.count {
      self.current.complete();
      self.current = HoldSubject::new();
      self.size = 0;
      self.observer.next(self.current.clone());
    }
  }

  fn error(&mut self, err: Err) {
    self.current.error(err.clone());
    self.observer.error(err)
  }

  fn complete(&mut self) {
    self.current.complete();
    self.observer.complete()
  }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

/// Closes a window every `span`, or earlier once it received `count` values.
/// Closing by count restarts the span.
#[derive(Clone)]
pub struct WindowOp<S, Sch> {
  pub(crate) source: S,
  pub(crate) count: usize,
  pub(crate) span: Duration,
  pub(crate) scheduler: Sch,
}

struct WindowState<Item, Err, O> {
  observer: Subscriber<O>,
  current: HoldSubject<Item, Err>,
  size: usize,
  generation: u64,
  timer: Option<TaskHandle>,
}

struct WindowCtx<Item, Err, O, Sch> {
  state: Mutex<WindowState<Item, Err, O>>,
  count: usize,
  span: Duration,
  scheduler: Sch,
  subscription: SharedSubscription,
}

impl<S, Sch> Observable for WindowOp<S, Sch>
where
  S: Observable,
  S::Item: Clone,
  S::Err: Clone,
  Sch: Scheduler,
{
  type Item = HoldSubject<S::Item, S::Err>;
  type Err = S::Err;

  fn actual_subscribe<O>(self, mut subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let current = HoldSubject::new();
    subscriber.next(current.clone());
    let ctx = Arc::new(WindowCtx {
      state: Mutex::new(WindowState { observer: subscriber, current, size: 0, generation: 0, timer: None }),
      count: self.count.max(1),
      span: self.span,
      scheduler: self.scheduler,
      subscription: subscription.clone(),
    });
    let observer = WindowObserver { ctx: ctx.clone() };
    let subscription = self.source.actual_subscribe(Subscriber::new(observer, subscription));
    ctx.arm(0);
    subscription
  }
}

impl<Item, Err, O, Sch> WindowCtx<Item, Err, O, Sch>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  O: Observer<HoldSubject<Item, Err>, Err> + Send + 'static,
  Sch: Scheduler,
{
  /// Starts the span of window `generation`. Must be called without holding
  /// `state`.
  fn arm(self: &Arc<Self>, generation: u64) {
    if self.subscription.is_closed() || self.state.lock().generation != generation {
      return;
    }
    let this = self.clone();
    let handle = self.scheduler.schedule(
      move || {
        let mut state = this.state.lock();
        if state.generation == generation && !state.observer.is_finished() {
          let next = this.rotate(&mut state);
          drop(state);
          this.arm(next);
        }
      },
      Some(self.span),
    );
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

  /// Completes the current window and emits a fresh one. Returns the
  /// generation whose span the caller arms next.
  fn rotate(&self, state: &mut WindowState<Item, Err, O>) -> u64 {
    if let Some(timer) = state.timer.take() {
      timer.unsubscribe();
    }
    state.current.complete();
    state.current = HoldSubject::new();
    state.size = 0;
    state.generation = state.generation.wrapping_add(1);
    let window = state.current.clone();
    state.observer.next(window);
    state.generation
  }
}

pub struct WindowObserver<Item, Err, O, Sch> {
  ctx: Arc<WindowCtx<Item, Err, O, Sch>>,
}

impl<Item, Err, O, Sch> Observer<Item, Err> for WindowObserver<Item, Err, O, Sch>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  O: Observer<HoldSubject<Item, Err>, Err> + Send + 'static,
  Sch: Scheduler,
{
  fn next(&mut self, value: Item) {
    let mut state = self.ctx.state.lock();
    state.current.next(value);
    state.size += 1;
    if state.size >= self.ctx.count {
      let next = self.ctx.rotate(&mut state);
      drop(state);
      self.ctx.arm(next);
    }
  }

  fn error(&mut self, err: Err) {
    let mut state = self.ctx.state.lock();
    state.current.error(err.clone());
    state.observer.error(err)
  }

  fn complete(&mut self) {
    let mut state = self.ctx.state.lock();
    state.current.complete();
    state.observer.complete()
  }

  fn is_finished(&self) -> bool { self.ctx.subscription.is_closed() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use parking_lot::Mutex;
  use std::{sync::Arc, time::Duration};

  type Windows = Arc<Mutex<Vec<Arc<Mutex<Vec<i32>>>>>>;

  /// Subscribes every emitted window and records its values.
  fn collect_windows<S>(source: S) -> Windows
  where
    S: Observable<Item = HoldSubject<i32, RxError>, Err = RxError>,
  {
    let windows = Windows::default();
    let c_windows = windows.clone();
    source.subscribe_err(
      move |window| {
        let values = Arc::new(Mutex::new(vec![]));
        c_windows.lock().push(values.clone());
        window.subscribe_err(move |v| values.lock().push(v), |_| {});
      },
      |_| {},
    );
    windows
  }

  fn snapshot(windows: &Windows) -> Vec<Vec<i32>> { windows.lock().iter().map(|w| w.lock().clone()).collect() }

  #[test]
  fn count_windows() {
    let windows = collect_windows(observable::from_iter(0..5).into_fallible::<RxError>().window_count(2));
    assert_eq!(snapshot(&windows), vec![vec![0, 1], vec![2, 3], vec![4]]);
  }

  #[test]
  fn window_holds_values_until_subscribed() {
    let windows = Arc::new(Mutex::new(vec![]));
    let c_windows = windows.clone();
    observable::from_iter(0..4)
      .into_fallible::<RxError>()
      .window_count(3)
      .subscribe(move |w| c_windows.lock().push(w));

    let windows = std::mem::take(&mut *windows.lock());
    assert_eq!(windows.len(), 2);
    let seen = Arc::new(Mutex::new(vec![]));
    for window in windows {
      let c_seen = seen.clone();
      window.subscribe_all(move |v| c_seen.lock().push(v), |_| {}, || {});
    }
    assert_eq!(*seen.lock(), vec![0, 1, 2, 3]);
  }

  #[test]
  fn error_reaches_open_window() {
    let errors = Arc::new(Mutex::new(vec![]));
    let c_errors = errors.clone();
    observable::throw::<i32, _>(RxError::msg("boom")).window_count(2).subscribe_err(
      move |w| {
        let c_errors = c_errors.clone();
        w.subscribe_err(|_| {}, move |e| c_errors.lock().push(format!("window {e}")));
      },
      |_| {},
    );
    assert_eq!(*errors.lock(), vec!["window boom"]);
  }

  #[test]
  fn time_or_count_windows() {
    let scheduler = TestScheduler::default();
    let subject = Subject::<i32, RxError>::new();
    let windows = collect_windows(subject.clone().window(3, Duration::from_millis(10), scheduler.clone()));
    assert_eq!(windows.lock().len(), 1);

    subject.next(1);
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(snapshot(&windows), vec![vec![1], vec![]]);

    subject.next(2);
    subject.next(3);
    subject.next(4);
    subject.next(5);
    assert_eq!(snapshot(&windows), vec![vec![1], vec![2, 3, 4], vec![5]]);

    // the count rotation restarted the span at 10ms
    scheduler.advance_by(Duration::from_millis(10));
    subject.complete();
    assert_eq!(snapshot(&windows), vec![vec![1], vec![2, 3, 4], vec![5], vec![]]);
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn immediate_scheduler_with_synchronous_source() {
    let source = observable::from_iter(0..5).into_fallible::<RxError>();
    let windows = collect_windows(source.window(3, Duration::from_millis(10), ImmediateScheduler).take(2));
    // the count rotation emits the second window, which ends the take
    assert_eq!(snapshot(&windows), vec![vec![0, 1, 2], vec![]]);

    let source = observable::from_iter(0..2).into_fallible::<RxError>();
    let windows = collect_windows(source.window(3, Duration::from_millis(10), ImmediateScheduler));
    assert_eq!(snapshot(&windows), vec![vec![0, 1]]);
  }
}
