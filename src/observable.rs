//! The [`Observable`] trait, the factories that create sources, and
//! [`ObservableExt`], which chains operators onto any observable.

use crate::{
  error::{CompositeError, OverflowError},
  observer::{Observer, ObserverAll, ObserverN},
  ops::{
    backpressure::{OnBackpressureBufferOp, OnBackpressureDropOp, OverflowStrategy},
    buffer::{BufferCountOp, BufferTimeOp},
    default_if_empty::DefaultIfEmptyOp,
    filter::{FilterOp, TryFilterOp},
    finalize::{FinalizeOp, OnDisposeOp},
    flat_map::FlatMapOp,
    group_by::GroupByOp,
    map::{MapOp, TryMapOp},
    map_err::MapErrOp,
    observe_on::ObserveOnOp,
    on_error::{OnErrorResumeNextOp, OnErrorReturnOp},
    repeat::RepeatOp,
    retry::{RetryIf, RetryOp, RetryPolicy},
    retry_when::RetryWhenOp,
    sample::SampleOp,
    scan::ScanOp,
    skip::SkipOp,
    skip_while::SkipWhileOp,
    start_with::StartWithOp,
    subscribe_on::SubscribeOnOp,
    take::TakeOp,
    take_until::TakeUntilOp,
    take_while::TakeWhileOp,
    tap::{TapOp, TryTapErrorOp},
    window::{WindowCountOp, WindowOp},
  },
  scheduler::{self, Scheduler, ThreadPoolScheduler},
  subject::Subject,
  subscriber::Subscriber,
  subscription::{SharedSubscription, SubscriptionWrapper},
};
use std::{convert::Infallible, hash::Hash, time::Duration};

mod connectable;
mod create;
mod defer;
mod from_iter;
mod interval;
mod timer;
mod trivial;
mod using;

pub use connectable::*;
pub use create::*;
pub use defer::*;
pub use from_iter::*;
pub use interval::*;
pub use timer::*;
pub use trivial::*;
pub use using::*;

/// A representation of any set of values over any amount of time.
///
/// An observable is a recipe: nothing runs until it is subscribed, and every
/// subscription runs it again (a cold source). Subjects and
/// [`ConnectableObservable`] are the hot exceptions that share one run.
///
/// Implementations only provide `actual_subscribe`; the user facing
/// operators and `subscribe` methods live on [`ObservableExt`].
pub trait Observable: Sized + Send + 'static {
  type Item: Send + 'static;
  type Err: Send + 'static;

  /// Starts producing into `subscriber` and returns the subscription that
  /// cancels the run. The subscription is the one carried by `subscriber`.
  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static;
}

pub trait ObservableExt: Observable {
  // ---------------------------------------------------------------- subscribe

  /// Subscribes with a `next` handler only. An error arriving here is
  /// logged and dropped.
  fn subscribe<N>(self, next: N) -> SubscriptionWrapper<SharedSubscription>
  where
    N: FnMut(Self::Item) + Send + 'static,
  {
    self.subscribe_with(ObserverN::new(next))
  }

  fn subscribe_err<N, E>(self, next: N, error: E) -> SubscriptionWrapper<SharedSubscription>
  where
    N: FnMut(Self::Item) + Send + 'static,
    E: FnMut(Self::Err) + Send + 'static,
  {
    self.subscribe_with(ObserverAll::new(next, error, || {}))
  }

  fn subscribe_all<N, E, C>(self, next: N, error: E, complete: C) -> SubscriptionWrapper<SharedSubscription>
  where
    N: FnMut(Self::Item) + Send + 'static,
    E: FnMut(Self::Err) + Send + 'static,
    C: FnMut() + Send + 'static,
  {
    self.subscribe_with(ObserverAll::new(next, error, complete))
  }

  /// Subscribes any [`Observer`], a subject included.
  fn subscribe_with<O>(self, observer: O) -> SubscriptionWrapper<SharedSubscription>
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    SubscriptionWrapper(self.actual_subscribe(Subscriber::shared(observer)))
  }

  // ------------------------------------------------------------------- errors

  /// Gives a source that cannot fail an error type, so it can be combined
  /// with fallible streams.
  fn into_fallible<E>(self) -> MapErrOp<Self, fn(Infallible) -> E>
  where
    Self: Observable<Err = Infallible>,
    E: Send + 'static,
  {
    let func: fn(Infallible) -> E = |never| match never {};
    MapErrOp { source: self, func }
  }

  fn map_err<F, E>(self, func: F) -> MapErrOp<Self, F>
  where
    F: FnMut(Self::Err) -> E + Send + 'static,
    E: Send + 'static,
  {
    MapErrOp { source: self, func }
  }

  // ---------------------------------------------------------------- transform

  /// Creates a new stream which calls a closure on each element and uses
  /// its return as the value.
  fn map<F, B>(self, func: F) -> MapOp<Self, F>
  where
    F: FnMut(Self::Item) -> B + Send + 'static,
    B: Send + 'static,
  {
    MapOp { source: self, func }
  }

  /// Like `map`, but an `Err` returned by `func` terminates the stream with
  /// that error.
  fn try_map<F, B>(self, func: F) -> TryMapOp<Self, F>
  where
    F: FnMut(Self::Item) -> Result<B, Self::Err> + Send + 'static,
    B: Send + 'static,
  {
    TryMapOp { source: self, func }
  }

  fn filter<F>(self, filter: F) -> FilterOp<Self, F>
  where
    F: FnMut(&Self::Item) -> bool + Send + 'static,
  {
    FilterOp { source: self, filter }
  }

  fn try_filter<F>(self, filter: F) -> TryFilterOp<Self, F>
  where
    F: FnMut(&Self::Item) -> Result<bool, Self::Err> + Send + 'static,
  {
    TryFilterOp { source: self, filter }
  }

  /// Maps every value to an inner observable and merges their emissions.
  ///
  /// The result completes once the source and every inner observable have
  /// completed; any error ends everything.
  fn flat_map<F, Inner>(self, func: F) -> FlatMapOp<Self, F>
  where
    F: FnMut(Self::Item) -> Inner + Send + 'static,
    Inner: Observable<Err = Self::Err>,
  {
    FlatMapOp { source: self, func }
  }

  /// Emits each running accumulation of `func` over the values, starting
  /// from `seed`. The seed itself is not emitted.
  fn scan<F, Acc>(self, seed: Acc, func: F) -> ScanOp<Self, F, Acc>
  where
    F: FnMut(Acc, Self::Item) -> Acc + Send + 'static,
    Acc: Clone + Send + 'static,
  {
    ScanOp { source: self, func, seed }
  }

  /// Splits the stream by the key `discr` computes for each value. A
  /// [`GroupedObservable`](crate::ops::group_by::GroupedObservable) is emitted
  /// the first time a key shows up.
  fn group_by<F, Key>(self, discr: F) -> GroupByOp<Self, F>
  where
    Self::Item: Clone,
    Self::Err: Clone,
    F: FnMut(&Self::Item) -> Key + Send + 'static,
    Key: Hash + Eq + Clone + Send + 'static,
  {
    GroupByOp { source: self, discr }
  }

  // ---------------------------------------------------------------- filtering

  /// Emits only the first `count` values, then completes.
  fn take(self, count: usize) -> TakeOp<Self> { TakeOp { source: self, count } }

  fn skip(self, count: usize) -> SkipOp<Self> { SkipOp { source: self, count } }

  /// Emits values while `predicate` holds and completes at the first value
  /// that fails it, without emitting that value.
  fn take_while<F>(self, predicate: F) -> TakeWhileOp<Self, F>
  where
    F: FnMut(&Self::Item) -> bool + Send + 'static,
  {
    TakeWhileOp { source: self, predicate }
  }

  /// Emits values until one satisfies `predicate`; that value is emitted,
  /// then the stream completes.
  fn take_until<F>(self, predicate: F) -> TakeUntilOp<Self, F>
  where
    F: FnMut(&Self::Item) -> bool + Send + 'static,
  {
    TakeUntilOp { source: self, predicate }
  }

  fn skip_while<F>(self, predicate: F) -> SkipWhileOp<Self, F>
  where
    F: FnMut(&Self::Item) -> bool + Send + 'static,
  {
    SkipWhileOp { source: self, predicate }
  }

  fn start_with(self, values: Vec<Self::Item>) -> StartWithOp<Self, Self::Item> {
    StartWithOp { source: self, values }
  }

  /// Emits `default` when the source completes without a single value.
  fn default_if_empty(self, default: Self::Item) -> DefaultIfEmptyOp<Self, Self::Item> {
    DefaultIfEmptyOp { source: self, default }
  }

  // ------------------------------------------------------------ error recovery

  /// Re-subscribes after an error as long as `policy` allows it. Delayed
  /// retries wait on the computation pool.
  ///
  /// `retry(3)` allows up to four subscriptions; `retry(usize::MAX)` never
  /// gives up.
  fn retry<P>(self, policy: P) -> RetryOp<Self, P, ThreadPoolScheduler>
  where
    Self: Clone,
    P: RetryPolicy<Self::Err>,
  {
    self.retry_on(policy, scheduler::computation())
  }

  /// Like `retry`, waiting out retry delays on `scheduler`.
  fn retry_on<P, Sch>(self, policy: P, scheduler: Sch) -> RetryOp<Self, P, Sch>
  where
    Self: Clone,
    P: RetryPolicy<Self::Err>,
    Sch: Scheduler,
  {
    RetryOp { source: self, policy, scheduler }
  }

  /// Retries at most `max` times, and only errors `predicate` accepts.
  fn retry_if<F>(self, max: usize, predicate: F) -> RetryOp<Self, RetryIf<F>, ThreadPoolScheduler>
  where
    Self: Clone,
    F: Fn(&Self::Err) -> bool + Send + Sync + 'static,
  {
    self.retry(RetryIf { max, predicate })
  }

  fn retry_when<F, N>(self, handler: F) -> RetryWhenOp<Self, F>
  where
    Self: Clone,
    Self::Err: Clone,
    F: FnOnce(Subject<Self::Err, Self::Err>) -> N + Send + 'static,
    N: Observable<Err = Self::Err>,
  {
    RetryWhenOp { source: self, handler }
  }

  /// Runs the source `count` times in a row.
  fn repeat(self, count: usize) -> RepeatOp<Self>
  where
    Self: Clone,
  {
    RepeatOp { source: self, count }
  }

  /// Turns an error into a last value followed by completion.
  fn on_error_return<F>(self, func: F) -> OnErrorReturnOp<Self, F>
  where
    F: FnMut(Self::Err) -> Self::Item + Send + 'static,
  {
    OnErrorReturnOp { source: self, func }
  }

  /// Continues with the observable `func` builds from the error.
  fn on_error_resume_next<F, R>(self, func: F) -> OnErrorResumeNextOp<Self, F>
  where
    F: FnOnce(Self::Err) -> R + Send + 'static,
    R: Observable<Item = Self::Item, Err = Self::Err>,
  {
    OnErrorResumeNextOp { source: self, func }
  }

  // ------------------------------------------------------------- side effects

  fn tap<F>(self, func: F) -> TapOp<Self, F, fn(&Self::Err), fn()>
  where
    F: FnMut(&Self::Item) + Send + 'static,
  {
    let error: fn(&Self::Err) = |_| {};
    let complete: fn() = || {};
    TapOp { source: self, next: func, error, complete }
  }

  fn tap_error<F>(self, func: F) -> TapOp<Self, fn(&Self::Item), F, fn()>
  where
    F: FnMut(&Self::Err) + Send + 'static,
  {
    let next: fn(&Self::Item) = |_| {};
    let complete: fn() = || {};
    TapOp { source: self, next, error: func, complete }
  }

  /// Runs a fallible handler on the error before forwarding it. When the
  /// handler fails too, both errors travel on as one [`CompositeError`].
  fn try_tap_error<F>(self, func: F) -> TryTapErrorOp<Self, F>
  where
    Self::Err: From<CompositeError<Self::Err>>,
    F: FnMut(&Self::Err) -> Result<(), Self::Err> + Send + 'static,
  {
    TryTapErrorOp { source: self, func }
  }

  fn tap_complete<F>(self, func: F) -> TapOp<Self, fn(&Self::Item), fn(&Self::Err), F>
  where
    F: FnMut() + Send + 'static,
  {
    let next: fn(&Self::Item) = |_| {};
    let error: fn(&Self::Err) = |_| {};
    TapOp { source: self, next, error, complete: func }
  }

  /// Runs `func` exactly once when the subscription ends, whether by
  /// completion, error or unsubscribe.
  fn finalize<F>(self, func: F) -> FinalizeOp<Self, F>
  where
    F: FnOnce() + Send + 'static,
  {
    FinalizeOp { source: self, func }
  }

  /// Runs `func` only when the subscription is cancelled before the source
  /// terminated.
  fn on_dispose<F>(self, func: F) -> OnDisposeOp<Self, F>
  where
    F: FnOnce() + Send + 'static,
  {
    OnDisposeOp { source: self, func }
  }

  // --------------------------------------------------------------- schedulers

  /// Delivers every event on `scheduler`, in source order.
  fn observe_on<Sch: Scheduler>(self, scheduler: Sch) -> ObserveOnOp<Self, Sch> {
    ObserveOnOp { source: self, scheduler }
  }

  /// Subscribes to the source from a task on `scheduler`.
  fn subscribe_on<Sch: Scheduler>(self, scheduler: Sch) -> SubscribeOnOp<Self, Sch> {
    SubscribeOnOp { source: self, scheduler }
  }

  // ------------------------------------------------------------- backpressure

  /// Decouples producer and consumer with a queue of at most `capacity`
  /// values, consumed on `scheduler`. `strategy` decides what a full queue
  /// does.
  fn on_backpressure_buffer<Sch>(
    self, capacity: usize, strategy: OverflowStrategy, scheduler: Sch,
  ) -> OnBackpressureBufferOp<Self, fn(Self::Item), Sch>
  where
    Self::Err: From<OverflowError>,
    Sch: Scheduler,
  {
    self.on_backpressure_buffer_with(capacity, strategy, drop as fn(Self::Item), scheduler)
  }

  /// Like `on_backpressure_buffer`, handing every dropped value to
  /// `on_overflow`.
  fn on_backpressure_buffer_with<F, Sch>(
    self, capacity: usize, strategy: OverflowStrategy, on_overflow: F, scheduler: Sch,
  ) -> OnBackpressureBufferOp<Self, F, Sch>
  where
    Self::Err: From<OverflowError>,
    F: FnMut(Self::Item) + Send + 'static,
    Sch: Scheduler,
  {
    OnBackpressureBufferOp { source: self, capacity, strategy, on_overflow, scheduler }
  }

  /// Hands values to a consumer on `scheduler` one at a time; whatever
  /// arrives while the consumer is busy goes to `on_drop`.
  fn on_backpressure_drop<F, Sch>(self, on_drop: F, scheduler: Sch) -> OnBackpressureDropOp<Self, F, Sch>
  where
    F: FnMut(Self::Item) + Send + 'static,
    Sch: Scheduler,
  {
    OnBackpressureDropOp { source: self, on_drop, scheduler }
  }

  fn sample<Sch: Scheduler>(self, period: Duration, scheduler: Sch) -> SampleOp<Self, Sch> {
    SampleOp { source: self, period, scheduler }
  }

  // ---------------------------------------------------------------- windowing

  fn buffer_count(self, count: usize) -> BufferCountOp<Self> { BufferCountOp { source: self, count } }

  fn buffer_time<Sch: Scheduler>(self, span: Duration, scheduler: Sch) -> BufferTimeOp<Self, Sch> {
    BufferTimeOp { source: self, span, count: None, scheduler }
  }

  /// Buffers closed by `count` values or by `span`, whichever comes first.
  fn buffer<Sch: Scheduler>(self, count: usize, span: Duration, scheduler: Sch) -> BufferTimeOp<Self, Sch> {
    BufferTimeOp { source: self, span, count: Some(count), scheduler }
  }

  /// Windows closed by `count` values or by `span`, whichever comes first.
  fn window<Sch: Scheduler>(self, count: usize, span: Duration, scheduler: Sch) -> WindowOp<Self, Sch>
  where
    Self::Item: Clone,
    Self::Err: Clone,
  {
    WindowOp { source: self, count, span, scheduler }
  }

  fn window_count(self, count: usize) -> WindowCountOp<Self>
  where
    Self::Item: Clone,
    Self::Err: Clone,
  {
    WindowCountOp { source: self, count }
  }

  // ---------------------------------------------------------------- composing

  /// Applies a reusable piece of pipeline.
  ///
  /// ```
  /// use rxcore::prelude::*;
  ///
  /// fn evens<S: Observable<Item = i32>>(source: S) -> impl Observable<Item = i32, Err = S::Err> {
  ///   source.filter(|v| v % 2 == 0)
  /// }
  ///
  /// let mut seen = vec![];
  /// let (tx, rx) = std::sync::mpsc::channel();
  /// observable::from_iter(0..6).compose(evens).subscribe(move |v| tx.send(v).unwrap());
  /// seen.extend(rx.try_iter());
  /// assert_eq!(seen, vec![0, 2, 4]);
  /// ```
  fn compose<F, R>(self, func: F) -> R
  where
    F: FnOnce(Self) -> R,
  {
    func(self)
  }

  /// Shares one run of this source between subscribers; see
  /// [`ConnectableObservable`].
  fn publish(self) -> ConnectableObservable<Self>
  where
    Self::Item: Clone,
    Self::Err: Clone,
  {
    ConnectableObservable::new(self)
  }
}

impl<T: Observable> ObservableExt for T {}
