//! Bounded hand-off between a fast producer and a slower consumer.
//!
//! Both operators put an [`AsyncBoundary`] in front of the consumer: the
//! producer keeps running on its own thread and values wait in a bounded
//! queue until the consumer's scheduler picks them up. What happens when the
//! queue is full is decided by an [`OverflowStrategy`].

use super::observe_on::{AsyncBoundary, Offer};
use crate::{
  error::OverflowError,
  observable::Observable,
  observer::{Observer, Terminal},
  scheduler::Scheduler,
  subscriber::Subscriber,
  subscription::{SharedSubscription, SubscriptionLike},
};
use std::{sync::Arc, time::Duration};
use tracing::{trace, warn};

/// What a full backpressure buffer does with the next value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowStrategy {
  /// Evict the oldest buffered value to make room.
  DropOldest,
  /// Discard the incoming value.
  DropNewest,
  /// Deliver what is buffered, then fail with [`OverflowError`] and cancel
  /// the producer.
  Error,
  /// Park the producer until there is room; when the timeout elapses first,
  /// behave like [`OverflowStrategy::Error`].
  BlockWithTimeout(Duration),
}

#[derive(Clone)]
pub struct OnBackpressureBufferOp<S, F, Sch> {
  pub(crate) source: S,
  pub(crate) capacity: usize,
  pub(crate) strategy: OverflowStrategy,
  pub(crate) on_overflow: F,
  pub(crate) scheduler: Sch,
}

impl<S, F, Sch> Observable for OnBackpressureBufferOp<S, F, Sch>
where
  S: Observable,
  S::Err: From<OverflowError>,
  F: FnMut(S::Item) + Send + 'static,
  Sch: Scheduler,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let overflow_error: fn(OverflowError) -> S::Err = From::from;
    subscribe_bounded(
      self.source,
      subscriber,
      self.scheduler,
      self.capacity,
      self.strategy,
      self.on_overflow,
      Some(overflow_error),
    )
  }
}

/// Hands values over through a single slot; values arriving while it is
/// taken go to `on_drop`.
#[derive(Clone)]
pub struct OnBackpressureDropOp<S, F, Sch> {
  pub(crate) source: S,
  pub(crate) on_drop: F,
  pub(crate) scheduler: Sch,
}

impl<S, F, Sch> Observable for OnBackpressureDropOp<S, F, Sch>
where
  S: Observable,
  F: FnMut(S::Item) + Send + 'static,
  Sch: Scheduler,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    subscribe_bounded(self.source, subscriber, self.scheduler, 1, OverflowStrategy::DropNewest, self.on_drop, None)
  }
}

fn subscribe_bounded<S, O, F, Sch>(
  source: S, subscriber: Subscriber<O>, scheduler: Sch, capacity: usize, strategy: OverflowStrategy,
  on_overflow: F, overflow_error: Option<fn(OverflowError) -> S::Err>,
) -> SharedSubscription
where
  S: Observable,
  O: Observer<S::Item, S::Err> + Send + 'static,
  F: FnMut(S::Item) + Send + 'static,
  Sch: Scheduler,
{
  let subscription = subscriber.subscription.clone();
  let upstream = SharedSubscription::default();
  subscription.add(upstream.clone());
  let observer = BackpressureObserver {
    boundary: AsyncBoundary::new(subscriber, scheduler),
    upstream: upstream.clone(),
    capacity: capacity.max(1),
    strategy,
    on_overflow,
    overflow_error,
  };
  source.actual_subscribe(Subscriber::new(observer, upstream));
  subscription
}

pub struct BackpressureObserver<Item, Err, O, Sch, F> {
  boundary: Arc<AsyncBoundary<Item, Err, O, Sch>>,
  upstream: SharedSubscription,
  capacity: usize,
  strategy: OverflowStrategy,
  on_overflow: F,
  overflow_error: Option<fn(OverflowError) -> Err>,
}

impl<Item, Err, O, Sch, F> Observer<Item, Err> for BackpressureObserver<Item, Err, O, Sch, F>
where
  Item: Send + 'static,
  Err: Send + 'static,
  O: Observer<Item, Err> + Send + 'static,
  Sch: Scheduler,
  F: FnMut(Item),
{
  fn next(&mut self, value: Item) {
    match self.boundary.offer(value, self.capacity, self.strategy) {
      Offer::Accepted | Offer::Closed => {}
      Offer::Evicted(dropped) | Offer::Rejected(dropped) => {
        trace!(capacity = self.capacity, "backpressure buffer full, value dropped");
        (self.on_overflow)(dropped);
      }
      Offer::Overflow(dropped) => {
        (self.on_overflow)(dropped);
        if let Some(overflow_error) = self.overflow_error {
          warn!(capacity = self.capacity, strategy = ?self.strategy, "backpressure buffer overflowed");
          let err = overflow_error(OverflowError { capacity: self.capacity });
          self.boundary.terminate(Terminal::Error(err));
          self.upstream.unsubscribe();
        }
      }
    }
  }

  fn error(&mut self, err: Err) { self.boundary.terminate(Terminal::Error(err)) }

  fn complete(&mut self) { self.boundary.terminate(Terminal::Complete) }

  fn is_finished(&self) -> bool { self.upstream.is_closed() || self.boundary.is_closed() }
}
