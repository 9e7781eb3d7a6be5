use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  subscriber::Subscriber,
  subscription::{SharedSubscription, SubscriptionLike},
};
use std::marker::PhantomData;

/// Creates an observable from a producer function.
///
/// The producer runs once per subscription and receives an owned [`Emitter`].
/// It may emit synchronously or move the emitter to another thread.
///
/// ```
/// use rxcore::prelude::*;
///
/// let source = observable::create(|mut emitter: Emitter<i32, RxError>| {
///   emitter.next(1);
///   emitter.next(2);
///   emitter.complete();
/// });
/// source.subscribe(|v| println!("{v}"));
/// ```
pub fn create<F, Item, Err>(producer: F) -> ObservableCreate<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>),
{
  ObservableCreate { producer, _marker: PhantomData }
}

pub struct ObservableCreate<F, Item, Err> {
  producer: F,
  _marker: PhantomData<fn() -> (Item, Err)>,
}

impl<F: Clone, Item, Err> Clone for ObservableCreate<F, Item, Err> {
  fn clone(&self) -> Self { ObservableCreate { producer: self.producer.clone(), _marker: PhantomData } }
}

impl<F, Item, Err> Observable for ObservableCreate<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) + Send + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    (self.producer)(Emitter { subscriber: subscriber.into_boxed() });
    subscription
  }
}

/// The producer's handle on its subscriber.
///
/// Values emitted after a terminal event, or after the subscriber
/// unsubscribed, are dropped silently; a second terminal event is ignored.
pub struct Emitter<Item, Err> {
  subscriber: Subscriber<BoxedObserver<Item, Err>>,
}

impl<Item, Err> Emitter<Item, Err> {
  #[inline]
  pub fn next(&mut self, value: Item) { self.subscriber.next(value) }

  #[inline]
  pub fn error(&mut self, err: Err) { self.subscriber.error(err) }

  #[inline]
  pub fn complete(&mut self) { self.subscriber.complete() }

  /// True once the stream ended or the subscriber unsubscribed. Push loops
  /// should check it before producing each value.
  #[inline]
  pub fn is_closed(&self) -> bool { self.subscriber.is_finished() }

  /// Registers cleanup run once when the subscription ends, for whatever
  /// reason it ends.
  pub fn add_teardown<T: FnOnce() + Send + 'static>(&self, teardown: T) {
    self.subscriber.subscription.add_teardown(teardown)
  }

  pub fn subscription(&self) -> &SharedSubscription { &self.subscriber.subscription }

  /// Ends the subscription without a terminal event.
  pub fn unsubscribe(&self) { self.subscriber.subscription.unsubscribe() }
}
