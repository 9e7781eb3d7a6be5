use crate::{
  observer::{BoxedObserver, Observer},
  subscription::{SharedSubscription, SubscriptionLike},
};

/// Pairs an observer with the subscription of its chain and guards the
/// emission protocol on its behalf:
///
/// * nothing is delivered after a terminal event or after the subscription
///   was closed, and the drop is silent;
/// * a terminal event is delivered once, then the subscription is closed,
///   which runs the teardown of the whole chain.
///
/// Every observer handed to [`Observable::actual_subscribe`] arrives wrapped
/// in a `Subscriber`, and every operator wraps the downstream subscriber
/// again before subscribing upstream.
///
/// [`Observable::actual_subscribe`]: crate::observable::Observable::actual_subscribe
pub struct Subscriber<O> {
  pub(crate) observer: O,
  pub(crate) subscription: SharedSubscription,
  stopped: bool,
}

impl<O> Subscriber<O> {
  pub fn new(observer: O, subscription: SharedSubscription) -> Self {
    Subscriber { observer, subscription, stopped: false }
  }

  /// Creates a subscriber with a fresh subscription.
  pub fn shared(observer: O) -> Self { Self::new(observer, SharedSubscription::default()) }

  #[inline]
  pub fn subscription(&self) -> &SharedSubscription { &self.subscription }

  /// Erases the observer type, keeping the protocol state.
  pub fn into_boxed<Item, Err>(self) -> Subscriber<BoxedObserver<Item, Err>>
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    Subscriber { observer: Box::new(self.observer), subscription: self.subscription, stopped: self.stopped }
  }
}

impl<Item, Err, O> Observer<Item, Err> for Subscriber<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if !self.is_finished() {
      self.observer.next(value)
    }
  }

  fn error(&mut self, err: Err) {
    if !self.is_finished() {
      self.stopped = true;
      self.observer.error(err);
      self.subscription.unsubscribe();
    }
  }

  fn complete(&mut self) {
    if !self.is_finished() {
      self.stopped = true;
      self.observer.complete();
      self.subscription.unsubscribe();
    }
  }

  #[inline]
  fn is_finished(&self) -> bool {
    self.stopped || self.subscription.is_closed() || self.observer.is_finished()
  }
}
