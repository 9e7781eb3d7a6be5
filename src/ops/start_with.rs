use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::SharedSubscription,
};

/// Emits `values` first, then subscribes to the source.
#[derive(Clone)]
pub struct StartWithOp<S, Item> {
  pub(crate) source: S,
  pub(crate) values: Vec<Item>,
}

impl<S> Observable for StartWithOp<S, S::Item>
where
  S: Observable,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, mut subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    for value in self.values {
      if subscriber.is_finished() {
        return subscriber.subscription.clone();
      }
      subscriber.next(value);
    }
    if subscriber.is_finished() {
      return subscriber.subscription.clone();
    }
    self.source.actual_subscribe(subscriber)
  }
}
