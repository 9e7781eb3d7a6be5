use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::SharedSubscription,
};

/// Emits `default` before completing when the source completed without a
/// single value.
#[derive(Clone)]
pub struct DefaultIfEmptyOp<S, Item> {
  pub(crate) source: S,
  pub(crate) default: Item,
}

impl<S> Observable for DefaultIfEmptyOp<S, S::Item>
where
  S: Observable,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let observer = DefaultIfEmptyObserver { observer: subscriber, default: Some(self.default) };
    self.source.actual_subscribe(Subscriber::new(observer, subscription))
  }
}

pub struct DefaultIfEmptyObserver<O, Item> {
  observer: O,
  default: Option<Item>,
}

impl<Item, Err, O> Observer<Item, Err> for DefaultIfEmptyObserver<O, Item>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    self.default = None;
    self.observer.next(value);
  }

  fn error(&mut self, err: Err) { self.observer.error(err) }

  fn complete(&mut self) {
    if let Some(default) = self.default.take() {
      self.observer.next(default);
    }
    self.observer.complete()
  }

  fn is_finished(&self) -> bool { self.observer.is_finished() }
}
