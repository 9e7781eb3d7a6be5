use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::SharedSubscription,
};

/// Creates the source lazily, calling `factory` once per subscription.
pub fn defer<F, S>(factory: F) -> ObservableDefer<F>
where
  F: FnOnce() -> S,
  S: Observable,
{
  ObservableDefer(factory)
}

#[derive(Clone)]
pub struct ObservableDefer<F>(F);

impl<F, S> Observable for ObservableDefer<F>
where
  F: FnOnce() -> S + Send + 'static,
  S: Observable,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    (self.0)().actual_subscribe(subscriber)
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  #[test]
  fn factory_runs_per_subscription() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c_calls = calls.clone();
    let source = observable::defer(move || {
      let n = c_calls.fetch_add(1, Ordering::SeqCst);
      observable::of(n)
    });
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let sum = Arc::new(AtomicUsize::new(0));
    let (a, b) = (sum.clone(), sum.clone());
    source.clone().subscribe(move |v| {
      a.fetch_add(v + 10, Ordering::SeqCst);
    });
    source.subscribe(move |v| {
      b.fetch_add(v + 10, Ordering::SeqCst);
    });
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(sum.load(Ordering::SeqCst), 21);
  }
}
