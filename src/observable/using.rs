use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::SharedSubscription,
};

/// Ties a resource to the lifetime of each subscription.
///
/// `acquire` runs on subscribe, `factory` builds the source from the
/// resource, and `dispose` releases it exactly once when the subscription
/// ends, whether by completion, error or unsubscribe.
pub fn using<R, A, F, D, S>(acquire: A, factory: F, dispose: D) -> ObservableUsing<A, F, D>
where
  A: FnOnce() -> R,
  F: FnOnce(&R) -> S,
  D: FnOnce(R),
  S: Observable,
{
  ObservableUsing { acquire, factory, dispose }
}

#[derive(Clone)]
pub struct ObservableUsing<A, F, D> {
  acquire: A,
  factory: F,
  dispose: D,
}

impl<R, A, F, D, S> Observable for ObservableUsing<A, F, D>
where
  R: Send + 'static,
  A: FnOnce() -> R + Send + 'static,
  F: FnOnce(&R) -> S + Send + 'static,
  D: FnOnce(R) + Send + 'static,
  S: Observable,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let resource = (self.acquire)();
    let source = (self.factory)(&resource);
    let dispose = self.dispose;
    subscriber.subscription.add_teardown(move || dispose(resource));
    source.actual_subscribe(subscriber)
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use parking_lot::Mutex;
  use std::sync::Arc;

  #[test]
  fn resource_released_after_completion() {
    let log = Arc::new(Mutex::new(vec![]));
    let (a, d, n) = (log.clone(), log.clone(), log.clone());
    observable::using(
      move || {
        a.lock().push("acquire".to_owned());
        vec![1, 2]
      },
      |res| observable::from_iter(res.clone()),
      move |_| d.lock().push("dispose".to_owned()),
    )
    .subscribe(move |v| n.lock().push(format!("next {v}")));
    assert_eq!(*log.lock(), vec!["acquire", "next 1", "next 2", "dispose"]);
  }

  #[test]
  fn resource_released_on_unsubscribe() {
    let disposed = Arc::new(Mutex::new(0));
    let c_disposed = disposed.clone();
    let subscription = observable::using(
      || (),
      |_| observable::never::<i32>(),
      move |_| *c_disposed.lock() += 1,
    )
    .subscribe(|_| {});
    assert_eq!(*disposed.lock(), 0);
    subscription.unsubscribe();
    subscription.unsubscribe();
    assert_eq!(*disposed.lock(), 1);
  }
}
