use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::SharedSubscription,
};
use std::{convert::Infallible, marker::PhantomData};

/// Creates an observable that emits no items, just completes.
pub fn empty<Item>() -> ObservableEmpty<Item> { ObservableEmpty(PhantomData) }

/// Creates an observable that never emits anything and never ends.
pub fn never<Item>() -> ObservableNever<Item> { ObservableNever(PhantomData) }

/// Creates an observable that emits no items, just terminates with `err`.
pub fn throw<Item, Err>(err: Err) -> ObservableThrow<Item, Err> { ObservableThrow(err, PhantomData) }

pub struct ObservableEmpty<Item>(PhantomData<fn() -> Item>);

impl<Item> Clone for ObservableEmpty<Item> {
  fn clone(&self) -> Self { ObservableEmpty(PhantomData) }
}

impl<Item: Send + 'static> Observable for ObservableEmpty<Item> {
  type Item = Item;
  type Err = Infallible;

  fn actual_subscribe<O>(self, mut subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    subscriber.complete();
    subscription
  }
}

pub struct ObservableNever<Item>(PhantomData<fn() -> Item>);

impl<Item> Clone for ObservableNever<Item> {
  fn clone(&self) -> Self { ObservableNever(PhantomData) }
}

impl<Item: Send + 'static> Observable for ObservableNever<Item> {
  type Item = Item;
  type Err = Infallible;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    subscriber.subscription.clone()
  }
}

pub struct ObservableThrow<Item, Err>(Err, PhantomData<fn() -> Item>);

impl<Item, Err: Clone> Clone for ObservableThrow<Item, Err> {
  fn clone(&self) -> Self { ObservableThrow(self.0.clone(), PhantomData) }
}

impl<Item, Err> Observable for ObservableThrow<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, mut subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    subscriber.error(self.0);
    subscription
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use parking_lot::Mutex;
  use std::sync::Arc;

  #[test]
  fn empty_only_completes() {
    let log = Arc::new(Mutex::new(vec![]));
    let (n, c) = (log.clone(), log.clone());
    observable::empty::<i32>().subscribe_all(
      move |v| n.lock().push(Some(v)),
      |_| {},
      move || c.lock().push(None),
    );
    assert_eq!(*log.lock(), vec![None]);
  }

  #[test]
  fn throw_only_errors() {
    let errors = Arc::new(Mutex::new(vec![]));
    let c_errors = errors.clone();
    observable::throw::<i32, _>(RxError::msg("boom"))
      .subscribe_err(|_| panic!("no value expected"), move |e| c_errors.lock().push(e));
    assert_eq!(*errors.lock(), vec![RxError::msg("boom")]);
  }

  #[test]
  fn never_stays_open() {
    let subscription = observable::never::<i32>().subscribe(|_| {});
    assert!(!subscription.is_closed());
    subscription.unsubscribe();
    assert!(subscription.is_closed());
  }
}
