use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::SharedSubscription,
};

#[derive(Clone)]
pub struct MapOp<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S, F, B> Observable for MapOp<S, F>
where
  S: Observable,
  F: FnMut(S::Item) -> B + Send + 'static,
  B: Send + 'static,
{
  type Item = B;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    self
      .source
      .actual_subscribe(Subscriber::new(MapObserver { observer: subscriber, map: self.func }, subscription))
  }
}

pub struct MapObserver<O, F> {
  observer: O,
  map: F,
}

impl<Item, Err, O, F, B> Observer<Item, Err> for MapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> B,
{
  fn next(&mut self, value: Item) { self.observer.next((self.map)(value)) }

  fn error(&mut self, err: Err) { self.observer.error(err) }

  fn complete(&mut self) { self.observer.complete() }

  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

/// Like `map`, but the closure may fail. The first `Err` becomes the error
/// event of the stream and no value follows it.
#[derive(Clone)]
pub struct TryMapOp<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S, F, B> Observable for TryMapOp<S, F>
where
  S: Observable,
  F: FnMut(S::Item) -> Result<B, S::Err> + Send + 'static,
  B: Send + 'static,
{
  type Item = B;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    self
      .source
      .actual_subscribe(Subscriber::new(TryMapObserver { observer: subscriber, map: self.func }, subscription))
  }
}

pub struct TryMapObserver<O, F> {
  observer: O,
  map: F,
}

impl<Item, Err, O, F, B> Observer<Item, Err> for TryMapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> Result<B, Err>,
{
  fn next(&mut self, value: Item) {
    match (self.map)(value) {
      Ok(v) => self.observer.next(v),
      Err(err) => self.observer.error(err),
    }
  }

  fn error(&mut self, err: Err) { self.observer.error(err) }

  fn complete(&mut self) { self.observer.complete() }

  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use parking_lot::Mutex;
  use std::sync::Arc;

  #[test]
  fn primitive_type() {
    let sum = Arc::new(Mutex::new(0));
    let c_sum = sum.clone();
    observable::from_iter(100..101).map(|v| v * 2).subscribe(move |v| *c_sum.lock() += v);
    assert_eq!(*sum.lock(), 200);
  }

  #[test]
  fn map_types_mixed() {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    observable::from_iter(vec!['a', 'b', 'c'])
      .map(|c| c.to_string())
      .map(|s| s.len())
      .subscribe(move |v| c_seen.lock().push(v));
    assert_eq!(*seen.lock(), vec![1, 1, 1]);
  }

  #[test]
  fn try_map_error_terminates() {
    let seen = Arc::new(Mutex::new(vec![]));
    let errors = Arc::new(Mutex::new(vec![]));
    let (c_seen, c_errors) = (seen.clone(), errors.clone());
    observable::from_iter(1..=5)
      .into_fallible::<RxError>()
      .try_map(|v| if v == 3 { Err(RxError::msg("three")) } else { Ok(v * 10) })
      .subscribe_err(move |v| c_seen.lock().push(v), move |e| c_errors.lock().push(e));
    assert_eq!(*seen.lock(), vec![10, 20]);
    assert_eq!(*errors.lock(), vec![RxError::msg("three")]);
  }

  #[test]
  fn try_map_error_stops_source() {
    let produced = Arc::new(Mutex::new(0));
    let c_produced = produced.clone();
    observable::from_iter(0..100)
      .tap(move |_| *c_produced.lock() += 1)
      .into_fallible::<RxError>()
      .try_map(|v| if v < 2 { Ok(v) } else { Err(RxError::msg("stop")) })
      .subscribe_err(|_| {}, |_| {});
    assert_eq!(*produced.lock(), 3);
  }
}
