use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::SharedSubscription,
};

/// Folds every value into an accumulator and emits each intermediate
/// accumulation. The seed itself is never emitted, so an empty source yields
/// an empty stream.
#[derive(Clone)]
pub struct ScanOp<S, F, Acc> {
  pub(crate) source: S,
  pub(crate) func: F,
  pub(crate) seed: Acc,
}

impl<S, F, Acc> Observable for ScanOp<S, F, Acc>
where
  S: Observable,
  F: FnMut(Acc, S::Item) -> Acc + Send + 'static,
  Acc: Clone + Send + 'static,
{
  type Item = Acc;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let observer = ScanObserver { observer: subscriber, func: self.func, acc: Some(self.seed) };
    self.source.actual_subscribe(Subscriber::new(observer, subscription))
  }
}

pub struct ScanObserver<O, F, Acc> {
  observer: O,
  func: F,
  acc: Option<Acc>,
}

impl<Item, Err, O, F, Acc> Observer<Item, Err> for ScanObserver<O, F, Acc>
where
  O: Observer<Acc, Err>,
  F: FnMut(Acc, Item) -> Acc,
  Acc: Clone,
{
  fn next(&mut self, value: Item) {
    if let Some(acc) = self.acc.take() {
      let acc = (self.func)(acc, value);
      self.acc = Some(acc.clone());
      self.observer.next(acc);
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
  fn running_sum_without_seed() {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    observable::from_iter(vec![1, 1, 1, 1, 1]).scan(100, |acc, v| acc + v).subscribe(move |v| c_seen.lock().push(v));
    assert_eq!(*seen.lock(), vec![101, 102, 103, 104, 105]);
  }

  #[test]
  fn empty_source_emits_nothing() {
    let seen = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(Mutex::new(false));
    let (c_seen, c_completed) = (seen.clone(), completed.clone());
    observable::empty::<i32>().scan(10, |acc, v| acc + v).subscribe_all(
      move |v| c_seen.lock().push(v),
      |_| {},
      move || *c_completed.lock() = true,
    );
    assert!(seen.lock().is_empty());
    assert!(*completed.lock());
  }

  #[test]
  fn accumulator_type_differs_from_items() {
    let last = Arc::new(Mutex::new(String::new()));
    let c_last = last.clone();
    observable::from_iter(vec!['a', 'b', 'c'])
      .scan(String::new(), |mut acc, c| {
        acc.push(c);
        acc
      })
      .subscribe(move |v| *c_last.lock() = v);
    assert_eq!(*last.lock(), "abc");
  }
}
