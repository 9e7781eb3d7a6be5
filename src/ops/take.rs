use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::SharedSubscription,
};

/// Emits the first `count` values, then completes and cancels the source.
#[derive(Clone)]
pub struct TakeOp<S> {
  pub(crate) source: S,
  pub(crate) count: usize,
}

impl<S: Observable> Observable for TakeOp<S> {
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, mut subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    if self.count == 0 {
      subscriber.complete();
      return subscription;
    }
    let observer = TakeObserver { observer: subscriber, count: self.count, hits: 0 };
    self.source.actual_subscribe(Subscriber::new(observer, subscription))
  }
}

pub struct TakeObserver<O> {
  observer: O,
  count: usize,
  hits: usize,
}

impl<Item, Err, O> Observer<Item, Err> for TakeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.hits < self.count {
      self.hits += 1;
      self.observer.next(value);
      if self.hits == self.count {
        self.observer.complete();
      }
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
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  #[test]
  fn base_function() {
    let seen = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(AtomicUsize::new(0));
    let (c_seen, c_completed) = (seen.clone(), completed.clone());
    observable::from_iter(0..100).take(5).subscribe_all(
      move |v| c_seen.lock().push(v),
      |_| {},
      move || {
        c_completed.fetch_add(1, Ordering::SeqCst);
      },
    );
    assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4]);
    assert_eq!(completed.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn stops_the_source() {
    let produced = Arc::new(AtomicUsize::new(0));
    let c_produced = produced.clone();
    observable::from_iter(0..1000)
      .tap(move |_| {
        c_produced.fetch_add(1, Ordering::SeqCst);
      })
      .take(3)
      .subscribe(|_| {});
    assert_eq!(produced.load(Ordering::SeqCst), 3);
  }

  #[test]
  fn take_zero_completes_without_subscribing() {
    let produced = Arc::new(AtomicUsize::new(0));
    let completed = Arc::new(AtomicUsize::new(0));
    let (c_produced, c_completed) = (produced.clone(), completed.clone());
    observable::from_iter(0..10)
      .tap(move |_| {
        c_produced.fetch_add(1, Ordering::SeqCst);
      })
      .take(0)
      .subscribe_all(
        |_| {},
        |_| {},
        move || {
          c_completed.fetch_add(1, Ordering::SeqCst);
        },
      );
    assert_eq!(produced.load(Ordering::SeqCst), 0);
    assert_eq!(completed.load(Ordering::SeqCst), 1);
  }
}
