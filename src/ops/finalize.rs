use crate::{
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
  subscription::SharedSubscription,
};
use parking_lot::Mutex;
use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

/// Runs `func` once the subscription ends: after a terminal event reached
/// downstream, or when downstream unsubscribes, whichever happens first.
#[derive(Clone)]
pub struct FinalizeOp<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S, F> Observable for FinalizeOp<S, F>
where
  S: Observable,
  F: FnOnce() + Send + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    // registered first so it runs after the upstream teardown
    subscription.add_teardown(self.func);
    self.source.actual_subscribe(subscriber)
  }
}

/// Runs `func` when downstream cancels the subscription, but not when the
/// stream ends with a terminal event.
#[derive(Clone)]
pub struct OnDisposeOp<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S, F> Observable for OnDisposeOp<S, F>
where
  S: Observable,
  F: FnOnce() + Send + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let terminated = Arc::new(AtomicBool::new(false));
    let func = Mutex::new(Some(self.func));
    let c_terminated = terminated.clone();
    subscription.add_teardown(move || {
      if !c_terminated.load(Ordering::Acquire) {
        if let Some(func) = func.lock().take() {
          func();
        }
      }
    });
    let observer = OnDisposeObserver { observer: subscriber, terminated };
    self.source.actual_subscribe(Subscriber::new(observer, subscription))
  }
}

pub struct OnDisposeObserver<O> {
  observer: O,
  terminated: Arc<AtomicBool>,
}

impl<Item, Err, O> Observer<Item, Err> for OnDisposeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(&mut self, err: Err) {
    self.terminated.store(true, Ordering::Release);
    self.observer.error(err)
  }

  fn complete(&mut self) {
    self.terminated.store(true, Ordering::Release);
    self.observer.complete()
  }

  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use parking_lot::Mutex;
  use std::{
    sync::{
      atomic::{AtomicUsize, Ordering},
      Arc,
    },
    time::Duration,
  };

  #[test]
  fn runs_after_complete() {
    let log = Arc::new(Mutex::new(vec![]));
    let (c, f) = (log.clone(), log.clone());
    observable::from_iter(0..2)
      .finalize(move || f.lock().push("finalize"))
      .subscribe_all(|_| {}, |_| {}, move || c.lock().push("complete"));
    assert_eq!(*log.lock(), vec!["complete", "finalize"]);
  }

  #[test]
  fn runs_after_error() {
    let log = Arc::new(Mutex::new(vec![]));
    let (e, f) = (log.clone(), log.clone());
    observable::throw::<i32, RxError>(RxError::msg("x"))
      .finalize(move || f.lock().push("finalize"))
      .subscribe_err(|_| {}, move |_| e.lock().push("error"));
    assert_eq!(*log.lock(), vec!["error", "finalize"]);
  }

  #[test]
  fn runs_once_on_double_unsubscribe() {
    let scheduler = TestScheduler::default();
    let count = Arc::new(AtomicUsize::new(0));
    let c_count = count.clone();
    let subscription = observable::interval(Duration::from_millis(1), scheduler.clone())
      .finalize(move || {
        c_count.fetch_add(1, Ordering::SeqCst);
      })
      .subscribe(|_| {});
    subscription.unsubscribe();
    subscription.unsubscribe();
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn on_dispose_only_on_cancel() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let c_disposed = disposed.clone();
    observable::from_iter(0..3)
      .on_dispose(move || {
        c_disposed.fetch_add(1, Ordering::SeqCst);
      })
      .subscribe(|_| {});
    assert_eq!(disposed.load(Ordering::SeqCst), 0);

    let scheduler = TestScheduler::default();
    let c_disposed = disposed.clone();
    let subscription = observable::interval(Duration::from_millis(1), scheduler.clone())
      .on_dispose(move || {
        c_disposed.fetch_add(1, Ordering::SeqCst);
      })
      .subscribe(|_| {});
    scheduler.advance_by(Duration::from_millis(3));
    subscription.unsubscribe();
    subscription.unsubscribe();
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn on_dispose_sees_downstream_take() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let c_disposed = disposed.clone();
    observable::from_iter(0..10)
      .on_dispose(move || {
        c_disposed.fetch_add(1, Ordering::SeqCst);
      })
      .take(2)
      .subscribe(|_| {});
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
  }
}
