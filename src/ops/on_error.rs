//! Recovering from errors: replace the error with a last value, or switch to
//! a fallback source.

use crate::{
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
  subscription::{SharedSubscription, SubscriptionLike},
};

/// Turns an error into one final value followed by completion.
#[derive(Clone)]
pub struct OnErrorReturnOp<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S, F> Observable for OnErrorReturnOp<S, F>
where
  S: Observable,
  F: FnMut(S::Err) -> S::Item + Send + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let observer = OnErrorReturnObserver { observer: subscriber, func: self.func };
    self.source.actual_subscribe(Subscriber::new(observer, subscription))
  }
}

pub struct OnErrorReturnObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for OnErrorReturnObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(Err) -> Item,
{
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(&mut self, err: Err) {
    let value = (self.func)(err);
    self.observer.next(value);
    self.observer.complete();
  }

  fn complete(&mut self) { self.observer.complete() }

  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

/// Switches to the observable built by `func` when the source fails. The
/// fallback's events, its error included, go downstream unchanged.
#[derive(Clone)]
pub struct OnErrorResumeNextOp<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S, F, R> Observable for OnErrorResumeNextOp<S, F>
where
  S: Observable,
  F: FnOnce(S::Err) -> R + Send + 'static,
  R: Observable<Item = S::Item, Err = S::Err>,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let upstream = SharedSubscription::default();
    subscription.add(upstream.clone());
    let observer = OnErrorResumeNextObserver { observer: Some(subscriber), func: Some(self.func) };
    self.source.actual_subscribe(Subscriber::new(observer, upstream));
    subscription
  }
}

pub struct OnErrorResumeNextObserver<O, F> {
  observer: Option<Subscriber<O>>,
  func: Option<F>,
}

impl<Item, Err, O, F, R> Observer<Item, Err> for OnErrorResumeNextObserver<O, F>
where
  O: Observer<Item, Err> + Send + 'static,
  F: FnOnce(Err) -> R,
  R: Observable<Item = Item, Err = Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(observer) = self.observer.as_mut() {
      observer.next(value)
    }
  }

  fn error(&mut self, err: Err) {
    if let (Some(observer), Some(func)) = (self.observer.take(), self.func.take()) {
      func(err).actual_subscribe(observer);
    }
  }

  fn complete(&mut self) {
    if let Some(observer) = self.observer.as_mut() {
      observer.complete()
    }
  }

  fn is_finished(&self) -> bool {
    self.observer.as_ref().map_or(true, |o| o.is_finished() || o.subscription().is_closed())
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use parking_lot::Mutex;
  use std::sync::Arc;

  fn failing() -> impl Observable<Item = i32, Err = RxError> + Clone {
    observable::create(|mut emitter: Emitter<i32, RxError>| {
      emitter.next(1);
      emitter.next(2);
      emitter.error(RxError::msg("broken"));
    })
  }

  #[test]
  fn error_becomes_last_value() {
    let log = Arc::new(Mutex::new(vec![]));
    let (n, c) = (log.clone(), log.clone());
    failing()
      .on_error_return(|_| -1)
      .subscribe_all(move |v| n.lock().push(v), |_| panic!("no error expected"), move || c.lock().push(0));
    assert_eq!(*log.lock(), vec![1, 2, -1, 0]);
  }

  #[test]
  fn resume_with_fallback() {
    let log = Arc::new(Mutex::new(vec![]));
    let (n, c) = (log.clone(), log.clone());
    failing()
      .on_error_resume_next(|_| observable::from_iter(10..12).into_fallible::<RxError>())
      .subscribe_all(move |v| n.lock().push(v), |_| {}, move || c.lock().push(0));
    assert_eq!(*log.lock(), vec![1, 2, 10, 11, 0]);
  }

  #[test]
  fn fallback_error_is_delivered() {
    let errors = Arc::new(Mutex::new(vec![]));
    let c_errors = errors.clone();
    failing()
      .on_error_resume_next(|err| observable::throw(RxError::msg(format!("fallback after {err}"))))
      .subscribe_err(|_| {}, move |e| c_errors.lock().push(e));
    assert_eq!(*errors.lock(), vec![RxError::msg("fallback after broken")]);
  }

  #[test]
  fn unsubscribe_reaches_fallback() {
    let scheduler = TestScheduler::default();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let c_scheduler = scheduler.clone();
    let subscription = failing()
      .on_error_resume_next(move |_| {
        observable::interval(std::time::Duration::from_millis(10), c_scheduler).map(|v| v as i32).into_fallible::<RxError>()
      })
      .subscribe(move |v| c_seen.lock().push(v));
    scheduler.advance_by(std::time::Duration::from_millis(20));
    subscription.unsubscribe();
    scheduler.advance_by(std::time::Duration::from_millis(50));
    assert_eq!(*seen.lock(), vec![1, 2, 0, 1]);
    assert_eq!(scheduler.pending_count(), 0);
  }
}
