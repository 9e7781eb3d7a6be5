//! Side effects on the events passing through, without changing them.

use crate::{
  error::CompositeError,
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
  subscription::SharedSubscription,
};

/// Calls `next`, `error` or `complete` before forwarding the matching event.
///
/// `tap`, `tap_error` and `tap_complete` all build this operator and fill the
/// unused slots with no-op functions.
#[derive(Clone)]
pub struct TapOp<S, N, E, C> {
  pub(crate) source: S,
  pub(crate) next: N,
  pub(crate) error: E,
  pub(crate) complete: C,
}

impl<S, N, E, C> Observable for TapOp<S, N, E, C>
where
  S: Observable,
  N: FnMut(&S::Item) + Send + 'static,
  E: FnMut(&S::Err) + Send + 'static,
  C: FnMut() + Send + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let observer = TapObserver { observer: subscriber, next: self.next, error: self.error, complete: self.complete };
    self.source.actual_subscribe(Subscriber::new(observer, subscription))
  }
}

pub struct TapObserver<O, N, E, C> {
  observer: O,
  next: N,
  error: E,
  complete: C,
}

impl<Item, Err, O, N, E, C> Observer<Item, Err> for TapObserver<O, N, E, C>
where
  O: Observer<Item, Err>,
  N: FnMut(&Item),
  E: FnMut(&Err),
  C: FnMut(),
{
  fn next(&mut self, value: Item) {
    (self.next)(&value);
    self.observer.next(value)
  }

  fn error(&mut self, err: Err) {
    (self.error)(&err);
    self.observer.error(err)
  }

  fn complete(&mut self) {
    (self.complete)();
    self.observer.complete()
  }

  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

/// Like `tap_error`, but the handler may fail too. Its failure is delivered
/// together with the original error as a [`CompositeError`].
#[derive(Clone)]
pub struct TryTapErrorOp<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S, F> Observable for TryTapErrorOp<S, F>
where
  S: Observable,
  S::Err: From<CompositeError<S::Err>>,
  F: FnMut(&S::Err) -> Result<(), S::Err> + Send + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let observer = TryTapErrorObserver { observer: subscriber, func: self.func };
    self.source.actual_subscribe(Subscriber::new(observer, subscription))
  }
}

pub struct TryTapErrorObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for TryTapErrorObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Err) -> Result<(), Err>,
  Err: From<CompositeError<Err>>,
{
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(&mut self, err: Err) {
    match (self.func)(&err) {
      Ok(()) => self.observer.error(err),
      Err(handler_err) => self.observer.error(CompositeError::new(err, handler_err).into()),
    }
  }

  fn complete(&mut self) { self.observer.complete() }

  fn is_finished(&self) -> bool { self.observer.is_finished() }
}
