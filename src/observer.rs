//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).

use tracing::warn;

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: the consumer of data in reactive programming.
///
/// An Observer receives values, errors, and completion notifications from an
/// Observable. At most one of `error` or `complete` is delivered, and nothing
/// follows it. The [`Subscriber`](crate::subscriber::Subscriber) wrapping
/// every observer in a chain enforces that, so implementations here may
/// assume a well-behaved caller.
pub trait Observer<Item, Err> {
  /// Receive the next value from the observable
  fn next(&mut self, value: Item);

  /// Handle an error from the observable
  fn error(&mut self, err: Err);

  /// Handle completion of the observable
  fn complete(&mut self);

  /// Returns `true` once the observer will not accept more values.
  ///
  /// Push loops (like `from_iter`) poll this to stop early.
  fn is_finished(&self) -> bool;
}

impl<Item, Err, T> Observer<Item, Err> for Box<T>
where
  T: Observer<Item, Err> + ?Sized,
{
  #[inline]
  fn next(&mut self, value: Item) { (**self).next(value) }
  #[inline]
  fn error(&mut self, err: Err) { (**self).error(err) }
  #[inline]
  fn complete(&mut self) { (**self).complete() }
  #[inline]
  fn is_finished(&self) -> bool { (**self).is_finished() }
}

/// A type-erased observer, used where observers of different types must live
/// in one collection.
pub type BoxedObserver<Item, Err> = Box<dyn Observer<Item, Err> + Send>;

// ============================================================================
// Notification
// ============================================================================

/// One emission event, materialized so it can be queued and replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

impl<Item, Err> Notification<Item, Err> {
  /// Delivers this notification to `observer`.
  pub fn accept<O: Observer<Item, Err> + ?Sized>(self, observer: &mut O) {
    match self {
      Notification::Next(v) => observer.next(v),
      Notification::Error(err) => observer.error(err),
      Notification::Complete => observer.complete(),
    }
  }

  #[inline]
  pub fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }
}

/// The terminal state of a finished stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Terminal<Err> {
  Error(Err),
  Complete,
}

impl<Err> Terminal<Err> {
  pub(crate) fn accept<Item, O: Observer<Item, Err> + ?Sized>(self, observer: &mut O) {
    match self {
      Terminal::Error(err) => observer.error(err),
      Terminal::Complete => observer.complete(),
    }
  }
}

// ============================================================================
// Closure observers
// ============================================================================

/// Observer built from a `next` closure only.
///
/// An error reaching it has nowhere to go; it is logged and dropped.
pub struct ObserverN<N> {
  next: N,
  finished: bool,
}

impl<N> ObserverN<N> {
  pub fn new(next: N) -> Self { ObserverN { next, finished: false } }
}

impl<Item, Err, N> Observer<Item, Err> for ObserverN<N>
where
  N: FnMut(Item),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value) }

  fn error(&mut self, _err: Err) {
    self.finished = true;
    warn!("error reached a subscriber without an error handler");
  }

  fn complete(&mut self) { self.finished = true; }

  #[inline]
  fn is_finished(&self) -> bool { self.finished }
}

/// Observer built from `next`, `error` and `complete` closures.
pub struct ObserverAll<N, E, C> {
  next: N,
  error: E,
  complete: C,
  finished: bool,
}

impl<N, E, C> ObserverAll<N, E, C> {
  pub fn new(next: N, error: E, complete: C) -> Self {
    ObserverAll { next, error, complete, finished: false }
  }
}

impl<Item, Err, N, E, C> Observer<Item, Err> for ObserverAll<N, E, C>
where
  N: FnMut(Item),
  E: FnMut(Err),
  C: FnMut(),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value) }

  fn error(&mut self, err: Err) {
    self.finished = true;
    (self.error)(err)
  }

  fn complete(&mut self) {
    self.finished = true;
    (self.complete)()
  }

  #[inline]
  fn is_finished(&self) -> bool { self.finished }
}
