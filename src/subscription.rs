use parking_lot::Mutex;
use smallvec::SmallVec;
use std::{
  any::Any,
  fmt::{Debug, Formatter},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};
use tracing::trace;

/// Subscription returns from `Observable.subscribe(Subscriber)` to allow
/// unsubscribing.
pub trait SubscriptionLike {
  /// This allows deregistering a stream before it has finished receiving all
  /// events (i.e. before complete is called). Calling it more than once has
  /// no further effect.
  fn unsubscribe(&self);

  fn is_closed(&self) -> bool;
}

impl<T: SubscriptionLike + ?Sized> SubscriptionLike for Box<T> {
  #[inline]
  fn unsubscribe(&self) { (**self).unsubscribe() }
  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

impl<T: SubscriptionLike + ?Sized> SubscriptionLike for Arc<T> {
  #[inline]
  fn unsubscribe(&self) { (**self).unsubscribe() }
  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

enum Teardown {
  Subscription(Box<dyn SubscriptionLike + Send + Sync>),
  Action(Box<dyn FnOnce() + Send>),
}

impl Teardown {
  fn is_closed(&self) -> bool {
    match self {
      Teardown::Subscription(s) => s.is_closed(),
      Teardown::Action(_) => false,
    }
  }

  fn run(self) {
    match self {
      Teardown::Subscription(s) => s.unsubscribe(),
      Teardown::Action(f) => f(),
    }
  }
}

#[derive(Default)]
struct Inner {
  closed: AtomicBool,
  teardown: Mutex<SmallVec<[Teardown; 2]>>,
}

/// The thread-safe subscription every chain is built on.
///
/// It owns a closed flag and an ordered list of teardown entries, either child
/// subscriptions or plain actions. Teardown runs exactly once, in reverse
/// registration order, on the first `unsubscribe`. An entry added after the
/// subscription closed runs immediately.
#[derive(Clone, Default)]
pub struct SharedSubscription(Arc<Inner>);

impl SharedSubscription {
  pub fn add<S: SubscriptionLike + Send + Sync + 'static>(&self, subscription: S) {
    if !self.is_same(&subscription) {
      self.push(Teardown::Subscription(Box::new(subscription)));
    }
  }

  /// Registers an action run when this subscription closes.
  pub fn add_teardown<F: FnOnce() + Send + 'static>(&self, f: F) {
    self.push(Teardown::Action(Box::new(f)));
  }

  /// Count of teardown entries still waiting to run.
  pub fn teardown_size(&self) -> usize { self.0.teardown.lock().len() }

  fn push(&self, entry: Teardown) {
    let mut teardown = self.0.teardown.lock();
    if self.0.closed.load(Ordering::Acquire) {
      drop(teardown);
      entry.run();
    } else {
      teardown.retain(|v| !v.is_closed());
      teardown.push(entry);
    }
  }

  fn is_same(&self, other: &dyn Any) -> bool {
    if let Some(other) = other.downcast_ref::<Self>() {
      Arc::ptr_eq(&self.0, &other.0)
    } else {
      false
    }
  }
}

impl SubscriptionLike for SharedSubscription {
  fn unsubscribe(&self) {
    if self.0.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    let teardown = std::mem::take(&mut *self.0.teardown.lock());
    trace!(teardown = teardown.len(), "subscription closed");
    for entry in teardown.into_iter().rev() {
      entry.run();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.closed.load(Ordering::Acquire) }
}

impl Debug for SharedSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SharedSubscription")
      .field("closed", &self.is_closed())
      .field("teardown_count", &self.teardown_size())
      .finish()
  }
}

/// Wrapper around a subscription which provides the
/// `unsubscribe_when_dropped()` method.
#[derive(Clone, Debug)]
pub struct SubscriptionWrapper<T: SubscriptionLike>(pub(crate) T);

impl<T: SubscriptionLike> SubscriptionWrapper<T> {
  /// Activates "RAII" behavior for this subscription. That means
  /// `unsubscribe()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  #[must_use]
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard<T> { SubscriptionGuard(self.0) }

  /// Consumes this wrapper and returns the underlying subscription.
  pub fn into_inner(self) -> T { self.0 }
}

impl<T: SubscriptionLike> SubscriptionLike for SubscriptionWrapper<T> {
  #[inline]
  fn unsubscribe(&self) { self.0.unsubscribe() }
  #[inline]
  fn is_closed(&self) -> bool { self.0.is_closed() }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// Implements `must_use` to prevent immediate unsubscription.
#[must_use]
#[derive(Debug)]
pub struct SubscriptionGuard<T: SubscriptionLike>(pub(crate) T);

impl<T: SubscriptionLike> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(subscription) }
}

impl<T: SubscriptionLike> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}
