//! Hot sources: one run of the source shared by every subscriber.
//!
//! `publish()` turns a cold source into a [`ConnectableObservable`]. Nothing
//! runs until `connect()`; from then on every subscriber sees the same
//! values, starting with whatever is emitted after it joined.
//!
//! Teardown attached to the shared source chain (`finalize`, `on_dispose`,
//! `create` teardown) runs exactly once, when the shared run ends: the
//! connection is unsubscribed, the source terminates, or the last
//! `ref_count` subscriber leaves. A single subscriber leaving never triggers
//! it.

use crate::{
  observable::Observable,
  observer::Observer,
  subject::Subject,
  subscriber::Subscriber,
  subscription::{SharedSubscription, SubscriptionLike},
};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::trace;

struct Connection<Item, Err> {
  subject: Subject<Item, Err>,
  subscription: Option<SharedSubscription>,
}

pub struct ConnectableObservable<S: Observable> {
  source: S,
  state: Arc<Mutex<Connection<S::Item, S::Err>>>,
}

impl<S: Observable + Clone> Clone for ConnectableObservable<S> {
  fn clone(&self) -> Self { ConnectableObservable { source: self.source.clone(), state: self.state.clone() } }
}

impl<S> ConnectableObservable<S>
where
  S: Observable,
  S::Item: Clone,
  S::Err: Clone,
{
  pub fn new(source: S) -> Self {
    ConnectableObservable {
      source,
      state: Arc::new(Mutex::new(Connection { subject: Subject::new(), subscription: None })),
    }
  }

  /// True while a shared run is live.
  pub fn is_connected(&self) -> bool {
    self.state.lock().subscription.as_ref().map_or(false, |s| !s.is_closed())
  }

  /// Starts the shared run and returns its subscription; unsubscribing it
  /// disconnects. While connected, further calls return the live connection.
  /// After the previous run ended, a new run starts on a fresh subject.
  pub fn connect(&self) -> SharedSubscription
  where
    S: Clone,
  {
    let (subject, connection) = {
      let mut state = self.state.lock();
      if let Some(live) = state.subscription.as_ref().filter(|s| !s.is_closed()) {
        return live.clone();
      }
      if state.subject.is_terminated() {
        state.subject = Subject::new();
      }
      let connection = SharedSubscription::default();
      state.subscription = Some(connection.clone());
      (state.subject.clone(), connection)
    };

    trace!("connectable connected");
    let weak = Arc::downgrade(&self.state);
    let c_subject = subject.clone();
    connection.add_teardown(move || disconnected(&weak, &c_subject));
    self.source.clone().actual_subscribe(Subscriber::new(subject, connection.clone()));
    connection
  }

  /// Connects when the first subscriber arrives and disconnects when the last
  /// one leaves.
  pub fn ref_count(self) -> RefCount<S> { RefCount { connectable: self, count: Arc::new(Mutex::new(0)) } }

  /// Connects once `subscribers` subscribers have arrived and never
  /// disconnects on its own. With `0` it connects right away.
  pub fn auto_connect(self, subscribers: usize) -> AutoConnect<S>
  where
    S: Clone,
  {
    if subscribers == 0 {
      self.connect();
    }
    AutoConnect { connectable: self, threshold: subscribers, count: Arc::new(Mutex::new(0)) }
  }

  fn subject(&self) -> Subject<S::Item, S::Err> { self.state.lock().subject.clone() }

  /// The subject the next run will feed, replacing a terminated one.
  fn fresh_subject(&self) -> Subject<S::Item, S::Err> {
    let mut state = self.state.lock();
    if state.subject.is_terminated() {
      state.subject = Subject::new();
    }
    state.subject.clone()
  }

  fn disconnect(&self) {
    let connection = self.state.lock().subscription.take();
    if let Some(connection) = connection {
      connection.unsubscribe();
    }
  }
}

/// A run that was cut off (not terminated) leaves its subscribers behind;
/// later subscribers join a fresh subject for the next run.
fn disconnected<Item, Err>(state: &Weak<Mutex<Connection<Item, Err>>>, subject: &Subject<Item, Err>) {
  if let Some(state) = state.upgrade() {
    let mut state = state.lock();
    if Arc::ptr_eq(&state.subject.0, &subject.0) && !subject.is_terminated() {
      state.subject = Subject::new();
    }
    trace!("connectable disconnected");
  }
}

impl<S> Observable for ConnectableObservable<S>
where
  S: Observable,
  S::Item: Clone,
  S::Err: Clone,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    self.subject().register(subscriber)
  }
}

pub struct RefCount<S: Observable> {
  connectable: ConnectableObservable<S>,
  count: Arc<Mutex<usize>>,
}

impl<S: Observable + Clone> Clone for RefCount<S> {
  fn clone(&self) -> Self { RefCount { connectable: self.connectable.clone(), count: self.count.clone() } }
}

impl<S> Observable for RefCount<S>
where
  S: Observable + Clone,
  S::Item: Clone,
  S::Err: Clone,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let first = {
      let mut count = self.count.lock();
      *count += 1;
      *count == 1
    };
    let subject = if first { self.connectable.fresh_subject() } else { self.connectable.subject() };
    let subscription = subject.register(subscriber);
    if first {
      self.connectable.connect();
    }

    let RefCount { connectable, count } = self;
    subscription.add_teardown(move || {
      let last = {
        let mut count = count.lock();
        *count -= 1;
        *count == 0
      };
      if last {
        connectable.disconnect();
      }
    });
    subscription
  }
}

pub struct AutoConnect<S: Observable> {
  connectable: ConnectableObservable<S>,
  threshold: usize,
  count: Arc<Mutex<usize>>,
}

impl<S: Observable + Clone> Clone for AutoConnect<S> {
  fn clone(&self) -> Self {
    AutoConnect { connectable: self.connectable.clone(), threshold: self.threshold, count: self.count.clone() }
  }
}

impl<S> Observable for AutoConnect<S>
where
  S: Observable + Clone,
  S::Item: Clone,
  S::Err: Clone,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = self.connectable.subject().register(subscriber);
    let reached = {
      let mut count = self.count.lock();
      *count += 1;
      *count == self.threshold
    };
    if reached {
      self.connectable.connect();
    }
    subscription
  }
}
