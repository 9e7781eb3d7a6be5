//! Subjects are observers and observables at the same time: whatever is
//! pushed into them is multicast to every current subscriber.
//!
//! All three flavours share one core. A plain [`Subject`] only fans out, a
//! [`BehaviorSubject`] also remembers the latest value for late subscribers,
//! and a [`HoldSubject`] keeps everything until its first subscriber shows up.

use crate::{
  observable::Observable,
  observer::{BoxedObserver, Notification, Observer, Terminal},
  subscriber::Subscriber,
  subscription::SharedSubscription,
};
use parking_lot::Mutex;
use std::{collections::VecDeque, sync::Arc};
use tracing::trace;

mod behavior_subject;
mod hold_subject;
mod subscribers;

pub use behavior_subject::BehaviorSubject;
pub use hold_subject::HoldSubject;
use subscribers::{broadcast_complete, broadcast_error, broadcast_value, SharedObserver, Subscribers};

pub(crate) struct SubjectState<Item, Err> {
  observers: Subscribers<Item, Err>,
  terminal: Option<Terminal<Err>>,
  keep_latest: bool,
  latest: Option<Item>,
  held: Option<VecDeque<Notification<Item, Err>>>,
}

impl<Item, Err> SubjectState<Item, Err> {
  fn new(keep_latest: bool, latest: Option<Item>, hold: bool) -> Self {
    SubjectState {
      observers: Subscribers::default(),
      terminal: None,
      keep_latest,
      latest,
      held: hold.then(VecDeque::new),
    }
  }
}

/// A hot, multicasting source.
///
/// `next` is delivered synchronously, in subscription order, to the
/// subscribers present when it was called. Once `error` or `complete` was
/// called the subject is terminated: further calls are silently ignored and
/// late subscribers only receive the terminal event.
pub struct Subject<Item, Err>(pub(crate) Arc<Mutex<SubjectState<Item, Err>>>);

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Subject(self.0.clone()) }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self { Self::with_state(SubjectState::new(false, None, false)) }

  pub(crate) fn with_state(state: SubjectState<Item, Err>) -> Self { Subject(Arc::new(Mutex::new(state))) }

  pub(crate) fn behavior(initial: Option<Item>) -> Self { Self::with_state(SubjectState::new(true, initial, false)) }

  pub(crate) fn hold() -> Self { Self::with_state(SubjectState::new(false, None, true)) }

  /// Count of live subscribers.
  pub fn subscribed_size(&self) -> usize { self.0.lock().observers.len() }

  pub fn is_terminated(&self) -> bool { self.0.lock().terminal.is_some() }

  pub fn next(&self, value: Item)
  where
    Item: Clone,
  {
    let observers = {
      let mut state = self.0.lock();
      if state.terminal.is_some() {
        return;
      }
      if let Some(held) = state.held.as_mut() {
        held.push_back(Notification::Next(value));
        return;
      }
      if state.keep_latest {
        state.latest = Some(value.clone());
      }
      state.observers.snapshot()
    };
    broadcast_value(observers, value);
  }

  pub fn error(&self, err: Err)
  where
    Err: Clone,
  {
    let observers = {
      let mut state = self.0.lock();
      if state.terminal.is_some() {
        return;
      }
      state.terminal = Some(Terminal::Error(err.clone()));
      if let Some(held) = state.held.as_mut() {
        held.push_back(Notification::Error(err));
        return;
      }
      state.observers.drain()
    };
    trace!(subscribers = observers.len(), "subject errored");
    broadcast_error(observers, err);
  }

  pub fn complete(&self) {
    let observers = {
      let mut state = self.0.lock();
      if state.terminal.is_some() {
        return;
      }
      state.terminal = Some(Terminal::Complete);
      if let Some(held) = state.held.as_mut() {
        held.push_back(Notification::Complete);
        return;
      }
      state.observers.drain()
    };
    trace!(subscribers = observers.len(), "subject completed");
    broadcast_complete(observers);
  }

  /// Adds `subscriber` to the fan-out set, first replaying whatever this
  /// subject keeps for newcomers.
  pub(crate) fn register<O>(&self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Item, Err> + Send + 'static,
    Item: Clone + Send + 'static,
    Err: Clone + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let mut state = self.0.lock();
    let mut replay: VecDeque<Notification<Item, Err>> = match state.held.take() {
      Some(held) => held,
      None => state.latest.clone().map(Notification::Next).into_iter().collect(),
    };

    if let Some(terminal) = state.terminal.clone() {
      drop(state);
      let mut subscriber = subscriber;
      if !replay.back().map_or(false, Notification::is_terminal) {
        replay.push_back(match terminal {
          Terminal::Error(err) => Notification::Error(err),
          Terminal::Complete => Notification::Complete,
        });
      }
      for n in replay {
        n.accept(&mut subscriber);
      }
      return subscription;
    }

    let boxed: BoxedObserver<Item, Err> = Box::new(subscriber);
    let observer: SharedObserver<Item, Err> = Arc::new(Mutex::new(boxed));
    let id = state.observers.add(observer.clone());
    // Replay while still owning the new observer's lock, so a concurrent
    // `next` queues behind the replayed values.
    let mut guard = observer.lock();
    drop(state);
    for n in replay {
      n.accept(&mut *guard);
    }
    drop(guard);

    trace!(id, "subject subscriber added");
    let weak = Arc::downgrade(&self.0);
    subscription.add_teardown(move || {
      if let Some(inner) = weak.upgrade() {
        inner.lock().observers.remove(id);
      }
    });
    subscription
  }
}

impl<Item, Err> Observable for Subject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    self.register(subscriber)
  }
}

impl<Item: Clone, Err: Clone> Observer<Item, Err> for Subject<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { Subject::next(self, value) }

  #[inline]
  fn error(&mut self, err: Err) { Subject::error(self, err) }

  #[inline]
  fn complete(&mut self) { Subject::complete(self) }

  #[inline]
  fn is_finished(&self) -> bool { self.is_terminated() }
}
