use crate::observer::{BoxedObserver, Observer};
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::sync::Arc;

/// One subscriber of a subject. The mutex serializes delivery to it when
/// several producers push into the subject at once.
pub(crate) type SharedObserver<Item, Err> = Arc<Mutex<BoxedObserver<Item, Err>>>;

pub(crate) type Snapshot<Item, Err> = SmallVec<[SharedObserver<Item, Err>; 2]>;

/// Subscribers container with ID-based add and remove.
///
/// Delivery never runs against the container itself: callers take a
/// [`Snapshot`] under the subject lock and broadcast after releasing it, so
/// a subscriber joining or leaving mid-delivery cannot make any other
/// subscriber miss or repeat a value.
pub(crate) struct Subscribers<Item, Err> {
  next_id: usize,
  items: SmallVec<[(usize, SharedObserver<Item, Err>); 2]>,
}

impl<Item, Err> Default for Subscribers<Item, Err> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<Item, Err> Subscribers<Item, Err> {
  /// Add an observer and return its unique ID.
  pub(crate) fn add(&mut self, observer: SharedObserver<Item, Err>) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.items.push((id, observer));
    id
  }

  /// Remove an observer by ID.
  pub(crate) fn remove(&mut self, id: usize) -> bool {
    let len = self.items.len();
    self.items.retain(|(i, _)| *i != id);
    self.items.len() != len
  }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.items.len() }

  /// Observers in subscription order.
  pub(crate) fn snapshot(&self) -> Snapshot<Item, Err> {
    self.items.iter().map(|(_, o)| o.clone()).collect()
  }

  /// Empties the container, returning the observers in subscription order.
  pub(crate) fn drain(&mut self) -> Snapshot<Item, Err> {
    self.items.drain(..).map(|(_, o)| o).collect()
  }
}

/// Broadcast value to all observers, cloning for all but the last one which
/// receives the moved value.
pub(crate) fn broadcast_value<Item: Clone, Err>(observers: Snapshot<Item, Err>, value: Item) {
  if let Some((last, rest)) = observers.split_last() {
    for observer in rest {
      observer.lock().next(value.clone());
    }
    last.lock().next(value);
  }
}

pub(crate) fn broadcast_error<Item, Err: Clone>(observers: Snapshot<Item, Err>, err: Err) {
  if let Some((last, rest)) = observers.split_last() {
    for observer in rest {
      observer.lock().error(err.clone());
    }
    last.lock().error(err);
  }
}

pub(crate) fn broadcast_complete<Item, Err>(observers: Snapshot<Item, Err>) {
  for observer in observers {
    observer.lock().complete();
  }
}
