use super::Subject;
use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::SharedSubscription,
};

/// A subject that keeps every event until its first subscriber arrives,
/// replays them to it, and from then on behaves like [`Subject`].
///
/// `group_by` groups and `window` windows are hold subjects, so values pushed
/// into a group nobody has subscribed to yet are neither lost nor block the
/// parent stream.
pub struct HoldSubject<Item, Err> {
  subject: Subject<Item, Err>,
}

impl<Item, Err> Clone for HoldSubject<Item, Err> {
  fn clone(&self) -> Self { HoldSubject { subject: self.subject.clone() } }
}

impl<Item, Err> Default for HoldSubject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err> HoldSubject<Item, Err> {
  pub fn new() -> Self { HoldSubject { subject: Subject::hold() } }

  pub fn subscribed_size(&self) -> usize { self.subject.subscribed_size() }

  pub fn is_terminated(&self) -> bool { self.subject.is_terminated() }

  pub fn next(&self, value: Item)
  where
    Item: Clone,
  {
    self.subject.next(value)
  }

  pub fn error(&self, err: Err)
  where
    Err: Clone,
  {
    self.subject.error(err)
  }

  pub fn complete(&self) { self.subject.complete() }
}

impl<Item, Err> Observable for HoldSubject<Item, Err>
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
    self.subject.register(subscriber)
  }
}

impl<Item: Clone, Err: Clone> Observer<Item, Err> for HoldSubject<Item, Err> {
  fn next(&mut self, value: Item) { self.subject.next(value) }

  fn error(&mut self, err: Err) { self.subject.error(err) }

  fn complete(&mut self) { self.subject.complete() }

  fn is_finished(&self) -> bool { self.subject.is_terminated() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use parking_lot::Mutex;
  use std::sync::Arc;

  #[test]
  fn first_subscriber_gets_held_values() {
    let subject = HoldSubject::<i32, String>::new();
    subject.next(1);
    subject.next(2);

    let first = Arc::new(Mutex::new(vec![]));
    let c_first = first.clone();
    subject.clone().subscribe(move |v| c_first.lock().push(v));
    subject.next(3);

    let second = Arc::new(Mutex::new(vec![]));
    let c_second = second.clone();
    subject.clone().subscribe(move |v| c_second.lock().push(v));
    subject.next(4);

    assert_eq!(*first.lock(), vec![1, 2, 3, 4]);
    assert_eq!(*second.lock(), vec![4]);
  }

  #[test]
  fn held_terminal_is_replayed_once() {
    let subject = HoldSubject::<i32, String>::new();
    subject.next(1);
    subject.complete();

    let log = Arc::new(Mutex::new(vec![]));
    let (n, c) = (log.clone(), log.clone());
    subject.clone().subscribe_all(
      move |v| n.lock().push(Notification::Next(v)),
      |_| {},
      move || c.lock().push(Notification::Complete),
    );
    assert_eq!(*log.lock(), vec![Notification::<i32, ()>::Next(1), Notification::Complete]);

    let late = Arc::new(Mutex::new(0));
    let c_late = late.clone();
    subject.clone().subscribe_all(|_| {}, |_| {}, move || *c_late.lock() += 1);
    assert_eq!(*late.lock(), 1);
  }
}
