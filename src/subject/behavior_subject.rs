use super::Subject;
use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::SharedSubscription,
};

/// A subject that remembers the latest value and replays it to every new
/// subscriber, before the terminal event when the subject already finished.
pub struct BehaviorSubject<Item, Err> {
  subject: Subject<Item, Err>,
}

impl<Item, Err> Clone for BehaviorSubject<Item, Err> {
  fn clone(&self) -> Self { BehaviorSubject { subject: self.subject.clone() } }
}

impl<Item, Err> BehaviorSubject<Item, Err> {
  /// Creates a subject seeded with `initial`.
  pub fn new(initial: Item) -> Self { BehaviorSubject { subject: Subject::behavior(Some(initial)) } }

  /// Creates a subject that has nothing to replay until the first `next`.
  pub fn empty() -> Self { BehaviorSubject { subject: Subject::behavior(None) } }

  /// The cached value, if any.
  pub fn value(&self) -> Option<Item>
  where
    Item: Clone,
  {
    self.subject.0.lock().latest.clone()
  }

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

impl<Item, Err> Observable for BehaviorSubject<Item, Err>
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

impl<Item: Clone, Err: Clone> Observer<Item, Err> for BehaviorSubject<Item, Err> {
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
  fn replays_initial_then_latest() {
    let subject = BehaviorSubject::<i32, String>::new(0);
    let first = Arc::new(Mutex::new(vec![]));
    let c_first = first.clone();
    subject.clone().subscribe(move |v| c_first.lock().push(v));
    subject.next(1);
    subject.next(2);

    let second = Arc::new(Mutex::new(vec![]));
    let c_second = second.clone();
    subject.clone().subscribe(move |v| c_second.lock().push(v));
    subject.next(3);

    assert_eq!(*first.lock(), vec![0, 1, 2, 3]);
    assert_eq!(*second.lock(), vec![2, 3]);
    assert_eq!(subject.value(), Some(3));
  }

  #[test]
  fn empty_replays_nothing() {
    let subject = BehaviorSubject::<i32, String>::empty();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    subject.clone().subscribe(move |v| c_seen.lock().push(v));
    assert!(seen.lock().is_empty());
    assert_eq!(subject.value(), None);
  }

  #[test]
  fn terminated_replays_latest_before_terminal() {
    let subject = BehaviorSubject::<i32, String>::new(0);
    subject.next(7);
    subject.complete();
    subject.next(8);

    let log = Arc::new(Mutex::new(vec![]));
    let (n, c) = (log.clone(), log.clone());
    subject.clone().subscribe_all(
      move |v| n.lock().push(Notification::Next(v)),
      |_| {},
      move || c.lock().push(Notification::Complete),
    );
    assert_eq!(*log.lock(), vec![Notification::<i32, ()>::Next(7), Notification::Complete]);
  }
}
