use crate::{
  observable::Observable,
  observer::Observer,
  subject::HoldSubject,
  subscriber::Subscriber,
  subscription::SharedSubscription,
};
use std::{collections::HashMap, hash::Hash};

/// One group of a `group_by` stream: the values of the source that share
/// `key`, in source order.
///
/// A group keeps its values until it is first subscribed, so it can be
/// subscribed from inside the downstream `next` or later on.
pub struct GroupedObservable<Key, Item, Err> {
  pub key: Key,
  subject: HoldSubject<Item, Err>,
}

impl<Key: Clone, Item, Err> Clone for GroupedObservable<Key, Item, Err> {
  fn clone(&self) -> Self { GroupedObservable { key: self.key.clone(), subject: self.subject.clone() } }
}

impl<Key, Item, Err> Observable for GroupedObservable<Key, Item, Err>
where
  Key: Send + 'static,
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    self.subject.actual_subscribe(subscriber)
  }
}

#[derive(Clone)]
pub struct GroupByOp<S, F> {
  pub(crate) source: S,
  pub(crate) discr: F,
}

impl<S, F, Key> Observable for GroupByOp<S, F>
where
  S: Observable,
  S::Item: Clone,
  S::Err: Clone,
  F: FnMut(&S::Item) -> Key + Send + 'static,
  Key: Hash + Eq + Clone + Send + 'static,
{
  type Item = GroupedObservable<Key, S::Item, S::Err>;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let observer = GroupByObserver { observer: subscriber, discr: self.discr, groups: HashMap::new() };
    self.source.actual_subscribe(Subscriber::new(observer, subscription))
  }
}

pub struct GroupByObserver<O, F, Key, Item, Err> {
  observer: O,
  discr: F,
  groups: HashMap<Key, HoldSubject<Item, Err>>,
}

impl<O, F, Key, Item, Err> Observer<Item, Err> for GroupByObserver<O, F, Key, Item, Err>
where
  O: Observer<GroupedObservable<Key, Item, Err>, Err>,
  F: FnMut(&Item) -> Key,
  Key: Hash + Eq + Clone,
  Item: Clone,
  Err: Clone,
{
  fn next(&mut self, value: Item) {
    let key = (self.discr)(&value);
    let subject = match self.groups.get(&key) {
      Some(subject) => subject.clone(),
      None => {
        let subject = HoldSubject::new();
        self.groups.insert(key.clone(), subject.clone());
        self.observer.next(GroupedObservable { key, subject: subject.clone() });
        subject
      }
    };
    subject.next(value);
  }

  fn error(&mut self, err: Err) {
    for (_, subject) in self.groups.drain() {
      subject.error(err.clone());
    }
    self.observer.error(err)
  }

  fn complete(&mut self) {
    for (_, subject) in self.groups.drain() {
      subject.complete();
    }
    self.observer.complete()
  }

  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use parking_lot::Mutex;
  use std::{collections::BTreeMap, sync::Arc};

  #[test]
  fn group_by_parity() {
    let groups = Arc::new(Mutex::new(BTreeMap::<bool, Vec<i32>>::new()));
    let c_groups = groups.clone();
    observable::from_iter(0..10).group_by(|v| v % 2 == 0).subscribe(move |group| {
      let key = group.key;
      let c_groups = c_groups.clone();
      group.subscribe(move |v| c_groups.lock().entry(key).or_default().push(v));
    });

    let groups = groups.lock();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[&true], vec![0, 2, 4, 6, 8]);
    assert_eq!(groups[&false], vec![1, 3, 5, 7, 9]);
  }

  #[test]
  fn late_group_subscription_sees_everything() {
    let held = Arc::new(Mutex::new(vec![]));
    let c_held = held.clone();
    observable::from_iter(vec!["apple", "avocado", "banana", "blueberry", "cherry"])
      .group_by(|s| s.as_bytes()[0])
      .subscribe(move |group| c_held.lock().push(group));

    let groups = std::mem::take(&mut *held.lock());
    assert_eq!(groups.iter().map(|g| g.key).collect::<Vec<_>>(), vec![b'a', b'b', b'c']);

    let log = Arc::new(Mutex::new(vec![]));
    for group in groups {
      let (n, c) = (log.clone(), log.clone());
      group.subscribe_all(move |v| n.lock().push(v.to_owned()), |_| {}, move || c.lock().push("|".to_owned()));
    }
    assert_eq!(*log.lock(), vec!["apple", "avocado", "|", "banana", "blueberry", "|", "cherry", "|"]);
  }

  #[test]
  fn error_reaches_every_group() {
    let errors = Arc::new(Mutex::new(vec![]));
    let c_errors = errors.clone();
    let outer_errors = errors.clone();
    observable::create(|mut emitter: Emitter<i32, RxError>| {
      emitter.next(1);
      emitter.next(2);
      emitter.error(RxError::msg("boom"));
    })
    .group_by(|v| *v)
    .subscribe_err(
      move |group| {
        let key = group.key;
        let c_errors = c_errors.clone();
        group.subscribe_err(|_| {}, move |e| c_errors.lock().push(format!("{key}: {e}")));
      },
      move |e| outer_errors.lock().push(format!("outer: {e}")),
    );
    let mut errors = errors.lock().clone();
    assert_eq!(errors.pop().as_deref(), Some("outer: boom"));
    errors.sort();
    assert_eq!(errors, vec!["1: boom", "2: boom"]);
  }
}
