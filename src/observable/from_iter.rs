use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::SharedSubscription,
};
use std::{convert::Infallible, iter, ops::Range};

/// Creates an observable that produces values from an iterator.
///
/// Completes when all elements have been emitted. Never emits an error. The
/// iterator is polled lazily, so a subscriber that unsubscribes (or a `take`
/// downstream) stops it early.
///
/// ```
/// use rxcore::prelude::*;
///
/// observable::from_iter(vec![0, 1, 2, 3]).subscribe(|v| println!("{v},"));
/// ```
pub fn from_iter<Iter>(iter: Iter) -> ObservableIter<Iter>
where
  Iter: IntoIterator,
{
  ObservableIter(iter)
}

/// Emits a single value, then completes.
pub fn of<Item>(value: Item) -> ObservableIter<iter::Once<Item>> { from_iter(iter::once(value)) }

/// Emits `count` consecutive integers starting at `start`.
pub fn range(start: i64, count: usize) -> ObservableIter<Range<i64>> {
  let end = i64::try_from(count).map_or(i64::MAX, |count| start.saturating_add(count));
  from_iter(start..end)
}

#[derive(Clone)]
pub struct ObservableIter<Iter>(Iter);

impl<Iter> Observable for ObservableIter<Iter>
where
  Iter: IntoIterator + Send + 'static,
  Iter::Item: Send + 'static,
{
  type Item = Iter::Item;
  type Err = Infallible;

  fn actual_subscribe<O>(self, mut subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    for v in self.0 {
      if subscriber.is_finished() {
        return subscription;
      }
      subscriber.next(v);
    }
    subscriber.complete();
    subscription
  }
}
