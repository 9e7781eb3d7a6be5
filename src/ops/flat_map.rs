use crate::{
  observable::Observable,
  observer::Observer,
  rc::MutArc,
  subscriber::Subscriber,
  subscription::{SharedSubscription, SubscriptionLike},
};

/// Maps every value to an inner observable and merges their emissions.
///
/// Inner completions do not end the stream; the first error from the outer
/// source or any inner ends everything. The stream completes once the outer
/// source and every inner completed. Emissions from inners running on
/// different threads are serialized.
#[derive(Clone)]
pub struct FlatMapOp<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

struct ObserverData<O> {
  observer: Subscriber<O>,
  subscribed: usize,
  outside_completed: bool,
}

impl<S, F, Inner> Observable for FlatMapOp<S, F>
where
  S: Observable,
  F: FnMut(S::Item) -> Inner + Send + 'static,
  Inner: Observable<Err = S::Err>,
{
  type Item = Inner::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let outer = SharedSubscription::default();
    subscription.add(outer.clone());

    let data = MutArc::own(ObserverData { observer: subscriber, subscribed: 0, outside_completed: false });
    let observer = FlatMapOuterObserver { data, func: self.func, subscription: subscription.clone() };
    self.source.actual_subscribe(Subscriber::new(observer, outer));
    subscription
  }
}

pub struct FlatMapOuterObserver<O, F> {
  data: MutArc<ObserverData<O>>,
  func: F,
  subscription: SharedSubscription,
}

impl<Item, Err, O, F, Inner> Observer<Item, Err> for FlatMapOuterObserver<O, F>
where
  O: Observer<Inner::Item, Err> + Send + 'static,
  F: FnMut(Item) -> Inner,
  Inner: Observable<Err = Err>,
{
  fn next(&mut self, value: Item) {
    let inner = (self.func)(value);
    self.data.lock().subscribed += 1;
    let inner_subscription = SharedSubscription::default();
    self.subscription.add(inner_subscription.clone());
    inner.actual_subscribe(Subscriber::new(FlatMapInnerObserver { data: self.data.clone() }, inner_subscription));
  }

  fn error(&mut self, err: Err) { self.data.lock().observer.error(err) }

  fn complete(&mut self) {
    let mut data = self.data.lock();
    data.outside_completed = true;
    if data.subscribed == 0 {
      data.observer.complete();
    }
  }

  fn is_finished(&self) -> bool { self.subscription.is_closed() }
}

pub struct FlatMapInnerObserver<O> {
  data: MutArc<ObserverData<O>>,
}

impl<Item, Err, O> Observer<Item, Err> for FlatMapInnerObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { self.data.lock().observer.next(value) }

  fn error(&mut self, err: Err) { self.data.lock().observer.error(err) }

  fn complete(&mut self) {
    let mut data = self.data.lock();
    data.subscribed -= 1;
    if data.outside_completed && data.subscribed == 0 {
      data.observer.complete();
    }
  }

  fn is_finished(&self) -> bool { self.data.lock().observer.is_finished() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use parking_lot::Mutex;
  use std::{sync::Arc, time::Duration};

  #[test]
  fn flattens_synchronous_inners() {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    observable::from_iter(1..=3)
      .flat_map(|v| observable::from_iter(0..v).map(move |i| v * 10 + i))
      .subscribe(move |v| c_seen.lock().push(v));
    assert_eq!(*seen.lock(), vec![10, 20, 21, 30, 31, 32]);
  }

  #[test]
  fn completes_after_every_inner() {
    let scheduler = TestScheduler::default();
    let log = Arc::new(Mutex::new(vec![]));
    let (n, c) = (log.clone(), log.clone());
    let c_scheduler = scheduler.clone();
    observable::from_iter(1..=2)
      .flat_map(move |v| {
        observable::timer(Duration::from_millis(10 * v as u64), c_scheduler.clone()).map(move |_| v)
      })
      .subscribe_all(move |v| n.lock().push(format!("{v}")), |_| {}, move || c.lock().push("done".to_owned()));

    assert!(log.lock().is_empty());
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*log.lock(), vec!["1"]);
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*log.lock(), vec!["1", "2", "done"]);
  }

  #[test]
  fn inner_error_terminates_everything() {
    let scheduler = TestScheduler::default();
    let log = Arc::new(Mutex::new(vec![]));
    let (n, e, c) = (log.clone(), log.clone(), log.clone());
    let c_scheduler = scheduler.clone();
    observable::from_iter(1..=3)
      .into_fallible::<RxError>()
      .flat_map(move |v| {
        let delay = Duration::from_millis(10 * v as u64);
        observable::timer(delay, c_scheduler.clone()).into_fallible::<RxError>().try_map(move |_| {
          if v == 2 {
            Err(RxError::msg("inner failed"))
          } else {
            Ok(v)
          }
        })
      })
      .subscribe_all(
        move |v| n.lock().push(format!("next {v}")),
        move |err| e.lock().push(format!("error {err}")),
        move || c.lock().push("complete".to_owned()),
      );

    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(*log.lock(), vec!["next 1", "error inner failed"]);
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn unsubscribe_cancels_inners() {
    let scheduler = TestScheduler::default();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let c_scheduler = scheduler.clone();
    let subscription = observable::from_iter(0..3)
      .flat_map(move |v| observable::interval(Duration::from_millis(10), c_scheduler.clone()).map(move |i| (v, i)))
      .subscribe(move |v| c_seen.lock().push(v));
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(seen.lock().len(), 3);
    subscription.unsubscribe();
    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(seen.lock().len(), 3);
  }

  #[test]
  fn merges_concurrent_inners() {
    let (tx, rx) = std::sync::mpsc::channel();
    observable::from_iter(0..4)
      .flat_map(|v| observable::from_iter(0..100).map(move |i| v * 100 + i).subscribe_on(scheduler::computation()))
      .subscribe(move |v| tx.send(v).unwrap());
    let mut got: Vec<i32> = (0..400).map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap()).collect();
    got.sort_unstable();
    assert_eq!(got, (0..400).collect::<Vec<_>>());
  }
}
