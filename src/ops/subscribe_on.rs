use crate::{
  observable::Observable,
  observer::Observer,
  scheduler::Scheduler,
  subscriber::Subscriber,
  subscription::SharedSubscription,
};

/// Performs the upstream subscription as a task on `scheduler`. Events are
/// then produced wherever the source produces them, which for a synchronous
/// source is the scheduler's thread.
#[derive(Clone)]
pub struct SubscribeOnOp<S, Sch> {
  pub(crate) source: S,
  pub(crate) scheduler: Sch,
}

impl<S, Sch> Observable for SubscribeOnOp<S, Sch>
where
  S: Observable,
  Sch: Scheduler,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let source = self.source;
    let handle = self.scheduler.schedule(
      move || {
        source.actual_subscribe(subscriber);
      },
      None,
    );
    subscription.add(handle);
    subscription
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use parking_lot::Mutex;
  use std::{sync::Arc, thread, time::Duration};

  #[test]
  fn thread_pool() {
    let (tx, rx) = std::sync::mpsc::channel();
    observable::from_iter(1..5)
      .subscribe_on(scheduler::computation())
      .subscribe(move |v| tx.send((v, thread::current().id())).unwrap());

    let got: Vec<_> = (1..5).map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap()).collect();
    assert_eq!(got.iter().map(|(v, _)| *v).collect::<Vec<_>>(), (1..5).collect::<Vec<_>>());
    assert!(got.iter().all(|(_, id)| *id != thread::current().id()));
  }

  #[test]
  fn deferred_until_scheduler_runs() {
    let scheduler = TestScheduler::default();
    let subscribed = Arc::new(Mutex::new(0));
    let c_subscribed = subscribed.clone();
    observable::defer(move || {
      *c_subscribed.lock() += 1;
      observable::of(1)
    })
    .subscribe_on(scheduler.clone())
    .subscribe(|_| {});
    assert_eq!(*subscribed.lock(), 0);
    scheduler.flush();
    assert_eq!(*subscribed.lock(), 1);
  }

  #[test]
  fn unsubscribe_before_run_skips_subscription() {
    let scheduler = TestScheduler::default();
    let subscribed = Arc::new(Mutex::new(false));
    let c_subscribed = subscribed.clone();
    observable::defer(move || {
      *c_subscribed.lock() = true;
      observable::of(1)
    })
    .subscribe_on(scheduler.clone())
    .subscribe(|_| {})
    .unsubscribe();
    scheduler.flush();
    assert!(!*subscribed.lock());
  }
}
