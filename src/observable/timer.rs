use crate::{
  observable::Observable, observer::Observer, scheduler::Scheduler, subscriber::Subscriber,
  subscription::SharedSubscription,
};
use std::{convert::Infallible, time::Duration};

/// Emits a single `()` after `delay`, then completes.
pub fn timer<S: Scheduler>(delay: Duration, scheduler: S) -> TimerObservable<S> { TimerObservable { delay, scheduler } }

#[derive(Clone)]
pub struct TimerObservable<S> {
  delay: Duration,
  scheduler: S,
}

impl<S: Scheduler> Observable for TimerObservable<S> {
  type Item = ();
  type Err = Infallible;

  fn actual_subscribe<O>(self, mut subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let handle = self.scheduler.schedule(
      move || {
        subscriber.next(());
        subscriber.complete();
      },
      Some(self.delay),
    );
    subscription.add(handle);
    subscription
  }
}
