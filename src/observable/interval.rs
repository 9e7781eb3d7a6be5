use crate::{
  observable::Observable, observer::Observer, scheduler::Scheduler, subscriber::Subscriber,
  subscription::SharedSubscription,
};
use std::{convert::Infallible, time::Duration};

/// Creates an observable which emits a sequential index every `period`.
///
/// The first value arrives after one period. The sequence never completes on
/// its own; unsubscribing (or a limiting operator downstream) ends it.
///
/// On [`ImmediateScheduler`](crate::scheduler::ImmediateScheduler) the ticks
/// run on the subscribing thread, so `subscribe` returns only after a
/// downstream operator such as `take` finished the stream. The subscription
/// it returns comes too late to stop the ticks.
pub fn interval<S: Scheduler>(period: Duration, scheduler: S) -> IntervalObservable<S> {
  IntervalObservable { period, delay: None, scheduler }
}

/// Like [`interval`], but the first value arrives after `delay`.
pub fn interval_with_delay<S: Scheduler>(delay: Duration, period: Duration, scheduler: S) -> IntervalObservable<S> {
  IntervalObservable { period, delay: Some(delay), scheduler }
}

#[derive(Clone)]
pub struct IntervalObservable<S> {
  period: Duration,
  delay: Option<Duration>,
  scheduler: S,
}

impl<S: Scheduler> Observable for IntervalObservable<S> {
  type Item = usize;
  type Err = Infallible;

  fn actual_subscribe<O>(self, mut subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let handle = self.scheduler.schedule_repeating(
      move |seq| {
        subscriber.next(seq);
        !subscriber.is_finished()
      },
      self.delay,
      self.period,
    );
    subscription.add(handle);
    subscription
  }
}
