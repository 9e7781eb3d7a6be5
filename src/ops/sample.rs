use crate::{
  observable::Observable,
  observer::Observer,
  scheduler::Scheduler,
  subscriber::Subscriber,
  subscription::{SharedSubscription, SubscriptionLike},
};
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};

/// Emits the most recent source value once per `period`, if a new one
/// arrived since the previous tick. A value still waiting when the source
/// completes is dropped.
///
/// Sampling starts once the source is subscribed, so on `ImmediateScheduler`
/// a synchronous source has already finished and no tick runs.
#[derive(Clone)]
pub struct SampleOp<S, Sch> {
  pub(crate) source: S,
  pub(crate) period: Duration,
  pub(crate) scheduler: Sch,
}

struct SampleState<Item, O> {
  latest: Mutex<Option<Item>>,
  observer: Mutex<Subscriber<O>>,
}

impl<S, Sch> Observable for SampleOp<S, Sch>
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
    let state = Arc::new(SampleState { latest: Mutex::new(None), observer: Mutex::new(subscriber) });

    self.source.actual_subscribe(Subscriber::new(SampleObserver { state: state.clone() }, subscription.clone()));
    if subscription.is_closed() {
      return subscription;
    }
    let handle = self.scheduler.schedule_repeating(
      move |_| {
        let latest = state.latest.lock().take();
        let mut observer = state.observer.lock();
        if let Some(value) = latest {
          observer.next(value);
        }
        !observer.is_finished()
      },
      None,
      self.period,
    );
    subscription.add(handle);
    subscription
  }
}

pub struct SampleObserver<Item, O> {
  state: Arc<SampleState<Item, O>>,
}

impl<Item, Err, O> Observer<Item, Err> for SampleObserver<Item, O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { *self.state.latest.lock() = Some(value); }

  fn error(&mut self, err: Err) { self.state.observer.lock().error(err) }

  fn complete(&mut self) {
    self.state.latest.lock().take();
    self.state.observer.lock().complete()
  }

  fn is_finished(&self) -> bool { self.state.observer.lock().is_finished() }
}
