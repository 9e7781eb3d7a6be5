use super::retry::Trampoline;
use crate::{
  observable::Observable,
  observer::Observer,
  subject::Subject,
  subscriber::Subscriber,
  subscription::{SharedSubscription, SubscriptionLike},
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Retries driven by a notifier stream.
///
/// `handler` runs once per subscription. It receives a subject carrying every
/// error of the source and returns a notifier: each value of the notifier
/// re-subscribes the source, and its error or completion ends the whole
/// stream with that event.
#[derive(Clone)]
pub struct RetryWhenOp<S, F> {
  pub(crate) source: S,
  pub(crate) handler: F,
}

struct RetryWhenCtx<S: Observable, O> {
  source: Mutex<S>,
  errors: Subject<S::Err, S::Err>,
  observer: Mutex<Subscriber<O>>,
  subscription: SharedSubscription,
  trampoline: Trampoline,
}

impl<S, F, N> Observable for RetryWhenOp<S, F>
where
  S: Observable + Clone,
  S::Err: Clone,
  F: FnOnce(Subject<S::Err, S::Err>) -> N + Send + 'static,
  N: Observable<Err = S::Err>,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let errors = Subject::new();
    let ctx = Arc::new(RetryWhenCtx {
      source: Mutex::new(self.source),
      errors: errors.clone(),
      observer: Mutex::new(subscriber),
      subscription: subscription.clone(),
      trampoline: Trampoline::default(),
    });

    let notifier = SharedSubscription::default();
    subscription.add(notifier.clone());
    (self.handler)(errors).actual_subscribe(Subscriber::new(NotifierObserver { ctx: ctx.clone() }, notifier));

    resubscribe(&ctx);
    subscription
  }
}

fn resubscribe<S, O>(ctx: &Arc<RetryWhenCtx<S, O>>)
where
  S: Observable + Clone,
  S::Err: Clone,
  O: Observer<S::Item, S::Err> + Send + 'static,
{
  ctx.trampoline.run(|| {
    if ctx.subscription.is_closed() {
      return;
    }
    let source = ctx.source.lock().clone();
    let attempt = SharedSubscription::default();
    ctx.subscription.add(attempt.clone());
    source.actual_subscribe(Subscriber::new(RetryWhenObserver { ctx: ctx.clone() }, attempt));
  });
}

pub struct RetryWhenObserver<S: Observable, O> {
  ctx: Arc<RetryWhenCtx<S, O>>,
}

impl<S, O> Observer<S::Item, S::Err> for RetryWhenObserver<S, O>
where
  S: Observable + Clone,
  S::Err: Clone,
  O: Observer<S::Item, S::Err> + Send + 'static,
{
  fn next(&mut self, value: S::Item) { self.ctx.observer.lock().next(value) }

  fn error(&mut self, err: S::Err) {
    debug!("source failed, asking the retry notifier");
    self.ctx.errors.next(err)
  }

  fn complete(&mut self) { self.ctx.observer.lock().complete() }

  fn is_finished(&self) -> bool { self.ctx.subscription.is_closed() }
}

pub struct NotifierObserver<S: Observable, O> {
  ctx: Arc<RetryWhenCtx<S, O>>,
}

impl<S, O, Signal> Observer<Signal, S::Err> for NotifierObserver<S, O>
where
  S: Observable + Clone,
  S::Err: Clone,
  O: Observer<S::Item, S::Err> + Send + 'static,
{
  fn next(&mut self, _: Signal) { resubscribe(&self.ctx) }

  fn error(&mut self, err: S::Err) { self.ctx.observer.lock().error(err) }

  fn complete(&mut self) { self.ctx.observer.lock().complete() }

  fn is_finished(&self) -> bool { self.ctx.subscription.is_closed() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use parking_lot::Mutex;
  use std::{
    sync::{
      atomic::{AtomicUsize, Ordering},
      Arc,
    },
    time::Duration,
  };

  fn failing_twice(runs: &Arc<AtomicUsize>) -> impl Observable<Item = usize, Err = RxError> + Clone {
    let runs = runs.clone();
    observable::create(move |mut emitter: Emitter<usize, RxError>| {
      let run = runs.fetch_add(1, Ordering::SeqCst);
      if run < 2 {
        emitter.error(RxError::msg(format!("run {run}")));
      } else {
        emitter.next(run);
        emitter.complete();
      }
    })
  }

  #[test]
  fn notifier_value_resubscribes() {
    let runs = Arc::new(AtomicUsize::new(0));
    let log = Arc::new(Mutex::new(vec![]));
    let (n, c) = (log.clone(), log.clone());
    failing_twice(&runs)
      .retry_when(|errors| errors.map(|_| ()))
      .subscribe_all(move |v| n.lock().push(format!("next {v}")), |_| {}, move || c.lock().push("complete".into()));
    assert_eq!(runs.load(Ordering::SeqCst), 3);
    assert_eq!(*log.lock(), vec!["next 2", "complete"]);
  }

  #[test]
  fn notifier_completion_ends_stream() {
    let runs = Arc::new(AtomicUsize::new(0));
    let log = Arc::new(Mutex::new(vec![]));
    let (e, c) = (log.clone(), log.clone());
    failing_twice(&runs).retry_when(|errors| errors.take(1)).subscribe_all(
      |_| {},
      move |err| e.lock().push(format!("error {err}")),
      move || c.lock().push("complete".to_owned()),
    );
    // the notifier completes right after its only value, before the queued
    // re-subscription gets to run
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(*log.lock(), vec!["complete"]);
  }

  #[test]
  fn notifier_error_is_final_error() {
    let runs = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(Mutex::new(vec![]));
    let c_errors = errors.clone();
    failing_twice(&runs)
      .retry_when(|errors| errors.try_map(|e| Err::<(), _>(RxError::msg(format!("gave up after {e}")))))
      .subscribe_err(|_| {}, move |e| c_errors.lock().push(e));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(*errors.lock(), vec![RxError::msg("gave up after run 0")]);
  }

  #[test]
  fn delayed_retry_through_notifier() {
    let scheduler = TestScheduler::default();
    let runs = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let c_scheduler = scheduler.clone();
    failing_twice(&runs)
      .retry_when(move |errors| {
        errors.flat_map(move |_| observable::timer(Duration::from_millis(10), c_scheduler.clone()).into_fallible::<RxError>())
      })
      .subscribe(move |v| c_seen.lock().push(v));

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(runs.load(Ordering::SeqCst), 3);
    assert_eq!(*seen.lock(), vec![2]);
  }
}
