use super::retry::Trampoline;
use crate::{
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
  subscription::{SharedSubscription, SubscriptionLike},
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Runs the source `count` times in a row, re-subscribing after each
/// completion. Errors end the stream at once.
#[derive(Clone)]
pub struct RepeatOp<S> {
  pub(crate) source: S,
  pub(crate) count: usize,
}

struct RepeatCtx<S, O> {
  source: Mutex<S>,
  observer: Mutex<Subscriber<O>>,
  subscription: SharedSubscription,
  remaining: Mutex<usize>,
  trampoline: Trampoline,
}

impl<S> Observable for RepeatOp<S>
where
  S: Observable + Clone,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, mut subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    if self.count == 0 {
      subscriber.complete();
      return subscription;
    }
    let ctx = Arc::new(RepeatCtx {
      source: Mutex::new(self.source),
      observer: Mutex::new(subscriber),
      subscription: subscription.clone(),
      remaining: Mutex::new(self.count),
      trampoline: Trampoline::default(),
    });
    resubscribe(&ctx);
    subscription
  }
}

fn resubscribe<S, O>(ctx: &Arc<RepeatCtx<S, O>>)
where
  S: Observable + Clone,
  O: Observer<S::Item, S::Err> + Send + 'static,
{
  ctx.trampoline.run(|| {
    if ctx.subscription.is_closed() {
      return;
    }
    *ctx.remaining.lock() -= 1;
    let source = ctx.source.lock().clone();
    let run = SharedSubscription::default();
    ctx.subscription.add(run.clone());
    source.actual_subscribe(Subscriber::new(RepeatObserver { ctx: ctx.clone() }, run));
  });
}

pub struct RepeatObserver<S, O> {
  ctx: Arc<RepeatCtx<S, O>>,
}

impl<S, O> Observer<S::Item, S::Err> for RepeatObserver<S, O>
where
  S: Observable + Clone,
  O: Observer<S::Item, S::Err> + Send + 'static,
{
  fn next(&mut self, value: S::Item) { self.ctx.observer.lock().next(value) }

  fn error(&mut self, err: S::Err) { self.ctx.observer.lock().error(err) }

  fn complete(&mut self) {
    if *self.ctx.remaining.lock() == 0 {
      self.ctx.observer.lock().complete();
    } else {
      resubscribe(&self.ctx);
    }
  }

  fn is_finished(&self) -> bool { self.ctx.subscription.is_closed() }
}
