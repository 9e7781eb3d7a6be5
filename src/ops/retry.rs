//! Re-subscribing to a failed source.
//!
//! ```
//! use rxcore::prelude::*;
//! use std::sync::{
//!   atomic::{AtomicUsize, Ordering},
//!   Arc,
//! };
//!
//! let attempts = Arc::new(AtomicUsize::new(0));
//! let c_attempts = attempts.clone();
//! observable::create(move |mut emitter: Emitter<i32, RxError>| {
//!   if c_attempts.fetch_add(1, Ordering::SeqCst) < 2 {
//!     emitter.error(RxError::msg("flaky"));
//!   } else {
//!     emitter.next(1);
//!     emitter.complete();
//!   }
//! })
//! .retry(3)
//! .subscribe(|v| assert_eq!(v, 1));
//! assert_eq!(attempts.load(Ordering::SeqCst), 3);
//! ```
//!
//! Retries without a delay happen on the thread that saw the error, through a
//! trampoline, so a source failing synchronously forever does not grow the
//! stack. Delayed retries are scheduled on the operator's scheduler.

use crate::{
  observable::Observable,
  observer::Observer,
  scheduler::Scheduler,
  subscriber::Subscriber,
  subscription::{SharedSubscription, SubscriptionLike},
};
use parking_lot::Mutex;
use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  time::Duration,
};
use tracing::debug;

/// Decides whether an error is retried and after which delay.
///
/// `attempt` is the number of retries already made for the current run of
/// failures, so the first error is checked with `0`.
pub trait RetryPolicy<Err>: Send + Sync + 'static {
  fn should_retry(&self, err: &Err, attempt: usize) -> Option<Duration>;

  /// Whether a value reaching downstream resets the attempt counter.
  fn reset_on_success(&self) -> bool { false }
}

/// Up to `n` immediate retries; `usize::MAX` retries forever.
impl<Err> RetryPolicy<Err> for usize {
  fn should_retry(&self, _err: &Err, attempt: usize) -> Option<Duration> {
    (attempt < *self).then_some(Duration::ZERO)
  }
}

/// Longest delay a [`RetryConfig`] waits when no `max_delay` is set.
pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Builder for a retry policy with delays.
///
/// ```
/// use rxcore::prelude::*;
/// use std::time::Duration;
///
/// let config = RetryConfig::new()
///   .count(5)
///   .delay(Duration::from_millis(100))
///   .backoff(2.0)
///   .max_delay(Duration::from_secs(1));
/// assert_eq!(RetryPolicy::<RxError>::should_retry(&config, &RxError::msg("x"), 2), Some(Duration::from_millis(400)));
/// assert_eq!(RetryPolicy::<RxError>::should_retry(&config, &RxError::msg("x"), 4), Some(Duration::from_secs(1)));
/// assert_eq!(RetryPolicy::<RxError>::should_retry(&config, &RxError::msg("x"), 5), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
  count: Option<usize>,
  delay: Duration,
  multiplier: f64,
  max_delay: Option<Duration>,
  reset_on_success: bool,
}

impl RetryConfig {
  /// Unlimited immediate retries.
  pub fn new() -> Self {
    RetryConfig { count: None, delay: Duration::ZERO, multiplier: 1.0, max_delay: None, reset_on_success: false }
  }

  /// Maximum number of retries: `count(3)` allows 4 subscriptions in total.
  pub fn count(mut self, count: usize) -> Self {
    self.count = Some(count);
    self
  }

  /// Delay before the first retry.
  pub fn delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }

  /// Multiplies the delay by `multiplier` after every retry.
  pub fn backoff(mut self, multiplier: f64) -> Self {
    self.multiplier = multiplier;
    self
  }

  /// Upper bound for the grown delay, [`DEFAULT_MAX_RETRY_DELAY`] unless
  /// set.
  pub fn max_delay(mut self, max_delay: Duration) -> Self {
    self.max_delay = Some(max_delay);
    self
  }

  /// Resets the attempt counter whenever a value gets through.
  pub fn reset_on_success(mut self) -> Self {
    self.reset_on_success = true;
    self
  }

  fn delay_for(&self, attempt: usize) -> Duration {
    if self.delay.is_zero() {
      return Duration::ZERO;
    }
    let exp = attempt.min(i32::MAX as usize) as i32;
    let secs = self.delay.as_secs_f64() * self.multiplier.powi(exp);
    let ceiling = self.max_delay.unwrap_or(DEFAULT_MAX_RETRY_DELAY);
    Duration::try_from_secs_f64(secs).map_or(ceiling, |delay| delay.min(ceiling))
  }
}

impl Default for RetryConfig {
  fn default() -> Self { Self::new() }
}

impl<Err> RetryPolicy<Err> for RetryConfig {
  fn should_retry(&self, _err: &Err, attempt: usize) -> Option<Duration> {
    if self.count.map_or(false, |count| attempt >= count) {
      return None;
    }
    Some(self.delay_for(attempt))
  }

  fn reset_on_success(&self) -> bool { self.reset_on_success }
}

/// Immediate retries while `predicate` accepts the error, at most `max`
/// times.
#[derive(Clone)]
pub struct RetryIf<F> {
  pub(crate) max: usize,
  pub(crate) predicate: F,
}

impl<Err, F> RetryPolicy<Err> for RetryIf<F>
where
  F: Fn(&Err) -> bool + Send + Sync + 'static,
{
  fn should_retry(&self, err: &Err, attempt: usize) -> Option<Duration> {
    (attempt < self.max && (self.predicate)(err)).then_some(Duration::ZERO)
  }
}

#[derive(Default)]
struct TrampolineState {
  running: bool,
  pending: usize,
}

/// Turns nested re-subscription requests into a loop on the outermost
/// caller.
#[derive(Default)]
pub(crate) struct Trampoline(Mutex<TrampolineState>);

impl Trampoline {
  /// Runs `step` now, or, when a run is already in progress, queues one more
  /// iteration of it and returns.
  pub(crate) fn run(&self, mut step: impl FnMut()) {
    {
      let mut state = self.0.lock();
      state.pending += 1;
      if state.running {
        return;
      }
      state.running = true;
    }
    loop {
      {
        let mut state = self.0.lock();
        if state.pending == 0 {
          state.running = false;
          return;
        }
        state.pending -= 1;
      }
      step();
    }
  }
}

#[derive(Clone)]
pub struct RetryOp<S, P, Sch> {
  pub(crate) source: S,
  pub(crate) policy: P,
  pub(crate) scheduler: Sch,
}

struct RetryCtx<S, P, Sch, O> {
  source: Mutex<S>,
  policy: P,
  scheduler: Sch,
  observer: Mutex<Subscriber<O>>,
  subscription: SharedSubscription,
  attempts: AtomicUsize,
  trampoline: Trampoline,
}

impl<S, P, Sch> Observable for RetryOp<S, P, Sch>
where
  S: Observable + Clone,
  P: RetryPolicy<S::Err>,
  Sch: Scheduler,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, subscriber: Subscriber<O>) -> SharedSubscription
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let subscription = subscriber.subscription.clone();
    let ctx = Arc::new(RetryCtx {
      source: Mutex::new(self.source),
      policy: self.policy,
      scheduler: self.scheduler,
      observer: Mutex::new(subscriber),
      subscription: subscription.clone(),
      attempts: AtomicUsize::new(0),
      trampoline: Trampoline::default(),
    });
    resubscribe(&ctx);
    subscription
  }
}

fn resubscribe<S, P, Sch, O>(ctx: &Arc<RetryCtx<S, P, Sch, O>>)
where
  S: Observable + Clone,
  P: RetryPolicy<S::Err>,
  Sch: Scheduler,
  O: Observer<S::Item, S::Err> + Send + 'static,
{
  ctx.trampoline.run(|| {
    if ctx.subscription.is_closed() {
      return;
    }
    let source = ctx.source.lock().clone();
    let attempt = SharedSubscription::default();
    ctx.subscription.add(attempt.clone());
    source.actual_subscribe(Subscriber::new(RetryObserver { ctx: ctx.clone() }, attempt));
  });
}

pub struct RetryObserver<S, P, Sch, O> {
  ctx: Arc<RetryCtx<S, P, Sch, O>>,
}

impl<S, P, Sch, O> Observer<S::Item, S::Err> for RetryObserver<S, P, Sch, O>
where
  S: Observable + Clone,
  P: RetryPolicy<S::Err>,
  Sch: Scheduler,
  O: Observer<S::Item, S::Err> + Send + 'static,
{
  fn next(&mut self, value: S::Item) {
    if self.ctx.policy.reset_on_success() {
      self.ctx.attempts.store(0, Ordering::Release);
    }
    self.ctx.observer.lock().next(value)
  }

  fn error(&mut self, err: S::Err) {
    let attempt = self.ctx.attempts.load(Ordering::Acquire);
    match self.ctx.policy.should_retry(&err, attempt) {
      Some(delay) => {
        self.ctx.attempts.store(attempt + 1, Ordering::Release);
        debug!(attempt = attempt + 1, ?delay, "retrying after error");
        if delay.is_zero() {
          resubscribe(&self.ctx);
        } else {
          let ctx = self.ctx.clone();
          let handle = self.ctx.scheduler.schedule(move || resubscribe(&ctx), Some(delay));
          self.ctx.subscription.add(handle);
        }
      }
      None => self.ctx.observer.lock().error(err),
    }
  }

  fn complete(&mut self) { self.ctx.observer.lock().complete() }

  fn is_finished(&self) -> bool { self.ctx.subscription.is_closed() }
}
