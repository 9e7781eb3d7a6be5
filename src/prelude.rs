//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Factories and core traits
pub use crate::observable::{
  self, AutoConnect, ConnectableObservable, Emitter, Observable, ObservableExt, RefCount,
};
// Observer
pub use crate::observer::{Notification, Observer};
pub use crate::subscriber::Subscriber;
// Subscription
pub use crate::subscription::{SharedSubscription, SubscriptionGuard, SubscriptionLike, SubscriptionWrapper};
// Schedulers
pub use crate::scheduler::{
  self, ImmediateScheduler, NewThreadScheduler, Scheduler, TaskHandle, TestScheduler, ThreadPoolScheduler,
  TimerScheduler,
};
// Subjects
pub use crate::subject::{BehaviorSubject, HoldSubject, Subject};
// Errors and policies
pub use crate::error::{CompositeError, OverflowError, RxError};
pub use crate::ops::{GroupedObservable, OverflowStrategy, RetryConfig, RetryPolicy};
