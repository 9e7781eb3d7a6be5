//! # rxcore: a reactive-stream execution core
//!
//! Push based streams with composable operators, thread-safe subscriptions,
//! pluggable schedulers and explicit backpressure.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxcore::prelude::*;
//!
//! observable::from_iter(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe(|v| println!("Value: {}", v));
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | A cold source; every subscription runs it again |
//! | [`ObservableExt`] | Operators and `subscribe` methods for every observable |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`SharedSubscription`] | Handle to cancel an active subscription |
//! | [`Scheduler`] | Decides where and when deferred work runs |
//! | [`Subject`] | A hot source that multicasts whatever is pushed into it |
//!
//! Errors are typed per stream. Sources that cannot fail use
//! [`Infallible`](std::convert::Infallible); [`RxError`] covers the failures
//! the runtime itself produces.
//!
//! [`Observable`]: observable::Observable
//! [`ObservableExt`]: observable::ObservableExt
//! [`Observer`]: observer::Observer
//! [`SharedSubscription`]: subscription::SharedSubscription
//! [`Scheduler`]: scheduler::Scheduler
//! [`Subject`]: subject::Subject
//! [`RxError`]: error::RxError

pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscriber;
pub mod subscription;

pub use prelude::*;
