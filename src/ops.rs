pub mod backpressure;
pub mod buffer;
pub mod default_if_empty;
pub mod filter;
pub mod finalize;
pub mod flat_map;
pub mod group_by;
pub mod map;
pub mod map_err;
pub mod observe_on;
pub mod on_error;
pub mod repeat;
pub mod retry;
pub mod retry_when;
pub mod sample;
pub mod scan;
pub mod skip;
pub mod skip_while;
pub mod start_with;
pub mod subscribe_on;
pub mod take;
pub mod take_until;
pub mod take_while;
pub mod tap;
pub mod window;

pub use backpressure::OverflowStrategy;
pub use group_by::GroupedObservable;
pub use retry::{RetryConfig, RetryPolicy};
