//! Retry delay policies.
//!
//! - [`BackoffPolicy`] how the poller's wait grows after consecutive store failures
//! - [`JitterPolicy`] randomization applied to each delay
//!
//! ## Quick wiring
//! ```text
//! Config { retry_backoff: BackoffPolicy, .. }
//!      └─► core::poller uses retry_backoff.next(consecutive_failures)
//!          and resets the counter on the next successful pop
//! ```

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
