//! # Runtime configuration.
//!
//! Provides [`Config`] centralized settings for the producer and the consumer runtime.
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited (no semaphore created)
//! - `bus_capacity` is clamped to at least 1

use std::time::Duration;

use crate::keys::Keys;
use crate::policies::{BackoffPolicy, JitterPolicy};

/// Global configuration for a cumin runtime.
///
/// ## Field semantics
/// - `prefix`: namespace for every key and channel (`cumin` interoperates with other implementations)
/// - `pop_timeout`: blocking-pop wait, bounds how fast a termination signal is noticed
/// - `kill_wait`: drain window after the first signal before forced termination
/// - `force_grace`: delay between a second signal and forced termination
/// - `max_concurrent`: handler concurrency limit (`0` = unlimited)
/// - `retry_backoff`: delay between polls after consecutive pop failures
/// - `bus_capacity`: runtime event bus ring buffer size
/// - `exit_process`: call `std::process::exit` once the runtime terminates
#[derive(Clone, Debug)]
pub struct Config {
    /// Key and channel namespace.
    pub prefix: String,

    /// Timeout passed to each blocking pop.
    ///
    /// The poller only re-checks the shutdown flag between pops, so this is
    /// also the worst-case latency for noticing a termination signal.
    pub pop_timeout: Duration,

    /// Maximum time to wait for in-flight handlers after the first termination signal.
    pub kill_wait: Duration,

    /// Grace period after a second termination signal before abandoning handlers.
    pub force_grace: Duration,

    /// Maximum number of handlers running at once.
    ///
    /// - `0` = unlimited (no semaphore)
    /// - `n > 0` = the poller stops popping while `n` handlers are running
    pub max_concurrent: usize,

    /// Backoff applied between polls after the store fails a pop.
    pub retry_backoff: BackoffPolicy,

    /// Capacity of the runtime event bus broadcast channel.
    pub bus_capacity: usize,

    /// Exit the process once the runtime reaches `Terminated`.
    pub exit_process: bool,
}

impl Config {
    /// Returns the handler concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited (no semaphore)
    /// - `Some(n)` → at most `n` concurrent handlers
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Key/channel naming for this configuration's prefix.
    #[inline]
    pub fn keys(&self) -> Keys {
        Keys::new(self.prefix.clone())
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `prefix = "cumin"`
    /// - `pop_timeout = 1s`
    /// - `kill_wait = 20s`
    /// - `force_grace = 500ms`
    /// - `max_concurrent = 0` (unlimited)
    /// - `retry_backoff`: 100ms doubling up to 5s, equal jitter
    /// - `bus_capacity = 1024`
    /// - `exit_process = false`
    fn default() -> Self {
        Self {
            prefix: Keys::DEFAULT_PREFIX.to_string(),
            pop_timeout: Duration::from_secs(1),
            kill_wait: Duration::from_secs(20),
            force_grace: Duration::from_millis(500),
            max_concurrent: 0,
            retry_backoff: BackoffPolicy {
                first: Duration::from_millis(100),
                max: Duration::from_secs(5),
                factor: 2.0,
                jitter: JitterPolicy::Equal,
            },
            bus_capacity: 1024,
            exit_process: false,
        }
    }
}
