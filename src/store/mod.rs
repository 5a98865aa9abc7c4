//! # Backing-store seam.
//!
//! The runtime talks to the store through two traits that map onto two
//! separate connections:
//!
//! ```text
//! Store        (shared, &self)      SADD / HSET / RPUSH / PUBLISH / LLEN
//!   └─ open_blocking() ─► BlockingPop (exclusive, &mut self)   BLPOP
//! ```
//!
//! A connection parked in `BLPOP` cannot serve anything else, so the blocking
//! side is a distinct object taking `&mut self`: it can only ever have one
//! command in flight and the non-blocking side never issues a blocking call.
//!
//! Implementations:
//! - [`MemoryStore`] in-process, used by tests and demos
//! - [`RedisStore`] Redis via the `redis` crate (feature `redis`, on by default)

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

mod memory;
#[cfg(feature = "redis")]
mod redis_store;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::{RedisBlockingConnection, RedisStore};

/// Non-blocking store commands.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Adds `member` to the set at `key` (no-op if already present).
    async fn sadd(&self, key: &str, member: &str) -> Result<(), StoreError>;

    /// Sets hash field `field` at `key` to an integer value.
    async fn hset(&self, key: &str, field: &str, value: i64) -> Result<(), StoreError>;

    /// Appends `value` to the tail of the list at `key`.
    async fn rpush(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Publishes `message` on `channel`; returns once the store acknowledged it.
    async fn publish(&self, channel: &str, message: &str) -> Result<(), StoreError>;

    /// Length of the list at `key` (0 when absent).
    async fn llen(&self, key: &str) -> Result<usize, StoreError>;

    /// Opens a new connection reserved for blocking pops.
    async fn open_blocking(&self) -> Result<Box<dyn BlockingPop>, StoreError>;
}

/// Dedicated connection for blocking pops.
#[async_trait]
pub trait BlockingPop: Send + 'static {
    /// Removes and returns the head of the list at `key`, waiting up to
    /// `timeout` for an item. `Ok(None)` means the wait expired.
    async fn blpop(&mut self, key: &str, timeout: Duration) -> Result<Option<String>, StoreError>;
}
