//! # Metadata & event sink.
//!
//! Writes the per-queue metadata hash, the queue registry and the
//! store-side lifecycle channels. Shared by the producer and the poller.

use std::sync::Arc;

use crate::envelope::now_millis;
use crate::error::StoreError;
use crate::keys::{Channel, Keys, MetaField};
use crate::store::Store;

/// Store-side bookkeeping for one key prefix.
#[derive(Clone)]
pub struct Sink {
    store: Arc<dyn Store>,
    keys: Keys,
}

impl Sink {
    pub fn new(store: Arc<dyn Store>, keys: Keys) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Adds `queue` to the registry set.
    pub async fn register(&self, queue: &str) -> Result<(), StoreError> {
        self.store.sadd(&self.keys.registry(), queue).await
    }

    /// Stamps `field` of the queue's metadata hash with `at` (epoch ms).
    pub async fn stamp_at(&self, queue: &str, field: MetaField, at: i64) -> Result<(), StoreError> {
        self.store
            .hset(&self.keys.meta(queue), field.as_str(), at)
            .await
    }

    /// Stamps `field` of the queue's metadata hash with the current time.
    pub async fn stamp(&self, queue: &str, field: MetaField) -> Result<(), StoreError> {
        self.stamp_at(queue, field, now_millis()).await
    }

    /// Publishes a serialized envelope on a lifecycle channel.
    pub async fn notify(&self, channel: Channel, raw: &str) -> Result<(), StoreError> {
        self.store.publish(&self.keys.channel(channel), raw).await
    }
}
