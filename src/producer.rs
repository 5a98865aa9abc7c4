//! # Producer: enqueue jobs.
//!
//! ```text
//! enqueue(queue, payload)
//!   ├─► SADD    <prefix>queues          queue
//!   ├─► HSET    <prefix>meta.<queue>    lastEnqueued = now
//!   ├─► RPUSH   <prefix>.<queue>        envelope
//!   └─► PUBLISH <prefix>enqueued        envelope   ◄── resolves after this ack
//! ```
//!
//! The steps are not atomic and nothing is rolled back: if the push succeeds
//! and the publish fails, the job stays queued and the caller sees the error.

use serde::Serialize;
use tracing::debug;

use crate::envelope::Envelope;
use crate::error::CuminError;
use crate::events::{Bus, Event, EventKind};
use crate::keys::{Channel, MetaField};
use crate::sink::Sink;

/// Pushes job envelopes onto queue lists.
#[derive(Clone)]
pub struct Producer {
    sink: Sink,
    bus: Bus,
}

impl Producer {
    pub fn new(sink: Sink, bus: Bus) -> Self {
        Self { sink, bus }
    }

    /// Enqueues `payload` on `queue` and returns the pushed envelope.
    ///
    /// # Errors
    /// - [`CuminError::InvalidArgument`] if `queue` is empty
    /// - [`CuminError::Encode`] if `payload` cannot be serialized
    /// - [`CuminError::Store`] if any store command fails
    pub async fn enqueue<T>(&self, queue: &str, payload: &T) -> Result<Envelope, CuminError>
    where
        T: Serialize + ?Sized,
    {
        if queue.is_empty() {
            return Err(CuminError::missing_queue_name());
        }
        let envelope = Envelope::new(queue, serde_json::to_value(payload)?);
        let raw = envelope.to_json()?;

        self.sink.register(queue).await?;
        self.sink
            .stamp_at(queue, MetaField::LastEnqueued, envelope.date)
            .await?;
        self.sink
            .store()
            .rpush(&self.sink.keys().list(queue), &raw)
            .await?;
        self.sink.notify(Channel::Enqueued, &raw).await?;

        debug!(target: "cumin", queue, date = envelope.date, "enqueued");
        self.bus
            .publish(Event::new(EventKind::JobEnqueued).with_queue(queue));
        Ok(envelope)
    }

    /// Callback-style [`enqueue`](Self::enqueue): runs it on a spawned task and
    /// invokes `done` exactly once with the result.
    ///
    /// `payload` is serialized before spawning; an encode failure still
    /// reaches `done`. Must be called from within a tokio runtime.
    pub fn enqueue_with<T, F>(&self, queue: impl Into<String>, payload: T, done: F)
    where
        T: Serialize,
        F: FnOnce(Result<Envelope, CuminError>) + Send + 'static,
    {
        let producer = self.clone();
        let queue = queue.into();
        let value = serde_json::to_value(&payload);
        tokio::spawn(async move {
            let res = match value {
                Ok(value) => producer.enqueue(&queue, &value).await,
                Err(e) => Err(e.into()),
            };
            done(res);
        });
    }
}
