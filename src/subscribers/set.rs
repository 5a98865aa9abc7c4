//! # Per-subscriber delivery lanes.
//!
//! Every runtime event reaching the set is handed to each subscriber through
//! its own bounded lane. A lane is drained by one worker task, so a slow
//! subscriber only ever delays itself.
//!
//! ```text
//! deliver(event)
//!     ├──► lane "log"     ──► worker ──► LogWriter::on_event
//!     │    (try_send)              └──► panic → SubscriberPanicked
//!     └──► lane "metrics" ──► worker ──► ...::on_event
//! ```
//!
//! A full or closed lane loses that one event and reports `SubscriberOverflow`
//! on the bus. Overflow reports are never re-reported.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

struct Lane {
    subscriber: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Bounded fan-out from the runtime bus to a fixed list of subscribers.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Opens one lane and one worker per subscriber.
    ///
    /// Spawns tasks, so it must run inside a tokio runtime.
    #[must_use]
    pub fn new(subscribers: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let (lanes, workers) = subscribers
            .into_iter()
            .map(|sub| {
                let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
                let lane = Lane {
                    subscriber: sub.name(),
                    tx,
                };
                (lane, tokio::spawn(drive(sub, rx, bus.clone())))
            })
            .unzip();

        Self {
            lanes,
            workers,
            bus,
        }
    }

    /// Queues `event` on every lane without waiting.
    pub fn emit(&self, event: Arc<Event>) {
        let reportable = event.kind != EventKind::SubscriberOverflow;

        for lane in &self.lanes {
            let reason = match lane.tx.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(TrySendError::Full(_)) => "full",
                Err(TrySendError::Closed(_)) => "closed",
            };
            if reportable {
                self.bus
                    .publish(Event::subscriber_overflow(lane.subscriber, reason));
            }
        }
    }

    /// Closes every lane, then waits until each worker has delivered what
    /// was already queued.
    pub async fn shutdown(self) {
        let Self { lanes, workers, .. } = self;
        drop(lanes);
        futures::future::join_all(workers).await;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }
}

async fn drive(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(event) = rx.recv().await {
        let delivery = AssertUnwindSafe(sub.on_event(&event)).catch_unwind();
        if let Err(panic) = delivery.await {
            bus.publish(Event::subscriber_panicked(
                sub.name(),
                panic_message(&*panic),
            ));
        }
    }
}

/// Best-effort text for a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&'static str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
