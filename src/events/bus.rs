//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`].
//!
//! ```text
//! Publishers:                          Subscribers:
//!   Producer ──┐
//!   Poller   ──┼──► Bus ──► listener fan-out ──► SubscriberSet
//!   Dispatch ──┤           (other receivers: tests, embedding apps)
//!   Shutdown ──┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks.
//! - Slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - Events sent with no live receiver are dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
