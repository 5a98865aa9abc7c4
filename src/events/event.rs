//! # Runtime events emitted by the producer, poller and shutdown coordinator.
//!
//! [`EventKind`] classifies events in three groups:
//! - **Job events**: enqueue, dequeue, completion, failure
//! - **Loop events**: decode and store failures seen by the poller
//! - **Shutdown events**: signal handling and the terminal outcome
//!
//! These events live on the in-process [`Bus`](crate::events::Bus); they are
//! unrelated to the store-side `<prefix>enqueued` / `dequeued` / `processed`
//! channels, which carry the raw envelope.
//!
//! ## Example
//! ```rust
//! use cumin::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::JobFailed)
//!     .with_queue("emails")
//!     .with_reason("smtp timeout")
//!     .with_pending(2);
//!
//! assert_eq!(ev.kind, EventKind::JobFailed);
//! assert_eq!(ev.queue.as_deref(), Some("emails"));
//! assert_eq!(ev.pending, Some(2));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets `queue` (subscriber name) and `reason` (panic info).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `queue` (subscriber name) and `reason`.
    SubscriberOverflow,

    // === Job events ===
    /// Producer pushed an envelope.
    ///
    /// Sets `queue`.
    JobEnqueued,

    /// Poller popped and decoded an envelope; the handler is about to run.
    ///
    /// Sets `queue`, `pending` (count including this job).
    JobDequeued,

    /// Handler finished successfully.
    ///
    /// Sets `queue`, `pending` (count after this job).
    JobCompleted,

    /// Handler returned an error, dropped its completion token, or panicked.
    ///
    /// Sets `queue`, `pending` (count after this job), `reason`.
    JobFailed,

    // === Loop events ===
    /// Listener opened its blocking connection and started polling.
    ///
    /// Sets `queue`.
    ListenStarted,

    /// A popped item was not a valid envelope and was skipped.
    ///
    /// Sets `queue`, `reason`.
    DecodeFailed,

    /// The store failed a pop; the poller backs off and retries.
    ///
    /// Sets `queue`, `reason`, `delay_ms`.
    PopFailed,

    // === Shutdown events ===
    /// First termination signal observed; intake stops and drain begins.
    ///
    /// Sets `pending`, `delay_ms` (kill wait).
    ShutdownRequested,

    /// Second termination signal observed; forced termination scheduled.
    ///
    /// Sets `pending`, `delay_ms` (force grace).
    ForceRequested,

    /// Every in-flight handler finished during drain.
    DrainCompleted,

    /// Kill timer fired before drain finished; handlers abandoned.
    ///
    /// Sets `pending`.
    KillTimerExpired,

    /// Forced termination after a second signal; handlers abandoned.
    ///
    /// Sets `pending`.
    ShutdownForced,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Bare queue name (or subscriber name for subscriber events).
    pub queue: Option<Arc<str>>,
    /// Pending handler count at the time of the event.
    pub pending: Option<usize>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Delay in milliseconds (retry backoff, kill wait, force grace).
    pub delay_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            queue: None,
            pending: None,
            reason: None,
            delay_ms: None,
        }
    }

    #[inline]
    pub fn with_queue(mut self, queue: impl Into<Arc<str>>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    #[inline]
    pub fn with_pending(mut self, pending: usize) -> Self {
        self.pending = Some(pending);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_queue(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_queue(subscriber)
            .with_reason(info)
    }

    /// True for the events that end a listener's run.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::DrainCompleted | EventKind::KillTimerExpired | EventKind::ShutdownForced
        )
    }
}
