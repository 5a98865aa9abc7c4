//! # LogWriter: runtime events as `tracing` records
//!
//! Renders bus events under the `cumin` target. Lifecycle and shutdown events
//! are `info`; job and loop events are `debug`, since the runtime already logs
//! failures at `warn` where they happen.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO cumin: listening queue="emails"
//! DEBUG cumin: job dequeued queue="emails" pending=1
//! DEBUG cumin: job failed queue="emails" pending=0 error="handler failed: smtp timeout"
//! INFO cumin: attempting clean shutdown, hit Ctrl+C again to force pending=1 kill_wait_ms=20000
//! INFO cumin: pending tasks completed, shutting down
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let queue = e.queue.as_deref().unwrap_or("");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::ListenStarted => {
                info!(target: "cumin", queue, "listening");
            }
            EventKind::JobEnqueued => {
                debug!(target: "cumin", queue, "job enqueued");
            }
            EventKind::JobDequeued => {
                debug!(target: "cumin", queue, pending = ?e.pending, "job dequeued");
            }
            EventKind::JobCompleted => {
                debug!(target: "cumin", queue, pending = ?e.pending, "job completed");
            }
            EventKind::JobFailed => {
                debug!(target: "cumin", queue, pending = ?e.pending, error = reason, "job failed");
            }
            EventKind::DecodeFailed => {
                debug!(target: "cumin", queue, error = reason, "skipping undecodable item");
            }
            EventKind::PopFailed => {
                debug!(target: "cumin", queue, error = reason, retry_in_ms = ?e.delay_ms, "blocking pop failed");
            }
            EventKind::ShutdownRequested => {
                info!(
                    target: "cumin",
                    pending = ?e.pending,
                    kill_wait_ms = ?e.delay_ms,
                    "attempting clean shutdown, hit Ctrl+C again to force"
                );
            }
            EventKind::ForceRequested => {
                info!(target: "cumin", pending = ?e.pending, grace_ms = ?e.delay_ms, "forcing shutdown");
            }
            EventKind::DrainCompleted => {
                info!(target: "cumin", "pending tasks completed, shutting down");
            }
            EventKind::KillTimerExpired => {
                warn!(target: "cumin", pending = ?e.pending, "forcing kill: drain timeout exceeded");
            }
            EventKind::ShutdownForced => {
                warn!(target: "cumin", pending = ?e.pending, "forced shutdown, abandoning in-flight jobs");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "cumin", subscriber = queue, reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                warn!(target: "cumin", subscriber = queue, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
