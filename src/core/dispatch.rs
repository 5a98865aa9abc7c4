//! # Run one dequeued job.
//!
//! Executes the handler for a single job, then does the completion
//! bookkeeping. Runs on its own spawned task so the poller never waits.
//!
//! ## Flow
//! ```text
//! Success:
//!   handler → Ok(()) → HSET completed → PUBLISH processed → pending -1 → JobCompleted
//!
//! Failure (Err / dropped Done / panic):
//!   handler → Err(e) → pending -1 → JobFailed (warn)
//!
//! Abandoned (forced termination):
//!   abandon token cancelled → future dropped → pending -1, nothing published
//! ```
//!
//! ## Rules
//! - The pending guard is dropped exactly once, after the completion writes
//!   and before the drain re-check.
//! - Store failures during bookkeeping are logged; they do not fail the job.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::OwnedSemaphorePermit;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    core::{state::RuntimeState, tracker::PendingGuard},
    error::HandlerError,
    events::{Bus, Event, EventKind},
    handlers::{HandlerFuture, HandlerRef},
    keys::{Channel, MetaField},
    sink::Sink,
    subscribers::panic_message,
};

/// Everything a job needs besides the job itself; shared by all jobs of a listener.
pub(crate) struct DispatchContext {
    pub(crate) queue: Arc<str>,
    pub(crate) handler: HandlerRef,
    pub(crate) sink: Sink,
    pub(crate) bus: Bus,
    pub(crate) state: Arc<RuntimeState>,
    pub(crate) abandon: CancellationToken,
}

/// One dequeued job and the resources it holds while running.
pub(crate) struct Job {
    pub(crate) payload: Value,
    /// Raw item as popped, echoed on the `processed` channel.
    pub(crate) raw: String,
    pub(crate) guard: PendingGuard,
    pub(crate) permit: Option<OwnedSemaphorePermit>,
}

/// Spawns `job` on the runtime.
pub(crate) fn spawn(ctx: Arc<DispatchContext>, job: Job) {
    tokio::spawn(async move {
        let abandon = ctx.abandon.clone();
        tokio::select! {
            _ = run_job(&ctx, job) => {}
            _ = abandon.cancelled() => {}
        }
    });
}

async fn run_job(ctx: &DispatchContext, job: Job) {
    let Job {
        payload,
        raw,
        guard,
        permit,
    } = job;

    let res = invoke(ctx, payload).await;

    match res {
        Ok(()) => {
            if let Err(e) = ctx.sink.stamp(&ctx.queue, MetaField::Completed).await {
                warn!(target: "cumin", queue = %ctx.queue, error = %e, "failed to stamp completion");
            }
            if let Err(e) = ctx.sink.notify(Channel::Processed, &raw).await {
                warn!(target: "cumin", queue = %ctx.queue, error = %e, "failed to publish processed event");
            }
            drop(guard);
            drop(permit);
            ctx.bus.publish(
                Event::new(EventKind::JobCompleted)
                    .with_queue(Arc::clone(&ctx.queue))
                    .with_pending(ctx.state.pending.pending()),
            );
        }
        Err(e) => {
            drop(guard);
            drop(permit);
            warn!(target: "cumin", queue = %ctx.queue, error = %e, label = e.as_label(), "handler failed");
            ctx.bus.publish(
                Event::new(EventKind::JobFailed)
                    .with_queue(Arc::clone(&ctx.queue))
                    .with_pending(ctx.state.pending.pending())
                    .with_reason(e.to_string()),
            );
        }
    }

    if ctx.state.shutdown_requested() {
        let pending = ctx.state.pending.pending();
        if pending > 0 {
            info!(target: "cumin", pending, "waiting for pending tasks to be completed");
        }
    }
}

/// Calls the handler, turning a panic in either the call or its future into an error.
async fn invoke(ctx: &DispatchContext, payload: Value) -> Result<(), HandlerError> {
    let fut: HandlerFuture = match catch_unwind(AssertUnwindSafe(|| ctx.handler.call(payload))) {
        Ok(fut) => fut,
        Err(panic) => {
            return Err(HandlerError::Panicked {
                info: panic_message(&*panic),
            });
        }
    };
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(HandlerError::Panicked {
            info: panic_message(&*panic),
        }),
    }
}
