//! # Poller: the blocking-dequeue loop.
//!
//! Owns the dedicated blocking connection and pops one item at a time,
//! handing each decoded job to [`dispatch`](super::dispatch) without waiting
//! for it to finish.
//!
//! ```text
//! loop {
//!   ├─► shutdown requested?        → park (return)
//!   ├─► acquire permit (if limited, cancellable)
//!   ├─► BLPOP <prefix>.<queue> pop_timeout
//!   │     ├─► None                 → continue
//!   │     ├─► Some(raw)
//!   │     │     ├─► decode         → DecodeFailed, skip on error
//!   │     │     ├─► HSET lastDequeued, PUBLISH dequeued
//!   │     │     ├─► pending +1     → JobDequeued
//!   │     │     └─► spawn handler
//!   │     └─► Err(e)               → PopFailed, backoff sleep (cancellable)
//! }
//! ```
//!
//! ## Rules
//! - Shutdown is observed between pops only; a pop in flight when the signal
//!   arrives completes and its item is dispatched.
//! - The failure counter resets on any successful pop, empty or not.

use std::sync::Arc;
use std::time::Duration;

use tokio::{
    select,
    sync::{OwnedSemaphorePermit, Semaphore},
    time,
};
use tracing::{debug, warn};

use crate::{
    core::dispatch::{self, DispatchContext, Job},
    envelope::Envelope,
    events::{Event, EventKind},
    keys::{Channel, MetaField},
    policies::BackoffPolicy,
    store::BlockingPop,
};

pub(crate) struct Poller {
    pub(crate) conn: Box<dyn BlockingPop>,
    pub(crate) list_key: String,
    pub(crate) pop_timeout: Duration,
    pub(crate) backoff: BackoffPolicy,
    pub(crate) semaphore: Option<Arc<Semaphore>>,
    pub(crate) ctx: Arc<DispatchContext>,
}

impl Poller {
    /// Runs until shutdown is requested. Returning means the poller has parked.
    pub(crate) async fn run(mut self) {
        let shutdown = self.ctx.state.shutdown.clone();
        let mut failures: u32 = 0;

        loop {
            if shutdown.is_cancelled() {
                break;
            }
            let permit = match &self.semaphore {
                Some(sem) => {
                    let permit_future = Arc::clone(sem).acquire_owned();
                    tokio::pin!(permit_future);

                    select! {
                        res = &mut permit_future => match res {
                            Ok(permit) => Some(permit),
                            Err(_closed) => break,
                        },
                        _ = shutdown.cancelled() => break,
                    }
                }
                None => None,
            };

            match self.conn.blpop(&self.list_key, self.pop_timeout).await {
                Ok(None) => {
                    failures = 0;
                }
                Ok(Some(raw)) => {
                    failures = 0;
                    accept(&self.ctx, raw, permit).await;
                }
                Err(e) => {
                    let delay = self.backoff.next(failures);
                    failures = failures.saturating_add(1);
                    warn!(
                        target: "cumin",
                        queue = %self.ctx.queue,
                        error = %e,
                        label = e.as_label(),
                        ?delay,
                        "blocking pop failed"
                    );
                    self.ctx.bus.publish(
                        Event::new(EventKind::PopFailed)
                            .with_queue(Arc::clone(&self.ctx.queue))
                            .with_reason(e.to_string())
                            .with_delay(delay),
                    );
                    drop(permit);

                    let sleep = time::sleep(delay);
                    tokio::pin!(sleep);
                    select! {
                        _ = &mut sleep => {}
                        _ = shutdown.cancelled() => break,
                    }
                }
            }
        }
        debug!(target: "cumin", queue = %self.ctx.queue, "poller parked");
    }
}

/// Decodes one popped item and dispatches it.
async fn accept(ctx: &Arc<DispatchContext>, raw: String, permit: Option<OwnedSemaphorePermit>) {
    let envelope = match Envelope::from_json(&raw) {
        Ok(env) => env,
        Err(e) => {
            warn!(target: "cumin", queue = %ctx.queue, error = %e, "skipping undecodable item");
            ctx.bus.publish(
                Event::new(EventKind::DecodeFailed)
                    .with_queue(Arc::clone(&ctx.queue))
                    .with_reason(e.to_string()),
            );
            return;
        }
    };

    if let Err(e) = ctx.sink.stamp(&ctx.queue, MetaField::LastDequeued).await {
        warn!(target: "cumin", queue = %ctx.queue, error = %e, "failed to stamp dequeue");
    }
    if let Err(e) = ctx.sink.notify(Channel::Dequeued, &raw).await {
        warn!(target: "cumin", queue = %ctx.queue, error = %e, "failed to publish dequeued event");
    }

    let guard = ctx.state.pending.enter();
    let pending = ctx.state.pending.pending();
    debug!(target: "cumin", queue = %ctx.queue, pending, date = envelope.date, "dequeued");
    ctx.bus.publish(
        Event::new(EventKind::JobDequeued)
            .with_queue(Arc::clone(&ctx.queue))
            .with_pending(pending),
    );

    dispatch::spawn(
        Arc::clone(ctx),
        Job {
            payload: envelope.data,
            raw,
            guard,
            permit,
        },
    );
}
