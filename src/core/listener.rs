//! # Listener: poller plus shutdown coordinator for one queue.
//!
//! Returned by [`Cumin::listen`](crate::Cumin::listen) once the synchronous
//! preconditions hold. [`Listener::run`] owns everything else:
//!
//! ```text
//! run()
//!   ├─► open signal source (SIGINT/SIGTERM, or manual)
//!   ├─► Store::open_blocking()          one dedicated connection
//!   ├─► spawn Poller::run()             BLPOP loop, dispatches handlers
//!   └─► coordinate:
//!         signal #1   → cancel shutdown token, arm kill timer   (Draining)
//!         poller done → parked
//!         parked && pending == 0        → Drained
//!         kill timer                    → KillTimerExpired
//!         signal #2   → disarm kill, arm force grace
//!         force grace                   → Forced
//! ```
//!
//! On termination every handler still running is abandoned: its future is
//! dropped at its next await point and the pending guard it holds is released.

use std::sync::Arc;
use std::time::Duration;

use tokio::{
    select,
    sync::Semaphore,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{
    core::{
        builder::Fanout,
        config::Config,
        dispatch::DispatchContext,
        poller::Poller,
        shutdown::{ShutdownMachine, ShutdownOutcome, SignalAction},
        signals::SignalSource,
        state::RuntimeState,
    },
    error::CuminError,
    events::{Bus, Event, EventKind},
    handlers::HandlerRef,
    sink::Sink,
};

/// A claimed consumer for one queue, ready to [`run`](Listener::run).
pub struct Listener {
    queue: Arc<str>,
    handler: HandlerRef,
    sink: Sink,
    bus: Bus,
    cfg: Config,
    state: Arc<RuntimeState>,
    signals: SignalSource,
    fanout: Option<Fanout>,
}

impl Listener {
    pub(crate) fn new(
        queue: &str,
        handler: HandlerRef,
        sink: Sink,
        bus: Bus,
        cfg: Config,
        state: Arc<RuntimeState>,
        fanout: Option<Fanout>,
    ) -> Self {
        Self {
            queue: Arc::from(queue),
            handler,
            sink,
            bus,
            cfg,
            state,
            signals: SignalSource::Os,
            fanout,
        }
    }

    /// Bare queue name this listener consumes.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Replaces the termination-signal source (OS signals by default).
    pub fn with_signals(mut self, signals: SignalSource) -> Self {
        self.signals = signals;
        self
    }

    /// Consumes the queue until the shutdown coordinator terminates.
    ///
    /// Returns how the run ended. If [`Config::exit_process`] is set the
    /// subscribers are flushed and closed, then the process exits with
    /// status 0 instead of returning.
    ///
    /// # Errors
    /// - [`CuminError::Signal`] if the signal handlers cannot be installed
    /// - [`CuminError::Store`] if the blocking connection cannot be opened
    pub async fn run(self) -> Result<ShutdownOutcome, CuminError> {
        let Listener {
            queue,
            handler,
            sink,
            bus,
            cfg,
            state,
            signals,
            fanout,
        } = self;

        let mut signals = signals.open()?;
        let conn = sink.store().open_blocking().await?;

        let abandon = CancellationToken::new();
        let list_key = sink.keys().list(&queue);
        let ctx = Arc::new(DispatchContext {
            queue: Arc::clone(&queue),
            handler,
            sink,
            bus: bus.clone(),
            state: Arc::clone(&state),
            abandon: abandon.clone(),
        });
        let poller = Poller {
            conn,
            list_key,
            pop_timeout: cfg.pop_timeout,
            backoff: cfg.retry_backoff,
            semaphore: cfg
                .concurrency_limit()
                .map(|n| Arc::new(Semaphore::new(n))),
            ctx,
        };

        debug!(target: "cumin", queue = %queue, "listening");
        bus.publish(Event::new(EventKind::ListenStarted).with_queue(Arc::clone(&queue)));
        let mut poller_task = tokio::spawn(poller.run());

        let tracker = Arc::clone(&state.pending);
        let mut machine = ShutdownMachine::new();
        let mut parked = false;
        let mut signals_open = true;

        let kill = time::sleep(Duration::ZERO);
        tokio::pin!(kill);
        let mut kill_armed = false;
        let force = time::sleep(Duration::ZERO);
        tokio::pin!(force);
        let mut force_armed = false;

        let outcome = loop {
            select! {
                sig = signals.recv(), if signals_open => {
                    let Some(()) = sig else {
                        debug!(target: "cumin", "signal source closed");
                        signals_open = false;
                        continue;
                    };
                    match machine.on_signal() {
                        SignalAction::BeginDrain => {
                            state.shutdown.cancel();
                            kill.as_mut().reset(Instant::now() + cfg.kill_wait);
                            kill_armed = true;

                            let pending = tracker.pending();
                            debug!(target: "cumin", pending, kill_wait = ?cfg.kill_wait, "shutdown requested, stopping intake");
                            bus.publish(
                                Event::new(EventKind::ShutdownRequested)
                                    .with_pending(pending)
                                    .with_delay(cfg.kill_wait),
                            );
                        }
                        SignalAction::ScheduleForce => {
                            kill_armed = false;
                            force.as_mut().reset(Instant::now() + cfg.force_grace);
                            force_armed = true;

                            let pending = tracker.pending();
                            debug!(target: "cumin", pending, "second signal, forcing termination");
                            bus.publish(
                                Event::new(EventKind::ForceRequested)
                                    .with_pending(pending)
                                    .with_delay(cfg.force_grace),
                            );
                        }
                        SignalAction::Ignore => {}
                    }
                }
                res = &mut poller_task, if !parked => {
                    parked = true;
                    match res {
                        Ok(()) => debug!(target: "cumin", queue = %queue, "intake stopped"),
                        Err(e) => error!(target: "cumin", queue = %queue, error = %e, "poller task ended abnormally"),
                    }
                }
                _ = tracker.idle(), if parked && machine.is_draining() => {
                    if let Some(outcome) = machine.on_idle() {
                        break outcome;
                    }
                }
                _ = &mut kill, if kill_armed => {
                    kill_armed = false;
                    if let Some(outcome) = machine.on_kill_timer() {
                        break outcome;
                    }
                }
                _ = &mut force, if force_armed => {
                    force_armed = false;
                    if let Some(outcome) = machine.on_force_timer() {
                        break outcome;
                    }
                }
            }
        };

        let pending = tracker.pending();
        abandon.cancel();
        if !parked {
            poller_task.abort();
        }

        match outcome {
            ShutdownOutcome::Drained => {
                debug!(target: "cumin", queue = %queue, "all pending tasks completed, exiting");
                bus.publish(Event::new(EventKind::DrainCompleted).with_queue(Arc::clone(&queue)));
            }
            ShutdownOutcome::KillTimerExpired => {
                warn!(target: "cumin", queue = %queue, pending, "kill timer expired, abandoning pending tasks");
                bus.publish(
                    Event::new(EventKind::KillTimerExpired)
                        .with_queue(Arc::clone(&queue))
                        .with_pending(pending),
                );
            }
            ShutdownOutcome::Forced => {
                warn!(target: "cumin", queue = %queue, pending, "forced termination, abandoning pending tasks");
                bus.publish(
                    Event::new(EventKind::ShutdownForced)
                        .with_queue(Arc::clone(&queue))
                        .with_pending(pending),
                );
            }
        }

        if cfg.exit_process {
            if let Some(fanout) = &fanout {
                fanout.close().await;
            }
            std::process::exit(0);
        }
        Ok(outcome)
    }
}
