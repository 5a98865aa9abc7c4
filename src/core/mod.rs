//! Runtime core: consumer loop and lifecycle.
//!
//! The public API from this module is [`Cumin`] (plus its builder and the
//! [`Listener`] it hands out), which owns the poller, job dispatch, and the
//! signal-driven shutdown.
//!
//! Internal modules:
//! - [`poller`]: blocking-dequeue loop over the dedicated connection;
//! - [`dispatch`]: runs one job's handler and its completion bookkeeping;
//! - [`listener`]: spawns the poller and drives the shutdown coordinator;
//! - [`shutdown`]: the `Running → Draining → Terminated` state machine;
//! - [`signals`]: OS or manual termination-signal sources;
//! - [`tracker`]: pending-handler counter;
//! - [`state`]: per-runtime flags shared by the above.

mod builder;
mod config;
mod dispatch;
mod listener;
mod poller;
mod runtime;
mod shutdown;
mod signals;
mod state;
mod tracker;

pub use builder::CuminBuilder;
pub use config::Config;
pub use listener::Listener;
pub use runtime::Cumin;
pub use shutdown::ShutdownOutcome;
pub use signals::{SignalSource, SignalTrigger};
pub use tracker::{PendingGuard, PendingTracker};
