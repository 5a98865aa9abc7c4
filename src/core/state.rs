//! # Consumer runtime state.
//!
//! One [`RuntimeState`] per `Cumin` instance, shared by reference (`Arc`)
//! between the listener, the poller, dispatched jobs and the shutdown path.
//!
//! - `listening`: set once by the first `listen`; never cleared
//! - `shutdown`: cancelled by the first termination signal; never reset
//! - `pending`: handlers currently executing

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use super::tracker::PendingTracker;

#[derive(Debug, Default)]
pub(crate) struct RuntimeState {
    listening: AtomicBool,
    pub(crate) shutdown: CancellationToken,
    pub(crate) pending: Arc<PendingTracker>,
}

impl RuntimeState {
    /// Claims the single listen slot. Returns `false` if it was already taken.
    pub(crate) fn claim_listen(&self) -> bool {
        !self.listening.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Acquire)
    }

    pub(crate) fn shutdown_requested(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
