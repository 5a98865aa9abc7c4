//! # Pending-work tracker.
//!
//! Counts handlers currently executing. The poller calls
//! [`PendingTracker::enter`] immediately before dispatch; the returned
//! [`PendingGuard`] decrements when dropped, which happens right after the
//! handler finishes, fails, panics, or is abandoned. The count reaches 0 only
//! when no handler is running.
//!
//! Backed by a `watch` channel so the shutdown coordinator can await zero.

use std::sync::Arc;

use tokio::sync::watch;

/// Shared counter of in-flight handlers.
#[derive(Debug)]
pub struct PendingTracker {
    tx: watch::Sender<usize>,
}

impl Default for PendingTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    /// Increments the count; the guard decrements it again on drop.
    #[must_use = "dropping the guard immediately decrements the count"]
    pub fn enter(self: &Arc<Self>) -> PendingGuard {
        self.tx.send_modify(|n| *n += 1);
        PendingGuard {
            tracker: Arc::clone(self),
        }
    }

    /// Current number of in-flight handlers.
    pub fn pending(&self) -> usize {
        *self.tx.borrow()
    }

    /// Resolves once the count is zero (immediately if it already is).
    pub async fn idle(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while borrowed.
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    fn leave(&self) {
        self.tx.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// RAII token for one in-flight handler.
#[derive(Debug)]
pub struct PendingGuard {
    tracker: Arc<PendingTracker>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.tracker.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn guard_balances_count() {
        let t = Arc::new(PendingTracker::new());
        let a = t.enter();
        let b = t.enter();
        assert_eq!(t.pending(), 2);
        drop(a);
        assert_eq!(t.pending(), 1);
        drop(b);
        assert_eq!(t.pending(), 0);
    }

    #[tokio::test]
    async fn idle_resolves_immediately_at_zero() {
        let t = PendingTracker::new();
        tokio::time::timeout(Duration::from_millis(50), t.idle())
            .await
            .expect("idle should not wait");
    }

    #[tokio::test(start_paused = true)]
    async fn idle_waits_for_last_guard() {
        let t = Arc::new(PendingTracker::new());
        let worker = Arc::clone(&t);
        let (entered_tx, entered_rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let _g = worker.enter();
            let _ = entered_tx.send(());
            tokio::time::sleep(Duration::from_millis(300)).await;
        });
        entered_rx.await.unwrap();

        let started = tokio::time::Instant::now();
        t.idle().await;
        assert!(started.elapsed() >= Duration::from_millis(300));
        assert_eq!(t.pending(), 0);
    }
}
