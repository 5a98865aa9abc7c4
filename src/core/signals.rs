//! # Termination-signal sources.
//!
//! The shutdown coordinator counts termination signals: the first starts a
//! drain, the second forces termination. [`SignalSource`] says where they
//! come from and [`ShutdownSignals`] is the opened, receivable form.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]
//!
//! [`SignalSource::manual`] replaces OS delivery with a [`SignalTrigger`],
//! for tests and for embedding applications that own signal handling.

use tokio::sync::mpsc;

/// Where termination signals come from.
#[derive(Debug, Default)]
pub enum SignalSource {
    /// Process-level OS signals.
    #[default]
    Os,
    /// Signals sent through a [`SignalTrigger`].
    Manual(mpsc::UnboundedReceiver<()>),
}

impl SignalSource {
    /// Creates a manual source and the trigger that feeds it.
    pub fn manual() -> (SignalTrigger, SignalSource) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SignalTrigger { tx }, SignalSource::Manual(rx))
    }

    /// Installs the handlers. Must be called from within a tokio runtime.
    pub(crate) fn open(self) -> std::io::Result<ShutdownSignals> {
        match self {
            SignalSource::Os => Ok(ShutdownSignals::Os(OsSignals::install()?)),
            SignalSource::Manual(rx) => Ok(ShutdownSignals::Manual(rx)),
        }
    }
}

/// Sends termination signals to a listener built with [`SignalSource::manual`].
#[derive(Debug, Clone)]
pub struct SignalTrigger {
    tx: mpsc::UnboundedSender<()>,
}

impl SignalTrigger {
    /// Delivers one termination signal. Returns `false` if the listener is gone.
    pub fn terminate(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

/// Opened signal source.
pub(crate) enum ShutdownSignals {
    Os(OsSignals),
    Manual(mpsc::UnboundedReceiver<()>),
}

impl ShutdownSignals {
    /// Waits for the next termination signal.
    ///
    /// Returns `None` once the source can never deliver again (all triggers dropped).
    pub(crate) async fn recv(&mut self) -> Option<()> {
        match self {
            ShutdownSignals::Os(os) => os.recv().await,
            ShutdownSignals::Manual(rx) => rx.recv().await,
        }
    }
}

#[cfg(unix)]
pub(crate) struct OsSignals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl OsSignals {
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> Option<()> {
        tokio::select! {
            r = self.sigint.recv()  => r,
            r = self.sigterm.recv() => r,
        }
    }
}

#[cfg(not(unix))]
pub(crate) struct OsSignals;

#[cfg(not(unix))]
impl OsSignals {
    fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> Option<()> {
        tokio::signal::ctrl_c().await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_trigger_delivers_each_signal() {
        let (trigger, source) = SignalSource::manual();
        let mut signals = source.open().unwrap();

        assert!(trigger.terminate());
        assert!(trigger.terminate());
        assert_eq!(signals.recv().await, Some(()));
        assert_eq!(signals.recv().await, Some(()));

        drop(trigger);
        assert_eq!(signals.recv().await, None);
    }
}
