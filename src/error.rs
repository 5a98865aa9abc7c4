//! Error types used by the cumin runtime, the store seam and job handlers.
//!
//! - [`CuminError`] errors surfaced to callers of `enqueue` / `listen` / `run`.
//! - [`StoreError`] failures at the backing-store boundary (transient by nature).
//! - [`HandlerError`] a job handler did not complete successfully.
//!
//! Every enum provides `as_label` (stable snake_case) for logs and metrics.

use thiserror::Error;

/// # Errors produced by the cumin runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CuminError {
    /// A required argument was missing or empty (e.g. queue name).
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: &'static str,
    },

    /// `listen` was already called on this runtime instance.
    ///
    /// A runtime consumes at most one queue; build another instance per queue.
    #[error("already listening; refusing to listen on {queue:?} (create another runtime per queue)")]
    AlreadyListening {
        /// Queue name passed to the rejected call.
        queue: String,
    },

    /// The backing store rejected or failed a command.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The payload could not be serialized into an envelope.
    #[error("envelope encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// Installing OS termination-signal handlers failed.
    #[error("signal registration failed: {0}")]
    Signal(#[from] std::io::Error),
}

impl CuminError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use cumin::CuminError;
    ///
    /// let err = CuminError::AlreadyListening { queue: "emails".into() };
    /// assert_eq!(err.as_label(), "already_listening");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CuminError::InvalidArgument { .. } => "invalid_argument",
            CuminError::AlreadyListening { .. } => "already_listening",
            CuminError::Store(_) => "store_error",
            CuminError::Encode(_) => "encode_error",
            CuminError::Signal(_) => "signal_error",
        }
    }

    pub(crate) fn missing_queue_name() -> Self {
        CuminError::InvalidArgument {
            reason: "queue name must be provided, e.g. 'emailQueue'",
        }
    }
}

/// # Errors raised at the backing-store boundary.
///
/// The consumer loop logs these and keeps polling; the producer hands them
/// back to the caller.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Could not open or keep a connection to the store.
    #[error("store connection error: {0}")]
    Connection(String),

    /// A command was sent but failed.
    #[error("store command error: {0}")]
    Command(String),
}

impl StoreError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::Connection(_) => "store_connection",
            StoreError::Command(_) => "store_command",
        }
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
            StoreError::Connection(e.to_string())
        } else {
            StoreError::Command(e.to_string())
        }
    }
}

/// # Errors produced by job handlers.
///
/// Failures never leave the pending count incremented; they are logged and
/// published on the runtime bus as `JobFailed`.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The handler reported a failure.
    #[error("handler failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// A callback-style handler dropped its completion token without calling it.
    #[error("completion token dropped without being signalled")]
    Dropped,

    /// The handler panicked.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload, when it was a string.
        info: String,
    },
}

impl HandlerError {
    /// Convenience constructor for [`HandlerError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        HandlerError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use cumin::HandlerError;
    ///
    /// assert_eq!(HandlerError::failed("boom").as_label(), "handler_failed");
    /// assert_eq!(HandlerError::Dropped.as_label(), "handler_dropped");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Dropped => "handler_dropped",
            HandlerError::Panicked { .. } => "handler_panicked",
        }
    }
}
