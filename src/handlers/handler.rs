//! # Job handler abstraction.
//!
//! A [`Handler`] receives the decoded payload of one job and returns a boxed
//! future whose resolution marks the job complete. Both invocation styles are
//! built on top of it:
//!
//! - [`HandlerFn`](crate::HandlerFn) wraps `Fn(Value) -> impl Future<Output = Result<(), HandlerError>>`
//! - [`CallbackFn`](crate::CallbackFn) wraps `Fn(Value, Done)`, where the handler
//!   signals completion through the [`Done`](crate::Done) token
//!
//! # Example
//! ```
//! use cumin::{Handler, HandlerError, HandlerFuture};
//! use serde_json::Value;
//!
//! struct Print;
//!
//! impl Handler for Print {
//!     fn call(&self, payload: Value) -> HandlerFuture {
//!         Box::pin(async move {
//!             println!("got {payload}");
//!             Ok::<_, HandlerError>(())
//!         })
//!     }
//! }
//! ```

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use crate::error::HandlerError;

/// Boxed completion future returned by [`Handler::call`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send + 'static>>;

/// Shared handle to a handler (`Arc<dyn Handler>`).
pub type HandlerRef = Arc<dyn Handler>;

/// Processes one job payload.
///
/// Called once per dequeued job; calls may overlap, so implementations must
/// tolerate concurrent invocations.
pub trait Handler: Send + Sync + 'static {
    /// Starts processing `payload`; the returned future resolves when the job is done.
    fn call(&self, payload: Value) -> HandlerFuture;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call(&self, payload: Value) -> HandlerFuture {
        (**self).call(payload)
    }
}
