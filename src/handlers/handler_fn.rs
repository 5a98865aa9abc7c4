//! # Future-returning handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(Value) -> Fut`, producing a fresh
//! future per job. Shared state goes in an `Arc<...>` captured by the closure.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use cumin::{HandlerError, HandlerFn};
//!
//! let handler = HandlerFn::new(|payload: serde_json::Value| async move {
//!     tokio::time::sleep(Duration::from_millis(10)).await;
//!     if payload.is_null() {
//!         return Err(HandlerError::failed("empty payload"));
//!     }
//!     Ok(())
//! });
//! # let _ = handler;
//! ```

use std::future::Future;

use serde_json::Value;

use crate::error::HandlerError;
use crate::handlers::handler::{Handler, HandlerFuture};

/// Closure-backed handler whose future's resolution marks completion.
#[derive(Debug, Clone)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn call(&self, payload: Value) -> HandlerFuture {
        Box::pin((self.f)(payload))
    }
}
