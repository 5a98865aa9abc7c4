//! # Callback-style handler (`CallbackFn`)
//!
//! [`CallbackFn`] wraps `F: Fn(Value, Done)`. The closure starts the work and
//! returns; the job is complete when it (or something it handed the token to)
//! calls [`Done::complete`] or [`Done::fail`].
//!
//! `Done` is consumed by either call, so it can signal at most once. Dropping
//! it unsignalled completes the job with [`HandlerError::Dropped`].
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use cumin::{CallbackFn, Done};
//!
//! let handler = CallbackFn::new(|payload: serde_json::Value, done: Done| {
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_secs(1)).await;
//!         println!("-- received {payload}");
//!         done.complete();
//!     });
//! });
//! # let _ = handler;
//! ```

use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::HandlerError;
use crate::handlers::handler::{Handler, HandlerFuture};

/// One-shot completion token handed to callback-style handlers.
#[derive(Debug)]
pub struct Done {
    tx: oneshot::Sender<Result<(), HandlerError>>,
}

impl Done {
    /// Marks the job as successfully processed.
    pub fn complete(self) {
        let _ = self.tx.send(Ok(()));
    }

    /// Marks the job as failed.
    pub fn fail(self, error: impl Into<String>) {
        let _ = self.tx.send(Err(HandlerError::failed(error)));
    }
}

/// Closure-backed handler that signals completion through a [`Done`] token.
#[derive(Debug, Clone)]
pub struct CallbackFn<F> {
    f: F,
}

impl<F> CallbackFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Handler for CallbackFn<F>
where
    F: Fn(Value, Done) + Send + Sync + 'static,
{
    fn call(&self, payload: Value) -> HandlerFuture {
        let (tx, rx) = oneshot::channel();
        (self.f)(payload, Done { tx });
        Box::pin(async move { rx.await.unwrap_or(Err(HandlerError::Dropped)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn complete_resolves_ok() {
        let h = CallbackFn::new(|_p: Value, done: Done| done.complete());
        assert!(h.call(json!(1)).await.is_ok());
    }

    #[tokio::test]
    async fn fail_carries_message() {
        let h = CallbackFn::new(|_p: Value, done: Done| done.fail("nope"));
        let err = h.call(json!(1)).await.unwrap_err();
        assert!(matches!(err, HandlerError::Failed { ref error } if error == "nope"));
    }

    #[tokio::test]
    async fn dropped_token_is_a_failure() {
        let h = CallbackFn::new(|_p: Value, done: Done| drop(done));
        let err = h.call(json!(1)).await.unwrap_err();
        assert!(matches!(err, HandlerError::Dropped));
    }

    #[tokio::test]
    async fn completion_can_happen_later() {
        let h = CallbackFn::new(|p: Value, done: Done| {
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                assert_eq!(p, json!({"some": "task"}));
                done.complete();
            });
        });
        assert!(h.call(json!({"some": "task"})).await.is_ok());
    }
}
