//! # Job handlers.
//!
//! - [`Handler`] trait: payload in, completion future out
//! - [`HandlerFn`] future-returning closure
//! - [`CallbackFn`] + [`Done`] callback-style closure with a completion token
//! - [`HandlerRef`] shared reference (`Arc<dyn Handler>`)

mod callback;
mod handler;
mod handler_fn;

pub use callback::{CallbackFn, Done};
pub use handler::{Handler, HandlerFuture, HandlerRef};
pub use handler_fn::HandlerFn;
