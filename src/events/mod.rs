//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Producer`, the poller, job dispatch, the shutdown
//!   coordinator, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the fan-out listener started by `Cumin` (feeds
//!   `SubscriberSet`), plus any receiver from [`Cumin::events`](crate::Cumin::events).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
