//! # Event subscribers for the cumin runtime.
//!
//! ```text
//! Poller / Dispatch / Shutdown ── publish(Event) ──► Bus ──► fan-out listener
//!                                                                │
//!                                                          SubscriberSet
//!                                                      ┌─────────┼─────────┐
//!                                                      ▼         ▼         ▼
//!                                                  LogWriter  Metrics   Custom
//! ```
//!
//! - [`Subscribe`] the extension trait
//! - [`SubscriberSet`] bounded per-subscriber queues with panic isolation
//! - [`LogWriter`] built-in subscriber writing `tracing` records

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
