//! # cumin
//!
//! **Cumin** is a minimal job-queue worker runtime on top of a blocking list
//! store such as Redis.
//!
//! Producers push JSON envelopes onto a named queue; exactly one consumer per
//! runtime pops them with a blocking pop and runs a handler for each, with a
//! graceful shutdown that drains in-flight work before exiting.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   enqueue(queue, payload)                          listen(queue, handler)
//!          │                                                  │
//!          ▼                                                  ▼
//! ┌──────────────────┐                           ┌────────────────────────┐
//! │     Producer     │                           │        Listener        │
//! │ SADD/HSET/RPUSH/ │                           │  shutdown coordinator  │
//! │     PUBLISH      │                           │  (signals, kill timer) │
//! └────────┬─────────┘                           └───────────┬────────────┘
//!          │          ┌──────────────────────┐               │ spawns
//!          └─────────►│  Store (shared conn) │◄──────┐       ▼
//!                     └──────────────────────┘       │  ┌──────────┐ BLPOP ┌───────────────────┐
//!                                                    │  │  Poller  │──────►│ BlockingPop (own) │
//!                                                    │  └────┬─────┘       └───────────────────┘
//!                                                    │       │ spawn per job
//!                                                    │       ▼
//!                                                    │  ┌──────────┐
//!                                                    └──│ dispatch │ HSET completed / PUBLISH processed
//!                                                       └──────────┘
//!
//!   Producer / Poller / dispatch / Listener ── Event ──► Bus ──► SubscriberSet ──► LogWriter, ...
//! ```
//!
//! ### Lifecycle
//! ```text
//! Running ── signal #1 ──► Draining ── poller parked && pending == 0 ──► Terminated(Drained)
//!                             ├── kill_wait elapsed ─────────────────► Terminated(KillTimerExpired)
//!                             └── signal #2 ── force_grace elapsed ──► Terminated(Forced)
//! ```
//!
//! ## Wire format
//! With the default prefix `cumin`:
//!
//! | Key / channel            | Kind    | Content                                      |
//! |--------------------------|---------|----------------------------------------------|
//! | `cumin.<queue>`          | list    | JSON [`Envelope`]s, FIFO                     |
//! | `cuminqueues`            | set     | every queue name ever enqueued to            |
//! | `cuminmeta.<queue>`      | hash    | `lastEnqueued`, `lastDequeued`, `completed`  |
//! | `cuminenqueued`          | channel | envelope, after each push                    |
//! | `cumindequeued`          | channel | envelope, after each pop                     |
//! | `cuminprocessed`         | channel | envelope, after each successful handler      |
//!
//! ## Features
//! | Area          | Description                                               | Key types / traits                          |
//! |---------------|-----------------------------------------------------------|---------------------------------------------|
//! | **Runtime**   | Enqueue, listen, graceful drain.                          | [`Cumin`], [`Listener`], [`ShutdownOutcome`]|
//! | **Handlers**  | Future-returning or callback-style job handlers.          | [`Handler`], [`HandlerFn`], [`CallbackFn`]  |
//! | **Stores**    | Backing store seam, in-memory and Redis implementations.  | [`Store`], [`MemoryStore`], `RedisStore`    |
//! | **Events**    | Runtime events for logging, metrics, custom subscribers.  | [`Event`], [`Subscribe`], [`LogWriter`]     |
//! | **Errors**    | Typed errors for setup, store and handler failures.       | [`CuminError`], [`StoreError`]              |
//! | **Config**    | Centralized runtime settings.                             | [`Config`], [`BackoffPolicy`]               |
//!
//! ## Optional features
//! - `redis` (default): exports `RedisStore` backed by the `redis` crate.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use cumin::{Cumin, Config, CallbackFn, Done, MemoryStore, SignalSource};
//! use serde_json::{json, Value};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let cumin = Cumin::new(store, Config::default());
//!
//!     cumin.enqueue("thumbnails", &json!({ "image": "cat.png" })).await?;
//!
//!     let (stop, signals) = SignalSource::manual();
//!     let listener = cumin
//!         .listen(
//!             "thumbnails",
//!             CallbackFn::new(move |payload: Value, done: Done| {
//!                 println!("resizing {}", payload["image"]);
//!                 done.complete();
//!                 stop.terminate();
//!             }),
//!         )?
//!         .with_signals(signals);
//!
//!     listener.run().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod envelope;
mod error;
mod events;
mod handlers;
mod keys;
mod policies;
mod producer;
mod sink;
mod store;
mod subscribers;

// ---- Public re-exports ----

pub use core::{
    Config, Cumin, CuminBuilder, Listener, PendingGuard, PendingTracker, ShutdownOutcome,
    SignalSource, SignalTrigger,
};
pub use envelope::Envelope;
pub use error::{CuminError, HandlerError, StoreError};
pub use events::{Bus, Event, EventKind};
pub use handlers::{CallbackFn, Done, Handler, HandlerFn, HandlerFuture, HandlerRef};
pub use keys::{Channel, Keys, MetaField};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use producer::Producer;
pub use sink::Sink;
pub use store::{BlockingPop, MemoryStore, Store};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};

// Enabled by default; disable with `default-features = false`.
#[cfg(feature = "redis")]
pub use store::{RedisBlockingConnection, RedisStore};
