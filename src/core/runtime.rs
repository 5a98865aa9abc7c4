//! # Cumin: the runtime handle.
//!
//! [`Cumin`] ties a [`Store`] and a [`Config`] together and exposes both
//! halves of the queue:
//!
//! - **producer side**: [`enqueue`](Cumin::enqueue) / [`enqueue_with`](Cumin::enqueue_with)
//! - **consumer side**: [`listen`](Cumin::listen), returning a [`Listener`] to run
//!
//! One consumer per runtime: the first `listen` claims the runtime, and any
//! later call fails with [`CuminError::AlreadyListening`] whatever the queue.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use cumin::{Cumin, Config, HandlerError, HandlerFn, MemoryStore};
//! use serde_json::{json, Value};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cumin = Cumin::new(Arc::new(MemoryStore::new()), Config::default());
//!
//!     cumin.enqueue("emails", &json!({ "to": "ops@example.com" })).await?;
//!
//!     let listener = cumin.listen(
//!         "emails",
//!         HandlerFn::new(|payload: Value| async move {
//!             println!("sending {payload}");
//!             Ok::<_, HandlerError>(())
//!         }),
//!     )?;
//!     let outcome = listener.run().await?;
//!     println!("stopped: {outcome:?}");
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::{
    core::{
        builder::{CuminBuilder, Fanout},
        config::Config,
        listener::Listener,
        state::RuntimeState,
    },
    envelope::Envelope,
    error::CuminError,
    events::{Bus, Event},
    handlers::Handler,
    producer::Producer,
    sink::Sink,
    store::Store,
};

/// Queue runtime bound to one store and configuration. Cheap to share behind `Arc`.
pub struct Cumin {
    cfg: Config,
    bus: Bus,
    sink: Sink,
    producer: Producer,
    state: Arc<RuntimeState>,
    fanout: Option<Fanout>,
}

impl Cumin {
    /// Creates a runtime with no event subscribers.
    ///
    /// Use [`Cumin::builder`] to attach subscribers such as [`LogWriter`](crate::LogWriter).
    pub fn new(store: Arc<dyn Store>, cfg: Config) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self::with_bus(store, cfg, bus, None)
    }

    /// Starts a [`CuminBuilder`] for the given store.
    pub fn builder(store: Arc<dyn Store>) -> CuminBuilder {
        CuminBuilder::new(store)
    }

    pub(crate) fn with_bus(
        store: Arc<dyn Store>,
        cfg: Config,
        bus: Bus,
        fanout: Option<Fanout>,
    ) -> Self {
        let sink = Sink::new(store, cfg.keys());
        let producer = Producer::new(sink.clone(), bus.clone());
        Self {
            cfg,
            bus,
            sink,
            producer,
            state: Arc::new(RuntimeState::default()),
            fanout,
        }
    }

    /// Enqueues `payload` on `queue`. See [`Producer::enqueue`].
    pub async fn enqueue<T>(&self, queue: &str, payload: &T) -> Result<Envelope, CuminError>
    where
        T: Serialize + ?Sized,
    {
        self.producer.enqueue(queue, payload).await
    }

    /// Callback-style enqueue. See [`Producer::enqueue_with`].
    pub fn enqueue_with<T, F>(&self, queue: impl Into<String>, payload: T, done: F)
    where
        T: Serialize,
        F: FnOnce(Result<Envelope, CuminError>) + Send + 'static,
    {
        self.producer.enqueue_with(queue, payload, done);
    }

    /// Detached producer sharing this runtime's store and bus.
    pub fn producer(&self) -> Producer {
        self.producer.clone()
    }

    /// Claims this runtime as the consumer of `queue`.
    ///
    /// Nothing is popped until [`Listener::run`] is awaited.
    ///
    /// # Errors
    /// - [`CuminError::InvalidArgument`] if `queue` is empty
    /// - [`CuminError::AlreadyListening`] if `listen` already succeeded on this runtime
    pub fn listen<H: Handler>(&self, queue: &str, handler: H) -> Result<Listener, CuminError> {
        if queue.is_empty() {
            return Err(CuminError::missing_queue_name());
        }
        if !self.state.claim_listen() {
            return Err(CuminError::AlreadyListening {
                queue: queue.to_string(),
            });
        }
        Ok(Listener::new(
            queue,
            Arc::new(handler),
            self.sink.clone(),
            self.bus.clone(),
            self.cfg.clone(),
            Arc::clone(&self.state),
            self.fanout.clone(),
        ))
    }

    /// Receiver for runtime events published after this call.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Number of handlers currently running.
    pub fn pending(&self) -> usize {
        self.state.pending.pending()
    }

    /// True once the first termination signal was observed.
    pub fn shutdown_requested(&self) -> bool {
        self.state.shutdown_requested()
    }

    /// True once `listen` has claimed this runtime.
    pub fn is_listening(&self) -> bool {
        self.state.is_listening()
    }

    /// Delivers every event published so far to the builder's subscribers,
    /// then stops them. A no-op without subscribers.
    pub async fn close_subscribers(&self) {
        if let Some(fanout) = &self.fanout {
            fanout.close().await;
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }
}
