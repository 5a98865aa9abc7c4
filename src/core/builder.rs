use std::sync::Arc;

use tokio::select;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{mpsc, oneshot};

use crate::{
    core::{config::Config, runtime::Cumin},
    events::Bus,
    store::Store,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for a [`Cumin`] runtime with optional subscribers.
pub struct CuminBuilder {
    store: Arc<dyn Store>,
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl CuminBuilder {
    /// Creates a builder with [`Config::default`] and no subscribers.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            cfg: Config::default(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the configuration.
    pub fn config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (enqueue, dispatch, failures,
    /// shutdown) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the runtime.
    ///
    /// With subscribers configured this spawns their workers and the bus
    /// fan-out task, so it must then be called from within a tokio runtime.
    pub fn build(self) -> Cumin {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let fanout = (!self.subscribers.is_empty()).then(|| {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            Fanout::spawn(&bus, set)
        });
        Cumin::with_bus(self.store, self.cfg, bus, fanout)
    }
}

/// Handle to the task forwarding bus events into a [`SubscriberSet`].
///
/// The task stops when [`close`](Fanout::close) is called or every handle
/// is dropped. Either way the set is shut down, so events already handed to
/// a subscriber lane are still delivered.
#[derive(Clone)]
pub(crate) struct Fanout {
    close_tx: mpsc::Sender<oneshot::Sender<()>>,
}

impl Fanout {
    fn spawn(bus: &Bus, set: SubscriberSet) -> Self {
        let mut rx = bus.subscribe();
        let (close_tx, mut close_rx) = mpsc::channel::<oneshot::Sender<()>>(1);

        tokio::spawn(async move {
            let ack = loop {
                select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(Arc::new(ev)),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break None,
                    },
                    req = close_rx.recv() => break req,
                }
            };

            loop {
                match rx.try_recv() {
                    Ok(ev) => set.emit(Arc::new(ev)),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
            set.shutdown().await;
            if let Some(ack) = ack {
                let _ = ack.send(());
            }
        });

        Self { close_tx }
    }

    /// Delivers every event published before this call, then stops the
    /// subscribers. Later events are not delivered.
    pub(crate) async fn close(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.close_tx.send(ack_tx).await.is_ok() {
            let _ = ack_rx.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::events::{Event, EventKind};
    use crate::store::MemoryStore;

    #[derive(Default)]
    struct Recorder {
        kinds: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.kinds.lock().unwrap().push(ev.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct SlowRecorder(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for SlowRecorder {
        async fn on_event(&self, ev: &Event) {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.0.lock().unwrap().push(ev.kind);
        }

        fn name(&self) -> &'static str {
            "slow-recorder"
        }
    }

    #[tokio::test]
    async fn subscribers_see_producer_events() {
        let rec = Arc::new(Recorder::default());
        let cumin = CuminBuilder::new(Arc::new(MemoryStore::new()))
            .with_subscribers(vec![rec.clone() as Arc<dyn Subscribe>])
            .build();

        cumin.enqueue("q", &json!(1)).await.unwrap();
        cumin.close_subscribers().await;

        assert_eq!(*rec.kinds.lock().unwrap(), vec![EventKind::JobEnqueued]);
    }

    #[tokio::test(start_paused = true)]
    async fn close_waits_for_slow_subscribers() {
        let rec = Arc::new(SlowRecorder(Mutex::new(Vec::new())));
        let cumin = CuminBuilder::new(Arc::new(MemoryStore::new()))
            .with_subscribers(vec![rec.clone() as Arc<dyn Subscribe>])
            .build();

        cumin.enqueue("q", &json!(1)).await.unwrap();
        cumin.enqueue("q", &json!(2)).await.unwrap();
        cumin.close_subscribers().await;
        assert_eq!(rec.0.lock().unwrap().len(), 2);

        // Closed: later events are not delivered and a second close returns.
        cumin.enqueue("q", &json!(3)).await.unwrap();
        cumin.close_subscribers().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(rec.0.lock().unwrap().len(), 2);
    }

    #[test]
    fn build_without_subscribers_needs_no_runtime() {
        let cumin = CuminBuilder::new(Arc::new(MemoryStore::new()))
            .config(Config {
                prefix: "jobs".into(),
                ..Config::default()
            })
            .build();
        assert_eq!(cumin.config().prefix, "jobs");
        assert!(!cumin.is_listening());
    }

    #[tokio::test]
    async fn close_without_subscribers_returns_immediately() {
        let cumin = CuminBuilder::new(Arc::new(MemoryStore::new())).build();
        cumin.close_subscribers().await;
    }
}
