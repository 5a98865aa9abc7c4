#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use cumin::{Config, Cumin, Event, EventKind, MemoryStore};
use tokio::sync::broadcast::{self, error::RecvError};

pub fn runtime(cfg: Config) -> (Arc<MemoryStore>, Cumin) {
    let store = Arc::new(MemoryStore::new());
    let cumin = Cumin::new(store.clone(), cfg);
    (store, cumin)
}

/// Waits for the next event of `kind`, skipping everything else.
pub async fn wait_for(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Event {
    let found = tokio::time::timeout(Duration::from_secs(600), async {
        loop {
            match rx.recv().await {
                Ok(ev) if ev.kind == kind => return ev,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("bus closed while waiting for {kind:?}"),
            }
        }
    })
    .await;
    found.unwrap_or_else(|_| panic!("timed out waiting for {kind:?}"))
}

/// Drains every event already buffered in `rx`.
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(ev) => out.push(ev),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => return out,
        }
    }
}
