//! # In-process store.
//!
//! [`MemoryStore`] keeps lists, sets, hashes and a publish log behind one
//! mutex. Blocking pops park on a [`Notify`] that every push wakes, so FIFO
//! order and timeout semantics match a real `BLPOP` closely enough for tests
//! and demos. Clones share state.
//!
//! Test hooks: [`MemoryStore::fail_next_pops`] and
//! [`MemoryStore::fail_next_publishes`] inject store failures,
//! [`MemoryStore::blocking_connections`] counts opened blocking connections.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::{self, Instant};

use crate::error::StoreError;
use crate::store::{BlockingPop, Store};

#[derive(Default)]
struct State {
    lists: HashMap<String, VecDeque<String>>,
    sets: HashMap<String, BTreeSet<String>>,
    hashes: HashMap<String, HashMap<String, i64>>,
    published: Vec<(String, String)>,
    publish_failures: HashMap<String, usize>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    pushed: Notify,
    pop_failures: AtomicUsize,
    blocking_connections: AtomicUsize,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_pop_failure(&self) -> bool {
        self.pop_failures
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Shared in-memory store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` blocking pops fail with a connection error.
    pub fn fail_next_pops(&self, n: usize) {
        self.inner.pop_failures.store(n, Ordering::Release);
    }

    /// Makes the next `n` publishes on `channel` fail with a command error.
    ///
    /// A failed publish is not recorded in [`published`](Self::published).
    pub fn fail_next_publishes(&self, channel: &str, n: usize) {
        self.inner
            .state()
            .publish_failures
            .insert(channel.to_string(), n);
    }

    /// Number of blocking connections opened so far.
    pub fn blocking_connections(&self) -> usize {
        self.inner.blocking_connections.load(Ordering::Acquire)
    }

    /// Removes and returns the head of a list without blocking.
    pub fn lpop(&self, key: &str) -> Option<String> {
        self.inner.state().lists.get_mut(key)?.pop_front()
    }

    /// Snapshot of a list, head first.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.inner
            .state()
            .lists
            .get(key)
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Sorted members of a set.
    pub fn members(&self, key: &str) -> Vec<String> {
        self.inner
            .state()
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn hget(&self, key: &str, field: &str) -> Option<i64> {
        self.inner.state().hashes.get(key)?.get(field).copied()
    }

    /// Messages published on `channel`, oldest first.
    pub fn published(&self, channel: &str) -> Vec<String> {
        self.inner
            .state()
            .published
            .iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn sadd(&self, key: &str, member: &str) -> Result<(), StoreError> {
        self.inner
            .state()
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn hset(&self, key: &str, field: &str, value: i64) -> Result<(), StoreError> {
        self.inner
            .state()
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value);
        Ok(())
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner
            .state()
            .lists
            .entry(key.to_string())
            .or_default()
            .push_back(value.to_string());
        self.inner.pushed.notify_waiters();
        Ok(())
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<(), StoreError> {
        let mut state = self.inner.state();
        if let Some(left) = state.publish_failures.get_mut(channel).filter(|n| **n > 0) {
            *left -= 1;
            return Err(StoreError::Command(format!("injected publish failure on {channel}")));
        }
        state
            .published
            .push((channel.to_string(), message.to_string()));
        Ok(())
    }

    async fn llen(&self, key: &str) -> Result<usize, StoreError> {
        Ok(self.inner.state().lists.get(key).map_or(0, VecDeque::len))
    }

    async fn open_blocking(&self) -> Result<Box<dyn BlockingPop>, StoreError> {
        self.inner.blocking_connections.fetch_add(1, Ordering::AcqRel);
        Ok(Box::new(MemoryBlockingConnection {
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct MemoryBlockingConnection {
    inner: Arc<Inner>,
}

#[async_trait]
impl BlockingPop for MemoryBlockingConnection {
    async fn blpop(&mut self, key: &str, timeout: Duration) -> Result<Option<String>, StoreError> {
        if self.inner.take_pop_failure() {
            return Err(StoreError::Connection("injected pop failure".to_string()));
        }
        let deadline = Instant::now() + timeout;
        loop {
            let notified = self.inner.pushed.notified();
            tokio::pin!(notified);
            // Register before checking so a push between check and await is not missed.
            notified.as_mut().enable();

            let popped = self
                .inner
                .state()
                .lists
                .get_mut(key)
                .and_then(VecDeque::pop_front);
            if popped.is_some() {
                return Ok(popped);
            }
            if time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blpop_returns_items_in_push_order() {
        let store = MemoryStore::new();
        store.rpush("l", "a").await.unwrap();
        store.rpush("l", "b").await.unwrap();

        let mut conn = store.open_blocking().await.unwrap();
        let t = Duration::from_millis(10);
        assert_eq!(conn.blpop("l", t).await.unwrap().as_deref(), Some("a"));
        assert_eq!(conn.blpop("l", t).await.unwrap().as_deref(), Some("b"));
        assert_eq!(store.llen("l").await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn blpop_times_out_on_empty_list() {
        let store = MemoryStore::new();
        let mut conn = store.open_blocking().await.unwrap();
        let started = Instant::now();
        assert!(conn.blpop("l", Duration::from_secs(1)).await.unwrap().is_none());
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn blpop_wakes_on_push() {
        let store = MemoryStore::new();
        let mut conn = store.open_blocking().await.unwrap();

        let pusher = store.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(200)).await;
            pusher.rpush("l", "late").await.unwrap();
        });

        let item = conn.blpop("l", Duration::from_secs(5)).await.unwrap();
        assert_eq!(item.as_deref(), Some("late"));
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let store = MemoryStore::new();
        store.fail_next_pops(1);
        let mut conn = store.open_blocking().await.unwrap();
        let t = Duration::from_millis(1);
        assert!(matches!(conn.blpop("l", t).await, Err(StoreError::Connection(_))));
        assert!(conn.blpop("l", t).await.unwrap().is_none());
        assert_eq!(store.blocking_connections(), 1);
    }

    #[tokio::test]
    async fn injected_publish_failures_target_one_channel() {
        let store = MemoryStore::new();
        store.fail_next_publishes("a", 1);

        assert!(matches!(store.publish("a", "1").await, Err(StoreError::Command(_))));
        store.publish("b", "2").await.unwrap();
        store.publish("a", "3").await.unwrap();

        assert_eq!(store.published("a"), vec!["3".to_string()]);
        assert_eq!(store.published("b"), vec!["2".to_string()]);
    }

    #[tokio::test]
    async fn sadd_is_idempotent() {
        let store = MemoryStore::new();
        store.sadd("s", "q").await.unwrap();
        store.sadd("s", "q").await.unwrap();
        assert_eq!(store.members("s"), vec!["q".to_string()]);
    }
}
