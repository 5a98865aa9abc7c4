//! # Redis-backed store.
//!
//! [`RedisStore`] holds one multiplexed connection for every non-blocking
//! command. [`RedisStore::open_blocking`] opens a *separate* connection that
//! only ever issues `BLPOP`: a multiplexed connection waiting on `BLPOP` would
//! stall every other command queued behind it.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

use crate::error::StoreError;
use crate::store::{BlockingPop, Store};

/// Redis store for the non-blocking command path.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Connects to `redis_url` (e.g. `redis://127.0.0.1/`).
    pub async fn connect(redis_url: impl AsRef<str>) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { client, conn })
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn sadd(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("SADD")
            .arg(key)
            .arg(member)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn hset(&self, key: &str, field: &str, value: i64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("HSET")
            .arg(key)
            .arg(field)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("RPUSH")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("PUBLISH")
            .arg(channel)
            .arg(message)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn llen(&self, key: &str) -> Result<usize, StoreError> {
        let mut conn = self.conn.clone();
        let len: usize = redis::cmd("LLEN").arg(key).query_async(&mut conn).await?;
        Ok(len)
    }

    async fn open_blocking(&self) -> Result<Box<dyn BlockingPop>, StoreError> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(Box::new(RedisBlockingConnection { conn }))
    }
}

/// Connection reserved for `BLPOP`.
pub struct RedisBlockingConnection {
    conn: MultiplexedConnection,
}

#[async_trait]
impl BlockingPop for RedisBlockingConnection {
    async fn blpop(&mut self, key: &str, timeout: Duration) -> Result<Option<String>, StoreError> {
        let mut cmd = redis::cmd("BLPOP");
        cmd.arg(key);
        match blpop_timeout(timeout) {
            PopTimeout::Whole(secs) => cmd.arg(secs),
            PopTimeout::Fractional(secs) => cmd.arg(secs),
        };
        let reply: Option<(String, String)> = cmd.query_async(&mut self.conn).await?;
        Ok(reply.map(|(_key, item)| item))
    }
}

#[derive(Debug, PartialEq)]
enum PopTimeout {
    Whole(u64),
    Fractional(f64),
}

/// BLPOP timeout argument. Whole seconds go out as an integer, which every
/// server accepts; fractional seconds need Redis 6. Redis reads 0 as
/// "block forever", so it is never sent.
fn blpop_timeout(timeout: Duration) -> PopTimeout {
    if timeout.subsec_nanos() == 0 {
        PopTimeout::Whole(timeout.as_secs().max(1))
    } else {
        PopTimeout::Fractional(timeout.as_secs_f64().max(0.01))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_second_timeouts_are_sent_as_integers() {
        assert_eq!(blpop_timeout(Duration::from_secs(2)), PopTimeout::Whole(2));
        assert_eq!(blpop_timeout(Duration::ZERO), PopTimeout::Whole(1));
        assert_eq!(
            blpop_timeout(Duration::from_millis(250)),
            PopTimeout::Fractional(0.25)
        );
        assert_eq!(
            blpop_timeout(Duration::from_millis(1500)),
            PopTimeout::Fractional(1.5)
        );
    }

    fn redis_url() -> String {
        std::env::var("CUMIN_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string())
    }

    #[tokio::test]
    #[ignore = "requires a running redis server"]
    async fn push_then_blocking_pop() {
        let store = RedisStore::connect(redis_url()).await.unwrap();
        let key = format!("cumin.redis-store-test.{}", std::process::id());

        store.rpush(&key, "one").await.unwrap();
        assert_eq!(store.llen(&key).await.unwrap(), 1);

        let mut blocking = store.open_blocking().await.unwrap();
        let item = blocking.blpop(&key, Duration::from_secs(1)).await.unwrap();
        assert_eq!(item.as_deref(), Some("one"));
        assert!(blocking.blpop(&key, Duration::from_millis(100)).await.unwrap().is_none());
    }
}
