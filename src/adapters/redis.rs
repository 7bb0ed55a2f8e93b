//! Redis Backend Adapter
//!
//! Implements the `KeyValueStore` port over a Redis connection manager.
//! One `RedisStore` wraps one replica; the connection is established once
//! at construction and multiplexed for the lifetime of the store.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::domain::ports::{BatchOp, KeyValueStore, ScoreRange, StoreBatch};
use crate::error::{Error, Result};

/// A single Redis replica behind the `KeyValueStore` port.
#[derive(Clone)]
pub struct RedisStore {
    host: String,
    conn: ConnectionManager,
}

impl RedisStore {
    /// Establish a connection to `host`.
    ///
    /// Accepts either a full `redis://` URL or a bare host name (default
    /// port and database). Fails with [`Error::Connect`] when the initial
    /// connection cannot be established and [`Error::ConnectTimeout`] when
    /// it does not complete within `timeout`.
    pub async fn connect(host: &str, timeout: Duration) -> Result<Self> {
        let url = if host.contains("://") {
            host.to_string()
        } else {
            format!("redis://{host}/")
        };

        let client = redis::Client::open(url).map_err(|source| Error::Connect {
            host: host.to_string(),
            source,
        })?;

        let conn = match tokio::time::timeout(timeout, client.get_connection_manager()).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(source)) => {
                return Err(Error::Connect {
                    host: host.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(Error::ConnectTimeout {
                    host: host.to_string(),
                    timeout,
                })
            }
        };

        Ok(Self {
            host: host.to_string(),
            conn,
        })
    }

    /// The host this store is connected to.
    pub fn host(&self) -> &str {
        &self.host
    }

    // ConnectionManager is a cheap handle over one multiplexed connection.
    fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").field("host", &self.host).finish()
    }
}

fn bound(value: Option<i64>, unbounded: &str) -> String {
    match value {
        Some(v) => v.to_string(),
        None => unbounded.to_string(),
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let mut conn = self.connection();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        let mut conn = self.connection();
        let _: () = conn.set(key, value.as_ref()).await?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.connection();
        let _: () = conn.expire(key, ttl.as_secs() as i64).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn sorted_add(&self, set: &str, member: &str, score: i64) -> Result<()> {
        let mut conn = self.connection();
        let _: () = conn.zadd(set, member, score).await?;
        Ok(())
    }

    async fn sorted_range(&self, set: &str, range: ScoreRange) -> Result<Vec<String>> {
        let mut conn = self.connection();
        let members: Vec<String> = conn
            .zrangebyscore(set, bound(range.min, "-inf"), bound(range.max, "+inf"))
            .await?;
        Ok(members)
    }

    async fn sorted_remove_range(&self, set: &str, range: ScoreRange) -> Result<()> {
        let mut conn = self.connection();
        let _: () = conn
            .zrembyscore(set, bound(range.min, "-inf"), bound(range.max, "+inf"))
            .await?;
        Ok(())
    }

    async fn sorted_count(&self, set: &str, range: ScoreRange) -> Result<u64> {
        let mut conn = self.connection();
        let count: u64 = conn
            .zcount(set, bound(range.min, "-inf"), bound(range.max, "+inf"))
            .await?;
        Ok(count)
    }

    async fn execute_atomic(&self, batch: StoreBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in batch.ops() {
            match op {
                BatchOp::Delete(key) => {
                    pipe.del(key).ignore();
                }
                BatchOp::RemoveRangeByScore { set, range } => {
                    pipe.zrembyscore(set, bound(range.min, "-inf"), bound(range.max, "+inf"))
                        .ignore();
                }
            }
        }

        let mut conn = self.connection();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bound_formatting() {
        assert_eq!(bound(Some(42), "-inf"), "42");
        assert_eq!(bound(Some(-7), "-inf"), "-7");
        assert_eq!(bound(None, "-inf"), "-inf");
        assert_eq!(bound(None, "+inf"), "+inf");
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Nothing listens on this port; initial connection must fail
        // rather than hand back a lazy handle.
        let result = RedisStore::connect("127.0.0.1:1", Duration::from_secs(1)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_connect_timeout() {
        // Non-routable address (RFC 5737) with a very short timeout.
        let result = RedisStore::connect("192.0.2.1", Duration::from_millis(50)).await;
        match result {
            Err(Error::ConnectTimeout { host, .. }) => assert_eq!(host, "192.0.2.1"),
            Err(Error::Connect { .. }) => {} // some stacks refuse instead of hanging
            other => panic!("expected connection failure, got: {other:?}"),
        }
    }
}
