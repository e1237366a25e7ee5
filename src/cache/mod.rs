//! Coordination cache: a thin Redis wrapper used for cross-worker leader
//! election and ephemeral task bookkeeping. Never the system of record —
//! every call is best-effort and a cache outage degrades to "every
//! worker runs every shared task", not a crash.

use crate::config::Config;
use crate::error::{PoolError, Result};
use redis::AsyncCommands;
use std::collections::HashMap;
use tracing::warn;

#[derive(Clone)]
pub struct Cache {
    client: redis::Client,
}

impl Cache {
    pub fn new(config: &Config) -> Result<Self> {
        let client = redis::Client::open(config.cache.redis_url.as_str())
            .map_err(|e| PoolError::CacheUnavailable(e.to_string()))?;
        Ok(Cache { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(PoolError::Cache)
    }

    /// Cheap reachability probe for the health endpoint.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    /// Atomic `SET key value NX EX ttl`: true if this call acquired the
    /// lock, false if another worker already holds it. Used for leader
    /// election on shared scheduled tasks.
    pub async fn set_if_absent(&self, key: &str, value: &str, ttl_secs: u64) -> bool {
        let mut conn = match self.connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, key, "cache unavailable, assuming leadership");
                return true;
            }
        };

        let result: redis::RedisResult<Option<String>> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await;

        match result {
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, key, "cache SET NX failed, assuming leadership");
                true
            }
        }
    }

    /// Write a task's bookkeeping hash and refresh its TTL in one
    /// pipeline round trip. Failures are logged, never propagated: a
    /// lost stats write does not abort a scheduled task.
    pub async fn write_hash(&self, key: &str, fields: &[(String, String)], ttl_secs: u64) {
        let mut conn = match self.connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, key, "cache unavailable, dropping hash write");
                return;
            }
        };

        let mut pipe = redis::pipe();
        pipe.hset_multiple(key, fields).ignore();
        pipe.expire(key, ttl_secs as i64).ignore();

        if let Err(e) = pipe.query_async::<_, ()>(&mut conn).await {
            warn!(error = %e, key, "failed to write task bookkeeping hash");
        }
    }

    /// Read back a task's bookkeeping hash. Returns an empty map (never
    /// an error) when the cache is unavailable or the key is absent.
    pub async fn read_hash(&self, key: &str) -> HashMap<String, String> {
        let mut conn = match self.connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, key, "cache unavailable, returning empty hash");
                return HashMap::new();
            }
        };

        conn.hgetall(key).await.unwrap_or_default()
    }
}
