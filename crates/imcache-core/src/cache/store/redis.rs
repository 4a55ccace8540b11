//! Redis-backed store
//!
//! Uses a multiplexed [`ConnectionManager`], which is cheap to clone and safe
//! to share between concurrent batches. Pipelines are sent non-transactionally
//! (no MULTI/EXEC), matching a plain client-side pipeline. Values travel as
//! raw bytes, so a corrupt entry reaches the decoder instead of failing the
//! reply.

use super::KvStore;
use crate::config::RedisConfig;
use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::{debug, info};

/// [`KvStore`] over a Redis connection manager
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect using the given configuration
    pub async fn connect(config: &RedisConfig) -> CacheResult<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            CacheError::config_with_context(
                format!("Invalid Redis URL: {}", e),
                "Opening Redis client",
            )
        })?;
        let addr = client.get_connection_info().addr.to_string();

        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                CacheError::transport(format!(
                    "Timed out connecting to Redis after {:?}",
                    config.connect_timeout
                ))
            })??;

        info!(%addr, "Connected to Redis");
        Ok(Self { conn })
    }

    /// Round-trip health check
    pub async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

fn ttl_millis(ttl: Option<Duration>) -> Option<u64> {
    ttl.map(|ttl| (ttl.as_millis() as u64).max(1))
}

#[async_trait]
impl KvStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ms) = ttl_millis(ttl) {
            cmd.arg("PX").arg(ms);
        }
        cmd.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value = redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<Vec<u8>>>(&mut conn)
            .await?;
        Ok(value)
    }

    async fn del(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn.clone();
        let removed = redis::cmd("DEL")
            .arg(key)
            .query_async::<_, i64>(&mut conn)
            .await?;
        Ok(removed > 0)
    }

    async fn pipeline_set(
        &self,
        entries: Vec<(String, Vec<u8>)>,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let px = ttl_millis(ttl);
        let mut pipe = redis::pipe();
        for (key, value) in &entries {
            pipe.cmd("SET").arg(key).arg(value);
            if let Some(ms) = px {
                pipe.arg("PX").arg(ms);
            }
            pipe.ignore();
        }

        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn).await?;
        debug!(commands = entries.len(), "Executed SET pipeline");
        Ok(())
    }

    async fn pipeline_get(&self, keys: Vec<String>) -> CacheResult<Vec<CacheResult<Option<Vec<u8>>>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut pipe = redis::pipe();
        for key in &keys {
            pipe.cmd("GET").arg(key);
        }

        let mut conn = self.conn.clone();
        let values = pipe
            .query_async::<_, Vec<Option<Vec<u8>>>>(&mut conn)
            .await?;
        debug!(commands = keys.len(), "Executed GET pipeline");
        Ok(values.into_iter().map(Ok).collect())
    }

    async fn pipeline_del(&self, keys: Vec<String>) -> CacheResult<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut pipe = redis::pipe();
        for key in &keys {
            pipe.cmd("DEL").arg(key);
        }

        let mut conn = self.conn.clone();
        let removed = pipe.query_async::<_, Vec<i64>>(&mut conn).await?;
        Ok(removed.into_iter().filter(|&n| n > 0).count())
    }
}
