//! Backing key-value store interface
//!
//! Keys are strings and values raw bytes; the store never interprets values.
//! The cache engine talks to its store through four primitives plus their
//! delete counterparts. The `pipeline_*` calls must be a single round trip
//! carrying every queued command, and must report each command's outcome
//! separately from the round trip itself.

mod memory;
#[cfg(feature = "redis-store")]
mod redis;

pub use memory::{MemoryStore, MemoryStoreStats};
#[cfg(feature = "redis-store")]
pub use self::redis::RedisStore;

use crate::config::{BackendKind, CacheConfig};
use crate::error::CacheResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Key-value store holding cache entries
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// Store `value` at `key`, replacing any existing entry
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()>;

    /// Fetch the value at `key`; `Ok(None)` when absent
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Remove `key`; `Ok(true)` if an entry existed
    async fn del(&self, key: &str) -> CacheResult<bool>;

    /// Queue one SET per entry and send them in a single round trip
    async fn pipeline_set(
        &self,
        entries: Vec<(String, Vec<u8>)>,
        ttl: Option<Duration>,
    ) -> CacheResult<()>;

    /// Queue one GET per key and send them in a single round trip.
    ///
    /// The outer error is a failure of the round trip; each inner result is
    /// the outcome of one command, in key order.
    async fn pipeline_get(&self, keys: Vec<String>) -> CacheResult<Vec<CacheResult<Option<Vec<u8>>>>>;

    /// Queue one DEL per key in a single round trip; returns how many existed
    async fn pipeline_del(&self, keys: Vec<String>) -> CacheResult<usize>;
}

/// Build the store selected by `config`
pub async fn connect(config: &CacheConfig) -> CacheResult<Arc<dyn KvStore>> {
    match config.backend {
        BackendKind::Memory => {
            info!("Using in-process memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "redis-store")]
        BackendKind::Redis => Ok(Arc::new(RedisStore::connect(&config.redis).await?)),
        #[cfg(not(feature = "redis-store"))]
        BackendKind::Redis => Err(crate::error::CacheError::config(
            "Redis backend requested but the `redis-store` feature is disabled",
        )),
    }
}
