//! Cache and backend configuration

use super::logging_config::LoggingConfig;
use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default number of per-key operations a parallel batch keeps in flight
pub const DEFAULT_PARALLEL_LIMIT: usize = 3;

/// Which store the cache talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process store (tests, local runs)
    #[default]
    Memory,
    /// Remote Redis server
    Redis,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Redis => write!(f, "redis"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(CacheError::config(format!("Unknown backend '{}'", other))),
        }
    }
}

/// Redis connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Connection URL, e.g. `redis://:password@host:6379/0`
    pub url: String,
    /// Maximum time to establish the connection
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Store backend
    pub backend: BackendKind,
    /// Redis settings (used when `backend = "redis"`)
    pub redis: RedisConfig,
    /// Expiry applied to written entries; `None` keeps them until evicted
    #[serde(with = "humantime_serde")]
    pub entry_ttl: Option<Duration>,
    /// Per-key operations a parallel batch keeps in flight
    pub parallel_limit: usize,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            redis: RedisConfig::default(),
            entry_ttl: Some(Duration::from_secs(24 * 60 * 60)),
            parallel_limit: DEFAULT_PARALLEL_LIMIT,
            logging: LoggingConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Check the configuration for values the cache cannot run with
    pub fn validate(&self) -> CacheResult<()> {
        if self.parallel_limit == 0 {
            return Err(CacheError::config_with_context(
                "parallel_limit must be at least 1",
                "Validating cache configuration",
            ));
        }
        if self.backend == BackendKind::Redis && self.redis.url.trim().is_empty() {
            return Err(CacheError::config_with_context(
                "redis.url is required for the redis backend",
                "Validating cache configuration",
            ));
        }
        if self.entry_ttl == Some(Duration::ZERO) {
            return Err(CacheError::config_with_context(
                "entry_ttl must be positive; omit it to disable expiry",
                "Validating cache configuration",
            ));
        }
        Ok(())
    }
}
