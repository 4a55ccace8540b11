//! Environment variable overrides
//!
//! Recognised variables:
//! - `IMCACHE_BACKEND` (`memory` / `redis`)
//! - `IMCACHE_REDIS_URL`
//! - `IMCACHE_REDIS_CONNECT_TIMEOUT` (humantime, e.g. `3s`)
//! - `IMCACHE_ENTRY_TTL` (humantime, or `none` to disable expiry)
//! - `IMCACHE_PARALLEL_LIMIT`
//! - `IMCACHE_LOG_LEVEL`
//! - `IMCACHE_LOG_FORMAT` (`pretty` / `compact` / `json`)

use super::cache_config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use std::env;
use std::time::Duration;

/// Apply `IMCACHE_*` variables from the process environment
pub fn apply_env(config: &mut CacheConfig) -> CacheResult<()> {
    apply_env_with(config, |name| env::var(name).ok())
}

/// Apply overrides read through `lookup`
pub fn apply_env_with<F>(config: &mut CacheConfig, lookup: F) -> CacheResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(backend) = lookup("IMCACHE_BACKEND") {
        config.backend = backend.parse()?;
    }

    if let Some(url) = lookup("IMCACHE_REDIS_URL") {
        config.redis.url = url;
    }

    if let Some(timeout) = lookup("IMCACHE_REDIS_CONNECT_TIMEOUT") {
        config.redis.connect_timeout = parse_duration("IMCACHE_REDIS_CONNECT_TIMEOUT", &timeout)?;
    }

    if let Some(ttl) = lookup("IMCACHE_ENTRY_TTL") {
        config.entry_ttl = match ttl.trim() {
            "" | "none" | "off" => None,
            value => Some(parse_duration("IMCACHE_ENTRY_TTL", value)?),
        };
    }

    if let Some(limit) = lookup("IMCACHE_PARALLEL_LIMIT") {
        config.parallel_limit = limit
            .trim()
            .parse()
            .map_err(|_| CacheError::config("Invalid IMCACHE_PARALLEL_LIMIT value"))?;
    }

    if let Some(level) = lookup("IMCACHE_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Some(format) = lookup("IMCACHE_LOG_FORMAT") {
        config.logging.format = format.parse()?;
    }

    Ok(())
}

fn parse_duration(name: &str, value: &str) -> CacheResult<Duration> {
    humantime_serde::re::humantime::parse_duration(value.trim())
        .map_err(|e| CacheError::config(format!("Invalid {} value '{}': {}", name, value, e)))
}
