//! Configuration for the message cache
//!
//! Settings are layered: built-in defaults, then an optional JSON or TOML
//! file, then `IMCACHE_*` environment variables.

mod cache_config;
mod env_loader;
mod file_loader;
mod logging_config;

pub use cache_config::{BackendKind, CacheConfig, RedisConfig, DEFAULT_PARALLEL_LIMIT};
pub use env_loader::{apply_env, apply_env_with};
pub use file_loader::{load_from_file, save_to_file};
pub use logging_config::{LogFormat, LoggingConfig};

use crate::error::CacheResult;
use std::path::Path;

/// Load configuration: defaults, then `path` (if it exists), then environment.
pub fn load(path: &Path) -> CacheResult<CacheConfig> {
    let mut config = load_from_file(path)?;
    apply_env(&mut config)?;
    config.validate()?;
    Ok(config)
}
