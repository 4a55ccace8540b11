//! File-based configuration loading

use super::cache_config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use std::fs;
use std::path::Path;

/// Load configuration from a file
///
/// Supports JSON and TOML based on file extension (TOML when the extension is
/// `toml`, JSON otherwise). Returns the default config if the file doesn't exist.
pub fn load_from_file(path: &Path) -> CacheResult<CacheConfig> {
    if !path.exists() {
        return Ok(CacheConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        CacheError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let config: CacheConfig = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| {
            CacheError::config_with_context(
                format!("Failed to parse TOML config: {}", e),
                format!("Deserializing TOML configuration from '{}'", path.display()),
            )
        })?,
        _ => serde_json::from_str(&content).map_err(|e| {
            CacheError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
    };

    Ok(config)
}

/// Write configuration to a file, format chosen by extension like [`load_from_file`]
pub fn save_to_file(config: &CacheConfig, path: &Path) -> CacheResult<()> {
    let content = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::to_string_pretty(config)
            .map_err(|e| CacheError::config(format!("Failed to serialize TOML config: {}", e)))?,
        _ => serde_json::to_string_pretty(config)
            .map_err(|e| CacheError::config(format!("Failed to serialize JSON config: {}", e)))?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            CacheError::config_with_context(
                format!("Failed to create config directory: {}", e),
                format!("Creating '{}'", parent.display()),
            )
        })?;
    }

    fs::write(path, content).map_err(|e| {
        CacheError::config_with_context(
            format!("Failed to write config file: {}", e),
            format!("Writing configuration to '{}'", path.display()),
        )
    })
}
