//! From trait implementations for CacheError conversions

use super::types::CacheError;

impl From<anyhow::Error> for CacheError {
    fn from(error: anyhow::Error) -> Self {
        Self::other(error.to_string())
    }
}

impl From<std::io::Error> for CacheError {
    fn from(error: std::io::Error) -> Self {
        Self::transport(error.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string())
    }
}

impl From<toml::de::Error> for CacheError {
    fn from(error: toml::de::Error) -> Self {
        Self::config(format!("Failed to parse TOML: {}", error))
    }
}

#[cfg(feature = "redis-store")]
impl From<redis::RedisError> for CacheError {
    fn from(error: redis::RedisError) -> Self {
        let context = if error.is_timeout() {
            Some("redis timeout".to_string())
        } else if error.is_connection_dropped() || error.is_connection_refusal() {
            Some("redis connection lost".to_string())
        } else {
            None
        };
        Self::Transport {
            message: error.to_string(),
            context,
        }
    }
}
