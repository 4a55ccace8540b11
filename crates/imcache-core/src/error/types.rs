//! Core error types and traits

use thiserror::Error;

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Unified error trait implemented by every cache error.
///
/// - error_code(): unique code for programmatic error identification
/// - message(): human-readable error message
/// - context(): optional additional context
/// - is_retryable(): hint for the caller's retry policy (the cache never retries)
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Get the error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Get the human-readable error message
    fn message(&self) -> &str;

    /// Get optional context about the error
    fn context(&self) -> Option<&str> {
        None
    }

    /// Check if this error is retryable
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Main error type for the message cache
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Backing store or connection failure
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        context: Option<String>,
    },

    /// Every key of a pipelined read missed
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        context: Option<String>,
    },

    /// Message could not be encoded to or decoded from its stored form
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        context: Option<String>,
    },

    /// The caller cancelled the call context
    #[error("Operation was cancelled")]
    Cancelled,

    /// The call context deadline passed before the batch completed
    #[error("Deadline exceeded after {after_ms} ms")]
    DeadlineExceeded {
        after_ms: u64,
        context: Option<String>,
    },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// Generic error with context
    #[error("Error: {message}")]
    Other {
        message: String,
        context: Option<String>,
    },
}
