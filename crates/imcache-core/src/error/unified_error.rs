//! UnifiedError trait implementation for CacheError

use super::types::{CacheError, UnifiedError};

impl UnifiedError for CacheError {
    fn error_code(&self) -> &str {
        match self {
            Self::Transport { .. } => "IMCACHE_TRANSPORT",
            Self::NotFound { .. } => "IMCACHE_NOT_FOUND",
            Self::Serialization { .. } => "IMCACHE_SERIALIZATION",
            Self::Cancelled => "IMCACHE_CANCELLED",
            Self::DeadlineExceeded { .. } => "IMCACHE_DEADLINE",
            Self::Config { .. } => "IMCACHE_CONFIG",
            Self::Other { .. } => "IMCACHE_OTHER",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Transport { message, .. } => message,
            Self::NotFound { message, .. } => message,
            Self::Serialization { message, .. } => message,
            Self::Cancelled => "Operation was cancelled",
            Self::DeadlineExceeded { .. } => "Deadline exceeded",
            Self::Config { message, .. } => message,
            Self::Other { message, .. } => message,
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::Transport { context, .. } => context.as_deref(),
            Self::NotFound { context, .. } => context.as_deref(),
            Self::Serialization { context, .. } => context.as_deref(),
            Self::Cancelled => None,
            Self::DeadlineExceeded { context, .. } => context.as_deref(),
            Self::Config { context, .. } => context.as_deref(),
            Self::Other { context, .. } => context.as_deref(),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::DeadlineExceeded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            CacheError::transport("a"),
            CacheError::not_found("b"),
            CacheError::serialization("c"),
            CacheError::Cancelled,
            CacheError::deadline_exceeded(5),
            CacheError::config("d"),
            CacheError::other("e"),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.error_code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_retryable() {
        assert!(CacheError::transport("io").is_retryable());
        assert!(CacheError::deadline_exceeded(100).is_retryable());
        assert!(!CacheError::not_found("none").is_retryable());
        assert!(!CacheError::Cancelled.is_retryable());
    }
}
