//! Batch-level error carrying the partial result of the batch

use super::types::{CacheError, UnifiedError};
use std::fmt;

/// Top-level failure of a batch call.
///
/// `partial` holds whatever the batch managed to produce before the error:
/// the number of entries written for writes, or the classified successes and
/// failed seqs for reads. For the pipelined all-miss case `partial` is the
/// complete (fully failed) result and `error` is [`CacheError::NotFound`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatchError<T> {
    /// The cause
    pub error: CacheError,
    /// Best-effort partial result
    pub partial: T,
}

impl<T> BatchError<T> {
    pub fn new(error: CacheError, partial: T) -> Self {
        Self { error, partial }
    }

    /// True when this is the pipelined "every key missed" signal rather than
    /// a transport or context failure.
    pub fn is_not_found(&self) -> bool {
        self.error.is_not_found()
    }

    /// Split into cause and partial result
    pub fn into_parts(self) -> (CacheError, T) {
        (self.error, self.partial)
    }
}

impl<T> fmt::Display for BatchError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch failed: {}", self.error)
    }
}

impl<T: fmt::Debug> std::error::Error for BatchError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T: fmt::Debug + Send + Sync> UnifiedError for BatchError<T> {
    fn error_code(&self) -> &str {
        self.error.error_code()
    }

    fn message(&self) -> &str {
        self.error.message()
    }

    fn context(&self) -> Option<&str> {
        self.error.context()
    }

    fn is_retryable(&self) -> bool {
        self.error.is_retryable()
    }
}

impl<T> From<BatchError<T>> for CacheError {
    fn from(error: BatchError<T>) -> Self {
        error.error
    }
}
