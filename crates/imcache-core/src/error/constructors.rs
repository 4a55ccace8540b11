//! Constructor methods for CacheError

use super::types::CacheError;

impl CacheError {
    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            context: None,
        }
    }

    /// Create the not-found error raised when every key of a batch missed
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            context: None,
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
            context: None,
        }
    }

    /// Create a deadline error
    pub fn deadline_exceeded(after_ms: u64) -> Self {
        Self::DeadlineExceeded {
            after_ms,
            context: None,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to any error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let ctx = Some(context.into());
        match &mut self {
            Self::Transport { context: c, .. } => *c = ctx,
            Self::NotFound { context: c, .. } => *c = ctx,
            Self::Serialization { context: c, .. } => *c = ctx,
            Self::DeadlineExceeded { context: c, .. } => *c = ctx,
            Self::Config { context: c, .. } => *c = ctx,
            Self::Other { context: c, .. } => *c = ctx,
            Self::Cancelled => {}
        }
        self
    }

    /// True for the pipelined all-miss signal
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True when the call context fired (cancel or deadline)
    pub fn is_context_expired(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded { .. })
    }
}
