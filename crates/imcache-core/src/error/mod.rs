//! Error types for the message cache
//!
//! Every fallible operation returns [`CacheError`] (or a [`BatchError`] that
//! wraps one together with the partial result of a batch). All variants
//! implement [`UnifiedError`], which provides:
//! - error_code: a stable identifier for programmatic handling
//! - message: human-readable message
//! - context: optional detail about where the error happened
//! - is_retryable: whether the caller's retry policy may try again

mod batch;
mod constructors;
mod conversions;
mod types;
mod unified_error;

pub use batch::BatchError;
pub use types::{CacheError, CacheResult, UnifiedError};
