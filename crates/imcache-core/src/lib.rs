//! IM Message Cache Core Library
//!
//! This crate provides the hot-path message cache of an instant-messaging
//! backend: the key scheme for `(conversation, seq)` entries, parallel and
//! pipelined batch reads and writes with partial-failure accounting, the
//! backing store adapters, and configuration.

pub mod cache;
pub mod concurrency;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use cache::{
    BatchRead, CacheOptions, KvStore, MemoryStore, Message, MessageCache, MsgCache, ParallelCache,
    PipelineCache, Strategy,
};
#[cfg(feature = "redis-store")]
pub use cache::RedisStore;
pub use concurrency::CallContext;
pub use config::{CacheConfig, LoggingConfig};
pub use error::{BatchError, CacheError, CacheResult, UnifiedError};
