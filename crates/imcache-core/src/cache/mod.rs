//! Message cache engine
//!
//! Messages are addressed by `(conversation_id, seq)` through the [`key`]
//! codec and stored as JSON values in a [`KvStore`]. Batches move in and out
//! under two strategies:
//!
//! - [`ParallelCache`]: one round trip per key, bounded concurrency
//! - [`PipelineCache`]: every command of the batch in one round trip
//!
//! Both report partial failures the same way (see [`outcome`]) and keep found
//! messages in request order. [`MsgCache`] puts both behind one facade.

pub mod key;
mod manager;
mod message;
pub mod outcome;
mod parallel;
mod pipeline;
pub mod store;

#[cfg(test)]
mod tests;

pub use manager::{CacheOptions, MessageCache, MsgCache, Strategy};
pub use message::Message;
pub use outcome::{BatchRead, KeyOutcome, MissPolicy, ReadResult, WriteResult};
pub use parallel::ParallelCache;
pub use pipeline::PipelineCache;
pub use store::{KvStore, MemoryStore, MemoryStoreStats};
#[cfg(feature = "redis-store")]
pub use store::RedisStore;
