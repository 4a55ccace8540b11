//! Caller-facing cache surface

use super::message::Message;
use super::outcome::{MissPolicy, ReadResult, WriteResult};
use super::parallel::ParallelCache;
use super::pipeline::PipelineCache;
use super::store::KvStore;
use crate::concurrency::CallContext;
use crate::config::{CacheConfig, DEFAULT_PARALLEL_LIMIT};
use crate::error::CacheError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// How a batch is dispatched to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One round trip per key, bounded concurrency
    #[default]
    Parallel,
    /// Every command in one round trip
    Pipeline,
}

impl Strategy {
    /// How this strategy reports a batch in which every key missed
    pub fn miss_policy(&self) -> MissPolicy {
        match self {
            Self::Parallel => MissPolicy::Tolerate,
            Self::Pipeline => MissPolicy::ErrorWhenAllMissing,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parallel => write!(f, "parallel"),
            Self::Pipeline => write!(f, "pipeline"),
        }
    }
}

impl FromStr for Strategy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "parallel" => Ok(Self::Parallel),
            "pipeline" | "pipelined" => Ok(Self::Pipeline),
            other => Err(CacheError::config(format!("Unknown strategy '{}'", other))),
        }
    }
}

/// Batch operations on one conversation's messages
#[async_trait]
pub trait MessageCache: Send + Sync {
    /// Which strategy this implementation uses
    fn strategy(&self) -> Strategy;

    /// Store every message under its `(conversation, seq)` key, replacing
    /// existing entries. Returns the number written.
    async fn set_messages(
        &self,
        ctx: &CallContext,
        conversation_id: &str,
        messages: &[Message],
    ) -> WriteResult;

    /// Fetch the messages at `seqs`. Found messages come back in request
    /// order; seqs that could not be resolved are listed in `failed_seqs`.
    async fn get_messages(&self, ctx: &CallContext, conversation_id: &str, seqs: &[i64]) -> ReadResult;

    /// Remove the entries at `seqs`. Returns how many existed.
    async fn delete_messages(
        &self,
        ctx: &CallContext,
        conversation_id: &str,
        seqs: &[i64],
    ) -> WriteResult;
}

/// Tunables shared by both strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Expiry applied to written entries
    pub entry_ttl: Option<Duration>,
    /// Per-key operations a parallel batch keeps in flight
    pub parallel_limit: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            entry_ttl: None,
            parallel_limit: DEFAULT_PARALLEL_LIMIT,
        }
    }
}

impl From<&CacheConfig> for CacheOptions {
    fn from(config: &CacheConfig) -> Self {
        Self {
            entry_ttl: config.entry_ttl,
            parallel_limit: config.parallel_limit,
        }
    }
}

/// Message cache over one shared store, offering both strategies
pub struct MsgCache<S: KvStore + ?Sized + 'static> {
    parallel: ParallelCache<S>,
    pipeline: PipelineCache<S>,
}

impl<S: KvStore + ?Sized + 'static> Clone for MsgCache<S> {
    fn clone(&self) -> Self {
        Self {
            parallel: self.parallel.clone(),
            pipeline: self.pipeline.clone(),
        }
    }
}

impl<S: KvStore + ?Sized + 'static> MsgCache<S> {
    pub fn new(store: Arc<S>, options: CacheOptions) -> Self {
        Self {
            parallel: ParallelCache::new(Arc::clone(&store))
                .with_ttl(options.entry_ttl)
                .with_parallel_limit(options.parallel_limit),
            pipeline: PipelineCache::new(store).with_ttl(options.entry_ttl),
        }
    }

    pub fn from_config(store: Arc<S>, config: &CacheConfig) -> Self {
        Self::new(store, CacheOptions::from(config))
    }

    pub fn store(&self) -> &Arc<S> {
        self.parallel.store()
    }

    /// The implementation behind `strategy`
    pub fn strategy(&self, strategy: Strategy) -> &dyn MessageCache {
        match strategy {
            Strategy::Parallel => &self.parallel,
            Strategy::Pipeline => &self.pipeline,
        }
    }

    /// Write with one round trip per message
    pub async fn parallel_set(
        &self,
        ctx: &CallContext,
        conversation_id: &str,
        messages: &[Message],
    ) -> WriteResult {
        self.parallel.set_messages(ctx, conversation_id, messages).await
    }

    /// Write every message in one round trip
    pub async fn pipeline_set(
        &self,
        ctx: &CallContext,
        conversation_id: &str,
        messages: &[Message],
    ) -> WriteResult {
        self.pipeline.set_messages(ctx, conversation_id, messages).await
    }

    /// Read with one round trip per seq; misses never fail the call
    pub async fn parallel_get(&self, ctx: &CallContext, conversation_id: &str, seqs: &[i64]) -> ReadResult {
        self.parallel.get_messages(ctx, conversation_id, seqs).await
    }

    /// Read every seq in one round trip; fails with `NotFound` when nothing
    /// at all is cached
    pub async fn pipeline_get(&self, ctx: &CallContext, conversation_id: &str, seqs: &[i64]) -> ReadResult {
        self.pipeline.get_messages(ctx, conversation_id, seqs).await
    }

    pub async fn parallel_delete(
        &self,
        ctx: &CallContext,
        conversation_id: &str,
        seqs: &[i64],
    ) -> WriteResult {
        self.parallel.delete_messages(ctx, conversation_id, seqs).await
    }

    pub async fn pipeline_delete(
        &self,
        ctx: &CallContext,
        conversation_id: &str,
        seqs: &[i64],
    ) -> WriteResult {
        self.pipeline.delete_messages(ctx, conversation_id, seqs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("Pipeline".parse::<Strategy>().unwrap(), Strategy::Pipeline);
        assert_eq!("parallel".parse::<Strategy>().unwrap(), Strategy::Parallel);
        assert!("serial".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_strategy_miss_policy() {
        assert_eq!(Strategy::Parallel.miss_policy(), MissPolicy::Tolerate);
        assert_eq!(Strategy::Pipeline.miss_policy(), MissPolicy::ErrorWhenAllMissing);
    }

    #[test]
    fn test_options_from_config() {
        let config = CacheConfig {
            parallel_limit: 9,
            entry_ttl: None,
            ..Default::default()
        };
        let options = CacheOptions::from(&config);
        assert_eq!(options.parallel_limit, 9);
        assert_eq!(options.entry_ttl, None);
    }
}
