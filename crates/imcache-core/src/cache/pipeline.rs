//! Pipelined strategy
//!
//! All commands of a batch are queued and sent in one round trip. A failure of
//! that round trip fails the whole batch; per-command outcomes come back with
//! the reply and are classified key by key.

use super::key;
use super::manager::{MessageCache, Strategy};
use super::message::Message;
use super::outcome::{BatchRead, KeyOutcome, ReadResult, WriteResult, assemble_read, assemble_write};
use super::store::KvStore;
use crate::concurrency::CallContext;
use crate::error::{BatchError, CacheError, CacheResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cache strategy sending each batch as one pipeline.
///
/// Reads differ from [`ParallelCache`](super::ParallelCache) in one respect:
/// when every key of a non-empty request misses, the read fails with
/// [`CacheError::NotFound`], and the error still carries the complete result
/// (no messages, every seq failed). Existing callers tell "nothing cached"
/// apart from "partially cached" through that error, so the parallel reader
/// keeps reporting misses only through `failed_seqs`.
pub struct PipelineCache<S: KvStore + ?Sized + 'static> {
    store: Arc<S>,
    ttl: Option<Duration>,
}

impl<S: KvStore + ?Sized + 'static> Clone for PipelineCache<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ttl: self.ttl,
        }
    }
}

impl<S: KvStore + ?Sized + 'static> PipelineCache<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, ttl: None }
    }

    /// Expiry applied to written entries
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

/// Encode every message up front; nothing is sent if one fails
fn encode_entries(conversation_id: &str, messages: &[Message]) -> CacheResult<Vec<(String, Vec<u8>)>> {
    messages
        .iter()
        .map(|m| Ok((key::encode(conversation_id, m.seq), m.encode()?)))
        .collect()
}

#[async_trait]
impl<S: KvStore + ?Sized + 'static> MessageCache for PipelineCache<S> {
    fn strategy(&self) -> Strategy {
        Strategy::Pipeline
    }

    async fn set_messages(
        &self,
        ctx: &CallContext,
        conversation_id: &str,
        messages: &[Message],
    ) -> WriteResult {
        if messages.is_empty() {
            return Ok(0);
        }

        let entries = match encode_entries(conversation_id, messages) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(conversation_id, error = %e, "Pipeline write rejected before sending");
                return assemble_write(0, Some(e));
            }
        };

        match ctx.run(async { self.store.pipeline_set(entries, self.ttl).await }).await {
            Ok(()) => {
                debug!(
                    store = self.store.name(),
                    conversation_id,
                    written = messages.len(),
                    "Pipeline write done"
                );
                Ok(messages.len())
            }
            Err(e) => {
                warn!(
                    store = self.store.name(),
                    conversation_id,
                    requested = messages.len(),
                    error = %e,
                    "Pipeline write failed"
                );
                assemble_write(0, Some(e))
            }
        }
    }

    async fn get_messages(&self, ctx: &CallContext, conversation_id: &str, seqs: &[i64]) -> ReadResult {
        if seqs.is_empty() {
            return Ok(BatchRead::default());
        }

        let keys = key::encode_all(conversation_id, seqs);
        let replies = match ctx.run(async { self.store.pipeline_get(keys).await }).await {
            Ok(replies) if replies.len() == seqs.len() => replies,
            Ok(replies) => {
                let e = CacheError::transport(format!(
                    "Pipeline returned {} replies for {} commands",
                    replies.len(),
                    seqs.len()
                ));
                warn!(conversation_id, error = %e, "Pipeline read failed");
                return Err(BatchError::new(e, BatchRead::default()));
            }
            Err(e) => {
                warn!(
                    store = self.store.name(),
                    conversation_id,
                    requested = seqs.len(),
                    error = %e,
                    "Pipeline read failed"
                );
                return Err(BatchError::new(e, BatchRead::default()));
            }
        };

        let outcomes = replies
            .into_iter()
            .zip(seqs)
            .map(|(reply, &seq)| Some(KeyOutcome::from_reply(seq, reply)));
        let result = assemble_read(seqs, outcomes, self.strategy().miss_policy(), None);

        match &result {
            Ok(read) => debug!(
                store = self.store.name(),
                conversation_id,
                requested = seqs.len(),
                found = read.messages.len(),
                missing = read.failed_seqs.len(),
                "Pipeline read done"
            ),
            Err(e) if e.is_not_found() => debug!(
                store = self.store.name(),
                conversation_id,
                requested = seqs.len(),
                "Pipeline read found nothing"
            ),
            Err(e) => warn!(
                store = self.store.name(),
                conversation_id,
                requested = seqs.len(),
                found = e.partial.messages.len(),
                error = %e.error,
                "Pipeline read failed"
            ),
        }
        result
    }

    async fn delete_messages(
        &self,
        ctx: &CallContext,
        conversation_id: &str,
        seqs: &[i64],
    ) -> WriteResult {
        if seqs.is_empty() {
            return Ok(0);
        }

        let keys = key::encode_all(conversation_id, seqs);
        match ctx.run(async { self.store.pipeline_del(keys).await }).await {
            Ok(removed) => {
                debug!(conversation_id, requested = seqs.len(), removed, "Pipeline delete done");
                Ok(removed)
            }
            Err(e) => {
                warn!(conversation_id, error = %e, "Pipeline delete failed");
                assemble_write(0, Some(e))
            }
        }
    }
}
