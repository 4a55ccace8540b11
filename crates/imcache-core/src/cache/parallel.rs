//! Per-key parallel strategy
//!
//! Every key gets its own round trip, run as a task on a [`JoinSet`] and gated
//! by a semaphore of `parallel_limit` permits. Each task reports back with its
//! input position, so results land in position-indexed slots and the request
//! order survives whatever order the replies arrive in.
//!
//! The batch stops at the first failing key or when the call context expires.
//! Outstanding tasks are aborted at that point; commands already sent may
//! still take effect on the store.

use super::key;
use super::manager::{MessageCache, Strategy};
use super::message::Message;
use super::outcome::{BatchRead, KeyOutcome, ReadResult, WriteResult, assemble_read, assemble_write};
use super::store::KvStore;
use crate::concurrency::CallContext;
use crate::config::DEFAULT_PARALLEL_LIMIT;
use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Slots filled so far, plus the reason the batch stopped early (if it did)
type FanOut<T> = (Vec<Option<CacheResult<T>>>, Option<CacheError>);

/// Cache strategy issuing one round trip per key
pub struct ParallelCache<S: KvStore + ?Sized + 'static> {
    store: Arc<S>,
    ttl: Option<Duration>,
    parallel_limit: usize,
}

impl<S: KvStore + ?Sized + 'static> Clone for ParallelCache<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ttl: self.ttl,
            parallel_limit: self.parallel_limit,
        }
    }
}

impl<S: KvStore + ?Sized + 'static> ParallelCache<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            ttl: None,
            parallel_limit: DEFAULT_PARALLEL_LIMIT,
        }
    }

    /// Expiry applied to written entries
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Per-key operations kept in flight at once (at least 1)
    pub fn with_parallel_limit(mut self, limit: usize) -> Self {
        self.parallel_limit = limit.max(1);
        self
    }

    pub fn parallel_limit(&self) -> usize {
        self.parallel_limit
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run `op` once per item, bounded by the parallel limit.
    ///
    /// Returns when every item finished, an item failed, or `ctx` expired.
    async fn fan_out<I, T, F, Fut>(&self, ctx: &CallContext, items: Vec<I>, op: F) -> FanOut<T>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(Arc<S>, I) -> Fut,
        Fut: Future<Output = CacheResult<T>> + Send + 'static,
    {
        let mut slots: Vec<Option<CacheResult<T>>> = (0..items.len()).map(|_| None).collect();
        if let Err(e) = ctx.check() {
            return (slots, Some(e));
        }

        let semaphore = Arc::new(Semaphore::new(self.parallel_limit));
        let mut tasks = JoinSet::new();
        for (index, item) in items.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let task = op(Arc::clone(&self.store), item);
            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => task.await,
                    Err(_) => Err(CacheError::other("Parallel batch semaphore closed")),
                };
                (index, result)
            });
        }

        let expired = ctx.expired();
        tokio::pin!(expired);

        let mut interrupted = None;
        loop {
            tokio::select! {
                biased;
                err = &mut expired => {
                    interrupted = Some(err);
                    break;
                }
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok((index, result))) => {
                        let failed = result.is_err();
                        slots[index] = Some(result);
                        if failed {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        interrupted = Some(CacheError::other(format!("Batch task failed: {}", e)));
                        break;
                    }
                },
            }
        }

        // Anything still queued or in flight is abandoned
        tasks.abort_all();
        (slots, interrupted)
    }
}

#[async_trait]
impl<S: KvStore + ?Sized + 'static> MessageCache for ParallelCache<S> {
    fn strategy(&self) -> Strategy {
        Strategy::Parallel
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

        let items: Vec<(String, Message)> = messages
            .iter()
            .map(|m| (key::encode(conversation_id, m.seq), m.clone()))
            .collect();
        let ttl = self.ttl;

        let (slots, interrupted) = self
            .fan_out(ctx, items, move |store, (key, message)| async move {
                let value = message.encode()?;
                store.set(&key, value, ttl).await
            })
            .await;

        let written = slots.iter().filter(|s| matches!(s, Some(Ok(())))).count();
        let failure = interrupted.or_else(|| slots.into_iter().flatten().find_map(Result::err));
        if let Some(e) = &failure {
            warn!(
                store = self.store.name(),
                conversation_id,
                requested = messages.len(),
                written,
                error = %e,
                "Parallel write failed"
            );
        } else {
            debug!(store = self.store.name(), conversation_id, written, "Parallel write done");
        }
        assemble_write(written, failure)
    }

    async fn get_messages(&self, ctx: &CallContext, conversation_id: &str, seqs: &[i64]) -> ReadResult {
        if seqs.is_empty() {
            return Ok(BatchRead::default());
        }

        let keys = key::encode_all(conversation_id, seqs);
        let (slots, interrupted) = self
            .fan_out(ctx, keys, |store, key| async move { store.get(&key).await })
            .await;

        let outcomes = slots
            .into_iter()
            .zip(seqs)
            .map(|(slot, &seq)| slot.map(|reply| KeyOutcome::from_reply(seq, reply)));
        let result = assemble_read(seqs, outcomes, self.strategy().miss_policy(), interrupted);

        match &result {
            Ok(read) => debug!(
                store = self.store.name(),
                conversation_id,
                requested = seqs.len(),
                found = read.messages.len(),
                missing = read.failed_seqs.len(),
                "Parallel read done"
            ),
            Err(e) => warn!(
                store = self.store.name(),
                conversation_id,
                requested = seqs.len(),
                found = e.partial.messages.len(),
                error = %e.error,
                "Parallel read failed"
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
        let (slots, interrupted) = self
            .fan_out(ctx, keys, |store, key| async move { store.del(&key).await })
            .await;

        let removed = slots.iter().filter(|s| matches!(s, Some(Ok(true)))).count();
        let failure = interrupted.or_else(|| slots.into_iter().flatten().find_map(Result::err));
        if let Some(e) = &failure {
            warn!(conversation_id, removed, error = %e, "Parallel delete failed");
        } else {
            debug!(conversation_id, requested = seqs.len(), removed, "Parallel delete done");
        }
        assemble_write(removed, failure)
    }
}
