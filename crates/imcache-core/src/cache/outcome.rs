//! Per-key outcome classification and batch result assembly
//!
//! Both strategies reduce their store replies to one [`KeyOutcome`] per
//! requested seq and hand them here. Assembly walks the seqs in request order,
//! so the success list follows the input order no matter in which order the
//! replies arrived.

use super::message::Message;
use crate::error::{BatchError, CacheError, CacheResult};
use tracing::warn;

/// Outcome of one key within a batch
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// Entry present and decoded
    Found(Message),
    /// No entry at the key
    NotFound,
    /// The command for this key failed
    Failed(CacheError),
}

impl KeyOutcome {
    /// Classify one store reply for `seq`.
    ///
    /// A value that does not decode is treated as a miss: the entry is
    /// unusable, and the caller falls back to the durable store for it.
    pub fn from_reply(seq: i64, reply: CacheResult<Option<Vec<u8>>>) -> Self {
        match reply {
            Ok(Some(value)) => match Message::decode(&value) {
                Ok(message) => Self::Found(message),
                Err(e) => {
                    warn!(seq, error = %e, "Undecodable cache entry, treating as miss");
                    Self::NotFound
                }
            },
            Ok(None) => Self::NotFound,
            Err(e) => Self::Failed(e),
        }
    }
}

/// Successes and misses of a read batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchRead {
    /// Found messages, in request order
    pub messages: Vec<Message>,
    /// Requested seqs that could not be resolved, in request order
    pub failed_seqs: Vec<i64>,
}

impl BatchRead {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: Vec::with_capacity(capacity),
            failed_seqs: Vec::new(),
        }
    }

    /// Number of seqs classified
    pub fn len(&self) -> usize {
        self.messages.len() + self.failed_seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.failed_seqs.is_empty()
    }
}

/// Result of a read batch
pub type ReadResult = Result<BatchRead, BatchError<BatchRead>>;

/// Result of a write or delete batch: number of entries affected
pub type WriteResult = Result<usize, BatchError<usize>>;

/// How a batch in which every key missed is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissPolicy {
    /// Misses only ever land in `failed_seqs`
    Tolerate,
    /// A non-empty batch where every key missed also fails with `NotFound`
    ErrorWhenAllMissing,
}

/// Build the read result from outcomes aligned with `seqs`.
///
/// `None` slots are keys whose operation never completed (the batch was
/// interrupted); they appear in neither list. `interrupted` is the reason the
/// batch stopped early, if it did. A `Failed` outcome puts its seq in
/// `failed_seqs`, and the first such cause becomes the batch error.
pub fn assemble_read<I>(
    seqs: &[i64],
    outcomes: I,
    policy: MissPolicy,
    interrupted: Option<CacheError>,
) -> ReadResult
where
    I: IntoIterator<Item = Option<KeyOutcome>>,
{
    let mut read = BatchRead::with_capacity(seqs.len());
    let mut first_failure = None;
    let mut missing = 0usize;

    for (&seq, outcome) in seqs.iter().zip(outcomes) {
        match outcome {
            Some(KeyOutcome::Found(message)) => read.messages.push(message),
            Some(KeyOutcome::NotFound) => {
                missing += 1;
                read.failed_seqs.push(seq);
            }
            Some(KeyOutcome::Failed(e)) => {
                read.failed_seqs.push(seq);
                first_failure.get_or_insert(e);
            }
            None => {}
        }
    }

    if let Some(error) = interrupted.or(first_failure) {
        return Err(BatchError::new(error, read));
    }

    if policy == MissPolicy::ErrorWhenAllMissing && !seqs.is_empty() && missing == seqs.len() {
        let error = CacheError::not_found(format!("none of {} requested seqs are cached", seqs.len()));
        return Err(BatchError::new(error, read));
    }

    Ok(read)
}

/// Build the result of a write or delete batch
pub fn assemble_write(affected: usize, failure: Option<CacheError>) -> WriteResult {
    match failure {
        Some(error) => Err(BatchError::new(error, affected)),
        None => Ok(affected),
    }
}
