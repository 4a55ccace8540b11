//! `imcache probe`: end-to-end self-check against the configured store

use super::{DynCache, synthetic_message};
use crate::console::CliConsole;
use anyhow::{Context, Result, ensure};
use imcache_core::{BatchRead, CallContext, Message, Strategy};
use std::time::{Duration, Instant};

/// Timings of one probe run
#[derive(Debug, Default)]
pub struct ProbeReport {
    pub conversation_id: String,
    pub count: usize,
    pub pipeline_set: Duration,
    pub parallel_get: Duration,
    pub pipeline_get: Duration,
    pub removed: usize,
}

/// Write `count` messages with the pipelined writer, read them back with both
/// readers, check contents and order, then remove them.
pub async fn probe(
    cache: &DynCache,
    ctx: &CallContext,
    console: &CliConsole,
    count: usize,
    conversation: Option<String>,
) -> Result<()> {
    let conversation_id =
        conversation.unwrap_or_else(|| format!("probe-{}", uuid::Uuid::new_v4().simple()));

    console.print_header("Cache probe");
    let report = run_probe(cache, ctx, &conversation_id, count).await?;

    console.print_field("conversation", &report.conversation_id);
    console.print_field("messages", report.count);
    console.print_field("pipeline set", format!("{:.2?}", report.pipeline_set));
    console.print_field("parallel get", format!("{:.2?}", report.parallel_get));
    console.print_field("pipeline get", format!("{:.2?}", report.pipeline_get));
    console.print_field("cleaned up", report.removed);
    console.success("Both readers returned every message in request order");
    Ok(())
}

/// Probe body, separated from output for testing
pub async fn run_probe(
    cache: &DynCache,
    ctx: &CallContext,
    conversation_id: &str,
    count: usize,
) -> Result<ProbeReport> {
    ensure!(count > 0, "probe needs at least one message");
    let last_seq = i64::try_from(count).context("probe count does not fit in a seq")?;

    let messages: Vec<Message> = (1..=last_seq)
        .map(|seq| synthetic_message(conversation_id, seq))
        .collect();
    let seqs: Vec<i64> = messages.iter().map(|m| m.seq).collect();
    let mut report = ProbeReport {
        conversation_id: conversation_id.to_string(),
        count,
        ..Default::default()
    };

    let started = Instant::now();
    let written = cache
        .pipeline_set(ctx, conversation_id, &messages)
        .await
        .context("pipelined write failed")?;
    report.pipeline_set = started.elapsed();
    ensure!(written == count, "wrote {} of {} messages", written, count);

    let started = Instant::now();
    let read = cache
        .parallel_get(ctx, conversation_id, &seqs)
        .await
        .context("parallel read failed")?;
    report.parallel_get = started.elapsed();
    verify(Strategy::Parallel, &read, &messages)?;

    let started = Instant::now();
    let read = cache
        .pipeline_get(ctx, conversation_id, &seqs)
        .await
        .context("pipelined read failed")?;
    report.pipeline_get = started.elapsed();
    verify(Strategy::Pipeline, &read, &messages)?;

    report.removed = cache
        .pipeline_delete(ctx, conversation_id, &seqs)
        .await
        .context("cleanup failed")?;

    Ok(report)
}

fn verify(strategy: Strategy, read: &BatchRead, expected: &[Message]) -> Result<()> {
    ensure!(
        read.failed_seqs.is_empty(),
        "{} reader missed {} seqs",
        strategy,
        read.failed_seqs.len()
    );
    ensure!(
        read.messages.len() == expected.len(),
        "{} reader returned {} of {} messages",
        strategy,
        read.messages.len(),
        expected.len()
    );
    if let Some(index) = read.messages.iter().zip(expected).position(|(a, b)| a != b) {
        anyhow::bail!(
            "{} reader returned seq {} at position {} where seq {} was written",
            strategy,
            read.messages[index].seq,
            index,
            expected[index].seq
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use imcache_core::{CacheOptions, KvStore, MemoryStore, MsgCache};
    use std::sync::Arc;

    fn memory_cache() -> DynCache {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        MsgCache::new(store, CacheOptions::default())
    }

    #[tokio::test]
    async fn test_probe_round_trip_on_memory_store() {
        let cache = memory_cache();
        let report = run_probe(&cache, &CallContext::new(), "probe-test", 25)
            .await
            .unwrap();
        assert_eq!(report.count, 25);
        assert_eq!(report.removed, 25);
    }

    #[tokio::test]
    async fn test_probe_rejects_empty_batch() {
        let cache = memory_cache();
        assert!(run_probe(&cache, &CallContext::new(), "probe-test", 0).await.is_err());
    }

    #[test]
    fn test_verify_detects_reordering() {
        let expected = vec![Message::with_seq(1), Message::with_seq(2)];
        let read = BatchRead {
            messages: vec![Message::with_seq(2), Message::with_seq(1)],
            failed_seqs: Vec::new(),
        };
        let err = verify(Strategy::Parallel, &read, &expected).unwrap_err();
        assert!(err.to_string().contains("position 0"));
    }
}
