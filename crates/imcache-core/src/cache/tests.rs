//! Strategy tests against a mocked store

use super::store::MockKvStore;
use super::{CacheOptions, Message, MessageCache, MsgCache, Strategy, key};
use crate::concurrency::CallContext;
use crate::error::CacheError;
use std::sync::Arc;
use std::time::Duration;

const CID: &str = "c1";

fn mock_store() -> MockKvStore {
    let mut store = MockKvStore::new();
    store.expect_name().return_const("mock");
    store
}

fn cache(store: MockKvStore) -> MsgCache<MockKvStore> {
    MsgCache::new(
        Arc::new(store),
        CacheOptions {
            entry_ttl: Some(Duration::from_secs(60)),
            parallel_limit: 2,
        },
    )
}

fn messages(seqs: &[i64]) -> Vec<Message> {
    seqs.iter().map(|&seq| Message::with_seq(seq)).collect()
}

fn stored(seq: i64) -> Option<Vec<u8>> {
    Some(Message::with_seq(seq).encode().unwrap())
}

#[tokio::test]
async fn test_pipeline_set_sends_one_batch_with_ttl() {
    let mut store = mock_store();
    store
        .expect_pipeline_set()
        .withf(|entries, ttl| {
            entries.len() == 3
                && entries[0].0 == "MESSAGE_CACHE:c1_1"
                && entries[2].0 == "MESSAGE_CACHE:c1_3"
                && *ttl == Some(Duration::from_secs(60))
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let written = cache(store)
        .pipeline_set(&CallContext::new(), CID, &messages(&[1, 2, 3]))
        .await
        .unwrap();
    assert_eq!(written, 3);
}

#[tokio::test]
async fn test_pipeline_set_round_trip_failure_reports_zero() {
    let mut store = mock_store();
    store
        .expect_pipeline_set()
        .times(1)
        .returning(|_, _| Err(CacheError::transport("connection reset")));

    let err = cache(store)
        .pipeline_set(&CallContext::new(), CID, &messages(&[1, 2, 3]))
        .await
        .unwrap_err();
    assert_eq!(err.partial, 0);
    assert_eq!(err.error, CacheError::transport("connection reset"));
}

#[tokio::test]
async fn test_cancelled_context_sends_nothing() {
    // No expectations besides `name`: any store command would panic
    let cache = cache(mock_store());
    let ctx = CallContext::new();
    ctx.cancel();

    let err = cache.pipeline_set(&ctx, CID, &messages(&[1])).await.unwrap_err();
    assert_eq!(err.error, CacheError::Cancelled);

    let err = cache.parallel_set(&ctx, CID, &messages(&[1, 2])).await.unwrap_err();
    assert_eq!(err.error, CacheError::Cancelled);
    assert_eq!(err.partial, 0);

    let err = cache.parallel_get(&ctx, CID, &[1, 2]).await.unwrap_err();
    assert_eq!(err.error, CacheError::Cancelled);
    assert!(err.partial.is_empty());
}

#[tokio::test]
async fn test_pipeline_get_round_trip_failure() {
    let mut store = mock_store();
    store
        .expect_pipeline_get()
        .times(1)
        .returning(|_| Err(CacheError::transport("broken pipe")));

    let err = cache(store)
        .pipeline_get(&CallContext::new(), CID, &[1, 2])
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
    assert!(err.partial.is_empty());
}

#[tokio::test]
async fn test_pipeline_get_short_reply_is_transport_error() {
    let mut store = mock_store();
    store
        .expect_pipeline_get()
        .returning(|_| Ok(vec![Ok(stored(1))]));

    let err = cache(store)
        .pipeline_get(&CallContext::new(), CID, &[1, 2])
        .await
        .unwrap_err();
    assert!(matches!(err.error, CacheError::Transport { .. }));
}

#[tokio::test]
async fn test_pipeline_get_per_command_failure() {
    let mut store = mock_store();
    store
        .expect_pipeline_get()
        .withf(|keys| *keys == key::encode_all(CID, &[1, 2, 3]))
        .returning(|_| {
            Ok(vec![
                Ok(stored(1)),
                Err(CacheError::transport("WRONGTYPE")),
                Ok(None),
            ])
        });

    let err = cache(store)
        .pipeline_get(&CallContext::new(), CID, &[1, 2, 3])
        .await
        .unwrap_err();
    assert_eq!(err.error, CacheError::transport("WRONGTYPE"));
    assert_eq!(err.partial.messages, messages(&[1]));
    assert_eq!(err.partial.failed_seqs, vec![2, 3]);
}

#[tokio::test]
async fn test_pipeline_get_all_missing_is_not_found() {
    let mut store = mock_store();
    store
        .expect_pipeline_get()
        .returning(|keys| Ok(keys.iter().map(|_| Ok(None)).collect()));

    let err = cache(store)
        .pipeline_get(&CallContext::new(), CID, &[7, 8])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.partial.failed_seqs, vec![7, 8]);
}

#[tokio::test]
async fn test_parallel_get_issues_one_get_per_seq() {
    let mut store = mock_store();
    store.expect_get().times(4).returning(|k| {
        let (_, seq) = key::decode(k).unwrap();
        Ok(if seq % 2 == 0 { stored(seq) } else { None })
    });

    let read = cache(store)
        .parallel_get(&CallContext::new(), CID, &[4, 3, 2, 1])
        .await
        .unwrap();
    assert_eq!(read.messages, messages(&[4, 2]));
    assert_eq!(read.failed_seqs, vec![3, 1]);
}

#[tokio::test]
async fn test_parallel_get_transport_failure_is_top_level() {
    let mut store = mock_store();
    store
        .expect_get()
        .withf(|k| k == "MESSAGE_CACHE:c1_2")
        .returning(|_| Err(CacheError::transport("timeout")));
    store.expect_get().returning(|k| Ok(stored(key::decode(k).unwrap().1)));

    let err = cache(store)
        .parallel_get(&CallContext::new(), CID, &[1, 2, 3])
        .await
        .unwrap_err();
    assert_eq!(err.error, CacheError::transport("timeout"));
    assert!(err.partial.failed_seqs.contains(&2));
    assert!(!err.partial.messages.iter().any(|m| m.seq == 2));
}

#[tokio::test]
async fn test_parallel_set_stops_at_first_failure() {
    let mut store = mock_store();
    store
        .expect_set()
        .withf(|k, _, _| k == "MESSAGE_CACHE:c1_3")
        .returning(|_, _, _| Err(CacheError::transport("OOM command not allowed")));
    store
        .expect_set()
        .withf(|_, _, ttl| *ttl == Some(Duration::from_secs(60)))
        .returning(|_, _, _| Ok(()));

    let err = cache(store)
        .parallel_set(&CallContext::new(), CID, &messages(&[0, 1, 2, 3, 4, 5]))
        .await
        .unwrap_err();
    assert_eq!(err.error, CacheError::transport("OOM command not allowed"));
    assert!(err.partial < 6);
}

#[tokio::test]
async fn test_parallel_delete_counts_existing() {
    let mut store = mock_store();
    store
        .expect_del()
        .times(3)
        .returning(|k| Ok(k != "MESSAGE_CACHE:c1_2"));

    let removed = cache(store)
        .parallel_delete(&CallContext::new(), CID, &[1, 2, 3])
        .await
        .unwrap();
    assert_eq!(removed, 2);
}

#[tokio::test]
async fn test_empty_batches_touch_nothing() {
    let cache = cache(mock_store());
    let ctx = CallContext::new();

    assert_eq!(cache.parallel_set(&ctx, CID, &[]).await.unwrap(), 0);
    assert_eq!(cache.pipeline_set(&ctx, CID, &[]).await.unwrap(), 0);
    assert!(cache.parallel_get(&ctx, CID, &[]).await.unwrap().is_empty());
    assert!(cache.pipeline_get(&ctx, CID, &[]).await.unwrap().is_empty());
    assert_eq!(cache.pipeline_delete(&ctx, CID, &[]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_strategy_selector() {
    let cache = cache(mock_store());
    for strategy in [Strategy::Parallel, Strategy::Pipeline] {
        let selected: &dyn MessageCache = cache.strategy(strategy);
        assert_eq!(selected.strategy(), strategy);
    }
}
