//! Command implementations

pub mod config;
pub mod delete;
pub mod probe;
pub mod read;
pub mod write;

use imcache_core::cache::store;
use imcache_core::{CacheConfig, CacheResult, KvStore, Message, MsgCache};
use std::collections::HashMap;

/// Cache over whichever store the configuration selects
pub type DynCache = MsgCache<dyn KvStore>;

/// Connect to the configured store and wrap it in a cache
pub async fn open_cache(config: &CacheConfig) -> CacheResult<DynCache> {
    let store = store::connect(config).await?;
    Ok(MsgCache::from_config(store, config))
}

/// Synthetic chat message used by `write` and `probe`
pub fn synthetic_message(conversation_id: &str, seq: i64) -> Message {
    let now = chrono::Utc::now().timestamp_millis();
    let mut options = HashMap::new();
    options.insert("history".to_string(), true);
    options.insert("persistent".to_string(), true);

    Message {
        send_id: "imcache-cli".to_string(),
        recv_id: conversation_id.to_string(),
        client_msg_id: uuid::Uuid::new_v4().simple().to_string(),
        server_msg_id: uuid::Uuid::new_v4().simple().to_string(),
        sender_platform_id: 1,
        sender_nickname: "imcache".to_string(),
        session_type: 1,
        msg_from: 100,
        content_type: 101,
        content: format!("synthetic message {} of {}", seq, conversation_id).into_bytes(),
        seq,
        send_time: now,
        create_time: now,
        options,
        ..Default::default()
    }
}

/// Printable body of a message
pub fn content_preview(message: &Message, max_chars: usize) -> String {
    let text = String::from_utf8_lossy(&message.content);
    if text.chars().count() <= max_chars {
        text.into_owned()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{}…", truncated)
    }
}
