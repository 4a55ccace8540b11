//! Message record and its stored representation

use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One chat message as stored in the cache.
///
/// The cache only interprets `seq`; every other field is carried verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Message {
    pub send_id: String,
    pub recv_id: String,
    pub group_id: String,
    pub client_msg_id: String,
    pub server_msg_id: String,
    pub sender_platform_id: i32,
    pub sender_nickname: String,
    pub sender_face_url: String,
    pub session_type: i32,
    pub msg_from: i32,
    pub content_type: i32,
    /// Raw message body
    pub content: Vec<u8>,
    /// Position of the message within its conversation
    pub seq: i64,
    /// Epoch millis
    pub send_time: i64,
    /// Epoch millis
    pub create_time: i64,
    pub status: i32,
    pub is_read: bool,
    pub options: HashMap<String, bool>,
    pub ex: String,
}

impl Message {
    /// Minimal message with only a seq set
    pub fn with_seq(seq: i64) -> Self {
        Self {
            seq,
            ..Default::default()
        }
    }

    /// Serialize to the stored value form
    pub fn encode(&self) -> CacheResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            CacheError::serialization(format!("Failed to encode message: {}", e))
                .with_context(format!("seq {}", self.seq))
        })
    }

    /// Parse a stored value; bytes that are not UTF-8 JSON are rejected
    pub fn decode(value: &[u8]) -> CacheResult<Self> {
        serde_json::from_slice(value)
            .map_err(|e| CacheError::serialization(format!("Failed to decode message: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Message {
        let mut options = HashMap::new();
        options.insert("history".to_string(), true);
        options.insert("unreadCount".to_string(), false);
        Message {
            send_id: "u-100".to_string(),
            recv_id: "u-200".to_string(),
            group_id: String::new(),
            client_msg_id: "c1f0".to_string(),
            server_msg_id: "s9a2".to_string(),
            sender_platform_id: 1,
            sender_nickname: "alice".to_string(),
            sender_face_url: String::new(),
            session_type: 1,
            msg_from: 100,
            content_type: 101,
            content: b"hello".to_vec(),
            seq: 42,
            send_time: 1_700_000_000_000,
            create_time: 1_700_000_000_001,
            status: 2,
            is_read: false,
            options,
            ex: "{}".to_string(),
        }
    }

    #[test]
    fn test_encode_decode_preserves_fields() {
        let msg = sample();
        let decoded = Message::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_decode_tolerates_missing_fields() {
        let decoded = Message::decode(br#"{"seq": 7, "sendID": "ignored-case"}"#).unwrap();
        assert_eq!(decoded.seq, 7);
        assert_eq!(decoded.send_id, "");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = Message::decode(b"not-a-message").unwrap_err();
        assert!(matches!(err, CacheError::Serialization { .. }));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let err = Message::decode(&[b'{', 0xff, 0xfe, b'}']).unwrap_err();
        assert!(matches!(err, CacheError::Serialization { .. }));
    }
}
