//! Cache key codec
//!
//! Maps `(conversation_id, seq)` to the key of its cache entry. Keys are
//! recomputed on every call and never stored, so the format must stay stable
//! across releases and processes.

/// Namespace prefix shared by every message entry
pub const MESSAGE_CACHE_PREFIX: &str = "MESSAGE_CACHE:";

const SEQ_SEPARATOR: char = '_';

/// Encode the cache key of one message.
///
/// The seq is rendered in base 10 after the last `_`. A rendered `i64` never
/// contains `_`, so splitting at the last separator recovers both parts and
/// two different pairs can never produce the same key.
pub fn encode(conversation_id: &str, seq: i64) -> String {
    let mut key = String::with_capacity(MESSAGE_CACHE_PREFIX.len() + conversation_id.len() + 21);
    key.push_str(MESSAGE_CACHE_PREFIX);
    key.push_str(conversation_id);
    key.push(SEQ_SEPARATOR);
    key.push_str(&seq.to_string());
    key
}

/// Encode the keys of a batch of seqs, preserving order
pub fn encode_all(conversation_id: &str, seqs: &[i64]) -> Vec<String> {
    seqs.iter().map(|&seq| encode(conversation_id, seq)).collect()
}

/// Inverse of [`encode`]. Returns `None` for keys outside the message namespace.
pub fn decode(key: &str) -> Option<(String, i64)> {
    let rest = key.strip_prefix(MESSAGE_CACHE_PREFIX)?;
    let (conversation_id, seq) = rest.rsplit_once(SEQ_SEPARATOR)?;
    let seq = seq.parse::<i64>().ok()?;
    Some((conversation_id.to_string(), seq))
}
