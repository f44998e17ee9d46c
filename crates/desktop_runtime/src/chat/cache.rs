//! Per-channel message cache selection and keys.

use super::protocol::ChatMessage;

const CACHE_KEY_PREFIX: &str = "chat-messages-";

/// Store key holding the cached messages of `channel`.
pub fn cache_key(channel: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{channel}")
}

/// The last `capacity` cacheable messages of `log`, oldest first.
pub fn cacheable_tail<'a>(
    log: impl IntoIterator<Item = &'a ChatMessage>,
    capacity: usize,
) -> Vec<ChatMessage> {
    let cacheable = log
        .into_iter()
        .filter(|message| message.is_cacheable())
        .cloned()
        .collect::<Vec<_>>();
    let overflow = cacheable.len().saturating_sub(capacity);
    cacheable.into_iter().skip(overflow).collect()
}
