//! Desktop runtime persistence adapters over the host blob store.

use platform_host::{load_typed_with, save_typed_with, KvStore};

use crate::{
    chat::{cache_key, ChatMessage},
    config::DesktopConfig,
    model::DesktopSnapshot,
};

pub const DESKTOP_SNAPSHOT_KEY: &str = "windowEnvironmentState";
pub const IDENTITY_KEY: &str = "chat-username";
pub const CONFIG_KEY: &str = "webdesk.config.v1";

/// Loads the stored runtime configuration, falling back to defaults.
pub async fn load_desktop_config<S: KvStore + ?Sized>(store: &S) -> DesktopConfig {
    match load_typed_with::<S, DesktopConfig>(store, CONFIG_KEY).await {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            tracing::warn!("desktop config load failed: {err}");
            DesktopConfig::default()
        }
    }
}

/// Loads the raw desktop snapshot blob. Parsing is left to the coordinator restore path.
pub async fn load_desktop_snapshot<S: KvStore + ?Sized>(store: &S) -> Option<String> {
    match store.load_blob(DESKTOP_SNAPSHOT_KEY).await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!("desktop snapshot load failed: {err}");
            None
        }
    }
}

pub async fn persist_desktop_snapshot<S: KvStore + ?Sized>(
    store: &S,
    snapshot: &DesktopSnapshot,
) -> Result<(), String> {
    save_typed_with(store, DESKTOP_SNAPSHOT_KEY, snapshot).await
}

/// Forgets the saved desktop layout.
pub async fn clear_saved_state<S: KvStore + ?Sized>(store: &S) -> Result<(), String> {
    store.delete_blob(DESKTOP_SNAPSHOT_KEY).await
}

/// Loads a channel's cached messages. A missing or unreadable cache is empty.
pub async fn load_chat_cache<S: KvStore + ?Sized>(store: &S, channel: &str) -> Vec<ChatMessage> {
    match load_typed_with::<S, Vec<ChatMessage>>(store, &cache_key(channel)).await {
        Ok(messages) => messages.unwrap_or_default(),
        Err(err) => {
            tracing::warn!(%channel, "chat cache load failed: {err}");
            Vec::new()
        }
    }
}

pub async fn persist_chat_cache<S: KvStore + ?Sized>(
    store: &S,
    channel: &str,
    messages: &[ChatMessage],
) -> Result<(), String> {
    save_typed_with(store, &cache_key(channel), messages).await
}

/// Stored display name. The value is kept as a bare string.
pub async fn load_identity<S: KvStore + ?Sized>(store: &S) -> Option<String> {
    match store.load_blob(IDENTITY_KEY).await {
        Ok(raw) => raw.filter(|name| !name.trim().is_empty()),
        Err(err) => {
            tracing::warn!("identity load failed: {err}");
            None
        }
    }
}

pub async fn persist_identity<S: KvStore + ?Sized>(store: &S, username: &str) -> Result<(), String> {
    store.save_blob(IDENTITY_KEY, username).await
}
