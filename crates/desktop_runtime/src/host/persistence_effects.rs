use crate::{chat::ChatMessage, host::DesktopHost, model::WindowId, persistence};

pub(super) async fn persist_layout(host: &DesktopHost) {
    let snapshot = host.coordinator.snapshot();
    let store = host.services.store.as_ref();
    if let Err(err) = persistence::persist_desktop_snapshot(store, &snapshot).await {
        tracing::warn!("persist layout failed: {err}");
    }
}

pub(super) async fn persist_chat_cache(host: &DesktopHost, channel: &str, messages: &[ChatMessage]) {
    let store = host.services.store.as_ref();
    if let Err(err) = persistence::persist_chat_cache(store, channel, messages).await {
        tracing::warn!(%channel, "persist chat cache failed: {err}");
    }
}

pub(super) async fn load_chat_cache(host: &mut DesktopHost, window_id: &WindowId, channel: &str) {
    let messages = persistence::load_chat_cache(host.services.store.as_ref(), channel).await;
    host.coordinator
        .chat_cache_loaded(window_id, channel, messages);
}

pub(super) async fn persist_identity(host: &DesktopHost, username: &str) {
    let store = host.services.store.as_ref();
    if let Err(err) = persistence::persist_identity(store, username).await {
        tracing::warn!("persist identity failed: {err}");
    }
}
