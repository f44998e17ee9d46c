//! Runtime-effect dispatch for the desktop host boundary.

use crate::{
    coordinator::RuntimeEffect,
    host::{chat_effects, persistence_effects, DesktopHost},
};

pub(crate) async fn run_runtime_effect(host: &mut DesktopHost, effect: RuntimeEffect) {
    match effect {
        RuntimeEffect::PersistLayout => persistence_effects::persist_layout(host).await,
        RuntimeEffect::PersistChatCache { channel, messages } => {
            persistence_effects::persist_chat_cache(host, &channel, &messages).await;
        }
        RuntimeEffect::LoadChatCache { window_id, channel } => {
            persistence_effects::load_chat_cache(host, &window_id, &channel).await;
        }
        RuntimeEffect::PersistIdentity(username) => {
            persistence_effects::persist_identity(host, &username).await;
        }
        RuntimeEffect::OpenConnection {
            connection,
            channel,
        } => chat_effects::open(host, connection, &channel),
        RuntimeEffect::Transmit { connection, frame } => {
            chat_effects::transmit(host, connection, &frame);
        }
        RuntimeEffect::CloseConnection(connection) => {
            host.services.transport.close(connection);
        }
        RuntimeEffect::ScheduleTimer { token, delay } => {
            host.services.timers.schedule(token, delay);
        }
        RuntimeEffect::CancelTimer(token) => host.services.timers.cancel(&token),
    }
}
