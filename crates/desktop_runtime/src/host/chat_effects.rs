use platform_host::ConnectionId;

use crate::host::DesktopHost;

/// Starts opening a chat connection. A refused attempt is treated as an immediate close.
pub(super) fn open(host: &mut DesktopHost, connection: ConnectionId, channel: &str) {
    let endpoint = host.coordinator.config().chat.endpoint.clone();
    if let Err(err) = host.services.transport.open(connection, &endpoint, channel) {
        tracing::warn!(%connection, "chat connect failed: {err}");
        host.coordinator.transport_closed(connection);
    }
}

pub(super) fn transmit(host: &DesktopHost, connection: ConnectionId, frame: &str) {
    if let Err(err) = host.services.transport.send(connection, frame) {
        tracing::warn!(%connection, "chat send failed: {err}");
    }
}
