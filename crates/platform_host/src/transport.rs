//! Bidirectional message-transport contract used by chat panes.
//!
//! The transport is fire-and-forget at this boundary: `open`, `send` and `close` return
//! immediately and the host reports open/message/close events back to the runtime tagged
//! with the [`ConnectionId`] they belong to.

use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Identifier of one transport connection attempt.
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Host service that opens, writes to, and closes message connections.
pub trait ChatTransport {
    /// Starts opening `connection` against `endpoint` for `channel`.
    ///
    /// # Errors
    ///
    /// Returns an error when the attempt cannot even be started; the caller treats that as
    /// an immediate close.
    fn open(&self, connection: ConnectionId, endpoint: &str, channel: &str) -> Result<(), String>;

    /// Writes one text frame on `connection`.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection is unknown or not writable.
    fn send(&self, connection: ConnectionId, frame: &str) -> Result<(), String>;

    /// Closes `connection`. Closing an unknown connection is a no-op.
    fn close(&self, connection: ConnectionId);
}

#[derive(Debug, Clone, Copy, Default)]
/// Transport that accepts every call and never delivers anything.
pub struct NoopChatTransport;

impl ChatTransport for NoopChatTransport {
    fn open(&self, _connection: ConnectionId, _endpoint: &str, _channel: &str) -> Result<(), String> {
        Ok(())
    }

    fn send(&self, _connection: ConnectionId, _frame: &str) -> Result<(), String> {
        Ok(())
    }

    fn close(&self, _connection: ConnectionId) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One call observed by [`MemoryChatTransport`].
pub enum TransportCall {
    /// `open` was called.
    Open {
        /// Connection being opened.
        connection: ConnectionId,
        /// Endpoint address.
        endpoint: String,
        /// Channel context for the connection.
        channel: String,
    },
    /// `send` was called.
    Send {
        /// Connection written to.
        connection: ConnectionId,
        /// Raw frame text.
        frame: String,
    },
    /// `close` was called.
    Close {
        /// Connection closed.
        connection: ConnectionId,
    },
}

#[derive(Debug, Default)]
struct MemoryTransportInner {
    calls: Vec<TransportCall>,
    refuse_open: bool,
}

#[derive(Debug, Clone, Default)]
/// Recording transport for tests and headless hosts. Clones share the same call log.
pub struct MemoryChatTransport {
    inner: Rc<RefCell<MemoryTransportInner>>,
}

impl MemoryChatTransport {
    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.inner.borrow().calls.clone()
    }

    /// Frames sent on any connection, in order.
    pub fn sent_frames(&self) -> Vec<String> {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                TransportCall::Send { frame, .. } => Some(frame.clone()),
                _ => None,
            })
            .collect()
    }

    /// Connections that were opened, in order.
    pub fn opened(&self) -> Vec<ConnectionId> {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                TransportCall::Open { connection, .. } => Some(*connection),
                _ => None,
            })
            .collect()
    }

    /// Makes subsequent `open` calls fail, simulating an unreachable endpoint.
    pub fn set_refuse_open(&self, refuse: bool) {
        self.inner.borrow_mut().refuse_open = refuse;
    }

    /// Forgets recorded calls.
    pub fn clear(&self) {
        self.inner.borrow_mut().calls.clear();
    }
}

impl ChatTransport for MemoryChatTransport {
    fn open(&self, connection: ConnectionId, endpoint: &str, channel: &str) -> Result<(), String> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(TransportCall::Open {
            connection,
            endpoint: endpoint.to_string(),
            channel: channel.to_string(),
        });
        if inner.refuse_open {
            return Err(format!("endpoint {endpoint} refused {connection}"));
        }
        Ok(())
    }

    fn send(&self, connection: ConnectionId, frame: &str) -> Result<(), String> {
        self.inner.borrow_mut().calls.push(TransportCall::Send {
            connection,
            frame: frame.to_string(),
        });
        Ok(())
    }

    fn close(&self, connection: ConnectionId) {
        self.inner
            .borrow_mut()
            .calls
            .push(TransportCall::Close { connection });
    }
}
