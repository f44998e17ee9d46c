//! Chat session state machine.
//!
//! A [`ChatSession`] never touches a socket, store, or clock. Each operation updates the
//! session and returns the [`ChatEffect`]s the host must perform. Transport events are tagged
//! with the [`ConnectionId`] they belong to so callbacks from a superseded connection are
//! ignored.

use std::collections::VecDeque;
use std::time::Duration;

use platform_host::ConnectionId;

use super::cache::cacheable_tail;
use super::protocol::{decode_frame, ChatError, ChatMessage, MessageType, OutboundMessage};
use crate::config::ChatConfig;

pub const CONNECTED_NOTICE: &str = "Connected to chat server";
pub const DISCONNECTED_NOTICE: &str = "Disconnected from chat server";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection has been requested yet.
    Idle,
    Connecting,
    Open,
    ClosedPendingRetry,
    Destroyed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEffect {
    Open {
        connection: ConnectionId,
        channel: String,
    },
    Transmit {
        connection: ConnectionId,
        frame: String,
    },
    Close {
        connection: ConnectionId,
    },
    ScheduleReconnect {
        after: ConnectionId,
        delay: Duration,
    },
    CancelReconnect {
        after: ConnectionId,
    },
    /// Reconnect right away instead of waiting for the scheduled retry.
    ReconnectNow {
        after: ConnectionId,
    },
    LoadCache {
        channel: String,
    },
    PersistCache {
        channel: String,
        messages: Vec<ChatMessage>,
    },
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    config: ChatConfig,
    channel: String,
    log: VecDeque<ChatMessage>,
    state: ConnectionState,
    connection: Option<ConnectionId>,
    input: String,
    /// Cursor position in chars.
    cursor: usize,
    outbox: VecDeque<String>,
}

impl ChatSession {
    pub fn new(channel: impl Into<String>, config: ChatConfig) -> Self {
        Self {
            config,
            channel: channel.into(),
            log: VecDeque::new(),
            state: ConnectionState::Idle,
            connection: None,
            input: String::new(),
            cursor: 0,
            outbox: VecDeque::new(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn title(&self) -> String {
        format!("Chat - {}", self.channel)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == ConnectionState::Destroyed
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.log.iter()
    }

    pub fn message_count(&self) -> usize {
        self.log.len()
    }

    pub fn outbox_len(&self) -> usize {
        self.outbox.len()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// First connection: hydrate the cache and open the socket.
    pub fn start(&mut self, connection: ConnectionId) -> Vec<ChatEffect> {
        if self.state != ConnectionState::Idle {
            return Vec::new();
        }
        let mut effects = vec![ChatEffect::LoadCache {
            channel: self.channel.clone(),
        }];
        effects.extend(self.connect(connection));
        effects
    }

    fn connect(&mut self, connection: ConnectionId) -> Vec<ChatEffect> {
        self.connection = Some(connection);
        self.state = ConnectionState::Connecting;
        vec![ChatEffect::Open {
            connection,
            channel: self.channel.clone(),
        }]
    }

    fn is_current(&self, connection: ConnectionId) -> bool {
        !self.is_destroyed() && self.connection == Some(connection)
    }

    pub fn on_open(&mut self, connection: ConnectionId) -> Vec<ChatEffect> {
        if !self.is_current(connection) || self.state != ConnectionState::Connecting {
            tracing::debug!(%connection, "ignoring open for stale chat connection");
            return Vec::new();
        }
        self.state = ConnectionState::Open;
        self.push(ChatMessage::system(CONNECTED_NOTICE));
        self.outbox
            .drain(..)
            .map(|frame| ChatEffect::Transmit { connection, frame })
            .collect()
    }

    /// Handles one inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Decode`] for malformed frames; the session is unchanged.
    pub fn on_frame(
        &mut self,
        connection: ConnectionId,
        raw: &str,
    ) -> Result<Vec<ChatEffect>, ChatError> {
        if !self.is_current(connection) {
            return Ok(Vec::new());
        }
        let message = decode_frame(raw)?;
        Ok(self.receive(message))
    }

    /// Appends an already-decoded message. Heartbeats are dropped.
    pub fn receive(&mut self, message: ChatMessage) -> Vec<ChatEffect> {
        if self.is_destroyed() || message.kind == MessageType::Heartbeat {
            return Vec::new();
        }
        let cacheable = message.is_cacheable();
        self.push(message);
        if cacheable {
            vec![self.persist_effect()]
        } else {
            Vec::new()
        }
    }

    pub fn on_close(&mut self, connection: ConnectionId) -> Vec<ChatEffect> {
        if !self.is_current(connection) || self.state == ConnectionState::ClosedPendingRetry {
            return Vec::new();
        }
        self.state = ConnectionState::ClosedPendingRetry;
        self.push(ChatMessage::system(DISCONNECTED_NOTICE));
        vec![ChatEffect::ScheduleReconnect {
            after: connection,
            delay: self.config.reconnect_delay(),
        }]
    }

    /// Retry timer for the connection `after` fired. Opens `fresh` unless the retry is stale.
    pub fn reconnect_due(&mut self, after: ConnectionId, fresh: ConnectionId) -> Vec<ChatEffect> {
        if !self.is_current(after) || self.state != ConnectionState::ClosedPendingRetry {
            return Vec::new();
        }
        self.connect(fresh)
    }

    /// Sends `text` as `username`, or queues it while the connection is down. Clears the input.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Encode`] when the outbound frame cannot be serialized.
    pub fn send(&mut self, text: &str, username: &str) -> Result<Vec<ChatEffect>, ChatError> {
        let text = text.trim();
        if text.is_empty() || self.is_destroyed() {
            return Ok(Vec::new());
        }
        let frame = OutboundMessage::new(text, username, self.channel.as_str()).encode()?;
        self.input.clear();
        self.cursor = 0;

        match (self.state, self.connection) {
            (ConnectionState::Open, Some(connection)) => {
                Ok(vec![ChatEffect::Transmit { connection, frame }])
            }
            (state, connection) => {
                if self.outbox.len() >= self.config.outbox_capacity {
                    self.outbox.pop_front();
                    tracing::warn!(channel = %self.channel, "chat outbox full; dropped oldest frame");
                }
                if self.config.outbox_capacity > 0 {
                    self.outbox.push_back(frame);
                }
                match (state, connection) {
                    (ConnectionState::ClosedPendingRetry, Some(after)) => {
                        Ok(vec![ChatEffect::ReconnectNow { after }])
                    }
                    _ => Ok(Vec::new()),
                }
            }
        }
    }

    /// Sends the input buffer.
    ///
    /// # Errors
    ///
    /// See [`ChatSession::send`].
    pub fn send_input(&mut self, username: &str) -> Result<Vec<ChatEffect>, ChatError> {
        let text = self.input.clone();
        self.send(&text, username)
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        self.cursor = self.input.chars().count();
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.input.chars().count());
    }

    /// Inserts `text` at the cursor and moves the cursor past it.
    pub fn insert_at_cursor(&mut self, text: &str) {
        let byte_index = self
            .input
            .char_indices()
            .nth(self.cursor)
            .map_or(self.input.len(), |(index, _)| index);
        self.input.insert_str(byte_index, text);
        self.cursor += text.chars().count();
    }

    /// Moves the session to `channel` over the `fresh` connection.
    pub fn switch_channel(&mut self, channel: &str, fresh: ConnectionId) -> Vec<ChatEffect> {
        if self.is_destroyed() || channel.is_empty() || channel == self.channel {
            return Vec::new();
        }
        let mut effects = self.release_connection();
        self.channel = channel.to_string();
        self.log.clear();
        self.push(ChatMessage::system(format!("Switched to channel: {channel}")));
        effects.push(ChatEffect::LoadCache {
            channel: self.channel.clone(),
        });
        effects.extend(self.connect(fresh));
        effects
    }

    /// Merges cached history for `channel` ahead of anything received live.
    pub fn apply_cache(&mut self, channel: &str, cached: Vec<ChatMessage>) {
        if channel != self.channel || self.is_destroyed() || cached.is_empty() {
            return;
        }
        let live = std::mem::take(&mut self.log);
        self.log = cached.into_iter().chain(live).collect();
        self.evict();
    }

    /// Rewrites authorship of `old` messages to `new` and re-persists the cache.
    pub fn rename_user(&mut self, old: &str, new: &str) -> Vec<ChatEffect> {
        if old.is_empty() || new.is_empty() || old == new || self.is_destroyed() {
            return Vec::new();
        }
        let mut changed = false;
        for message in self.log.iter_mut().filter(|m| m.username == old) {
            message.username = new.to_string();
            changed = true;
        }
        if changed {
            vec![self.persist_effect()]
        } else {
            Vec::new()
        }
    }

    /// Closes the connection and cancels any pending retry. Later events are ignored.
    pub fn destroy(&mut self) -> Vec<ChatEffect> {
        if self.is_destroyed() {
            return Vec::new();
        }
        let effects = self.release_connection();
        self.state = ConnectionState::Destroyed;
        self.outbox.clear();
        effects
    }

    fn release_connection(&mut self) -> Vec<ChatEffect> {
        let Some(connection) = self.connection else {
            return Vec::new();
        };
        match self.state {
            ConnectionState::Connecting | ConnectionState::Open => {
                vec![ChatEffect::Close { connection }]
            }
            ConnectionState::ClosedPendingRetry => {
                vec![ChatEffect::CancelReconnect { after: connection }]
            }
            ConnectionState::Idle | ConnectionState::Destroyed => Vec::new(),
        }
    }

    fn push(&mut self, message: ChatMessage) {
        self.log.push_back(message);
        self.evict();
    }

    fn evict(&mut self) {
        while self.log.len() > self.config.log_capacity {
            self.log.pop_front();
        }
    }

    fn persist_effect(&self) -> ChatEffect {
        ChatEffect::PersistCache {
            channel: self.channel.clone(),
            messages: cacheable_tail(&self.log, self.config.cache_capacity),
        }
    }
}
