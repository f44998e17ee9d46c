//! Chat wire frames and log entries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Username carried by locally generated status messages.
pub const SYSTEM_USERNAME: &str = "System";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("chat frame decode failed: {0}")]
    Decode(String),
    #[error("chat frame encode failed: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Message,
    System,
    Heartbeat,
}

/// Inbound frame and log entry shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl ChatMessage {
    pub fn user(
        username: impl Into<String>,
        data: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            kind: MessageType::Message,
            username: username.into(),
            data: data.into(),
            channel: Some(channel.into()),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            kind: MessageType::System,
            username: SYSTEM_USERNAME.to_string(),
            data: text.into(),
            channel: None,
        }
    }

    /// Whether this entry belongs in the persisted channel cache.
    pub fn is_cacheable(&self) -> bool {
        self.kind == MessageType::Message && self.username != SYSTEM_USERNAME
    }
}

/// Outbound frame. `key` is a reserved authentication slot and is always empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    #[serde(rename = "type")]
    kind: MessageType,
    pub data: String,
    pub username: String,
    pub channel: String,
    key: String,
}

impl OutboundMessage {
    pub fn new(
        data: impl Into<String>,
        username: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            kind: MessageType::Message,
            data: data.into(),
            username: username.into(),
            channel: channel.into(),
            key: String::new(),
        }
    }

    /// # Errors
    ///
    /// Returns [`ChatError::Encode`] when JSON serialization fails.
    pub fn encode(&self) -> Result<String, ChatError> {
        serde_json::to_string(self).map_err(|e| ChatError::Encode(e.to_string()))
    }
}

/// Decodes one inbound text frame.
///
/// # Errors
///
/// Returns [`ChatError::Decode`] for malformed JSON or an unknown `type`.
pub fn decode_frame(raw: &str) -> Result<ChatMessage, ChatError> {
    serde_json::from_str(raw).map_err(|e| ChatError::Decode(e.to_string()))
}
