//! Per-window chat sessions: wire protocol, message rendering fragments, cache selection and
//! the connection state machine.

mod cache;
mod content;
mod protocol;
mod session;

pub use cache::{cache_key, cacheable_tail};
pub use content::{parse_message_content, MessageFragment};
pub use protocol::{
    decode_frame, ChatError, ChatMessage, MessageType, OutboundMessage, SYSTEM_USERNAME,
};
pub use session::{
    ChatEffect, ChatSession, ConnectionState, CONNECTED_NOTICE, DISCONNECTED_NOTICE,
};
