//! Typed host-boundary contracts shared by the desktop runtime and its hosts.
//!
//! This crate is the API-first boundary for platform services consumed by the runtime: a
//! key-value blob store, a bidirectional chat transport, a timer facility, and the local
//! display identity. Each contract ships with a no-op or in-memory adapter so runtimes can be
//! exercised headlessly.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod identity;
pub mod storage;
pub mod timer;
pub mod transport;

pub use identity::{anonymous_username, IdentityProvider, MemoryIdentity};
pub use storage::{
    load_typed_with, save_typed_with, KvStore, KvStoreFuture, MemoryKvStore, NoopKvStore,
};
pub use timer::{ManualTimerService, TimerService};
pub use transport::{
    ChatTransport, ConnectionId, MemoryChatTransport, NoopChatTransport, TransportCall,
};
