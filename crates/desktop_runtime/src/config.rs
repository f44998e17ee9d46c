//! Runtime configuration with serde defaults.
//!
//! Every field has a default so partial JSON documents stored by older builds still load.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::{SizeFloor, MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH};

pub const DEFAULT_Z_INDEX_BASE: i32 = 1000;
pub const DEFAULT_CHAT_ENDPOINT: &str = "ws://localhost:8080/chat";
pub const DEFAULT_CHAT_CHANNEL: &str = "general";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    pub z_index_base: i32,
    pub min_width: i32,
    pub min_height: i32,
    pub restore_on_boot: bool,
    pub chat: ChatConfig,
    pub popup: PopupConfig,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            z_index_base: DEFAULT_Z_INDEX_BASE,
            min_width: MIN_WINDOW_WIDTH,
            min_height: MIN_WINDOW_HEIGHT,
            restore_on_boot: true,
            chat: ChatConfig::default(),
            popup: PopupConfig::default(),
        }
    }
}

impl DesktopConfig {
    pub fn size_floor(&self) -> SizeFloor {
        SizeFloor {
            width: self.min_width.max(1),
            height: self.min_height.max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub endpoint: String,
    pub default_channel: String,
    pub reconnect_delay_ms: u64,
    /// Messages kept in a session's in-memory log.
    pub log_capacity: usize,
    /// User messages kept in the persisted per-channel cache.
    pub cache_capacity: usize,
    /// Frames held while the connection is down.
    pub outbox_capacity: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            default_channel: DEFAULT_CHAT_CHANNEL.to_string(),
            reconnect_delay_ms: 5_000,
            log_capacity: 50,
            cache_capacity: 50,
            outbox_capacity: 50,
        }
    }
}

impl ChatConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    pub duration_secs: u32,
    pub tick_ms: u64,
    pub fade_ms: u64,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            duration_secs: 15,
            tick_ms: 100,
            fade_ms: 500,
        }
    }
}

impl PopupConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration_secs))
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }
}
