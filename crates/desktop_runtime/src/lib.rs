//! Floating-pane desktop engine: window geometry and stacking, pane variants, per-window chat
//! sessions, and layout persistence behind the [`platform_host`] service contracts.

pub mod chat;
pub mod config;
pub mod coordinator;
pub mod emoji;
mod effect_executor;
pub mod geometry;
pub mod host;
pub mod model;
pub mod pane;
pub mod persistence;
pub mod timer;
pub mod window;
pub mod window_manager;

pub use config::{ChatConfig, DesktopConfig, PopupConfig};
pub use coordinator::{Coordinator, DesktopError, RuntimeEffect, TimerToken};
pub use host::{DesktopHost, DesktopServices};
pub use model::*;
pub use pane::{Pane, TimedPopup};
pub use timer::{CountdownTimer, TimerError, TimerEvent};
pub use window::{Interaction, WindowEntity, WindowEvent};
pub use window_manager::ManagedWindow;
