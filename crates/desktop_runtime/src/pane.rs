//! Pane variants hosted inside desktop windows and the factory that builds them.

use std::time::Duration;

use crate::{
    chat::ChatSession,
    config::DesktopConfig,
    emoji::EmojiPicker,
    model::{PaneKind, WindowConfig, WindowSnapshot},
    timer::{CountdownTimer, TimerEvent},
};

/// Popup that closes itself after a countdown and a short fade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedPopup {
    content: String,
    timer: CountdownTimer,
    fading: bool,
}

impl TimedPopup {
    pub fn new(content: impl Into<String>, duration: Duration) -> Self {
        let mut timer = CountdownTimer::new();
        if let Err(err) = timer.start(duration) {
            tracing::warn!("popup countdown start failed: {err}");
        }
        Self {
            content: content.into(),
            timer,
            fading: false,
        }
    }

    /// A popup whose countdown already ran out; it only has its fade left.
    pub fn expired(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            timer: CountdownTimer::new(),
            fading: true,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn remaining_secs(&self) -> u32 {
        self.timer.remaining_secs()
    }

    pub fn is_counting(&self) -> bool {
        self.timer.is_running()
    }

    pub fn is_fading(&self) -> bool {
        self.fading
    }

    pub fn is_paused(&self) -> bool {
        self.timer.is_paused()
    }

    pub fn title(&self) -> String {
        format!("Closing in {}s", self.remaining_secs())
    }

    pub fn pause(&mut self) {
        self.timer.pause();
    }

    pub fn resume(&mut self) {
        self.timer.resume();
    }

    /// Advances the countdown. Completion switches the popup into its fade.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<TimerEvent> {
        let events = self.timer.advance(elapsed);
        if events.contains(&TimerEvent::Completed) {
            self.fading = true;
        }
        events
    }
}

#[derive(Debug, Clone)]
pub enum Pane {
    Window { content: String },
    Chat(ChatSession),
    Popup(TimedPopup),
    EmojiPicker(EmojiPicker),
}

impl Pane {
    /// Builds the pane for a creation request.
    ///
    /// Restored popups resume from their saved countdown; one saved with nothing left goes
    /// straight to its fade.
    pub fn build(request: &WindowConfig, config: &DesktopConfig) -> Self {
        match request.kind {
            PaneKind::Window => Self::Window {
                content: request.content.clone(),
            },
            PaneKind::Chat => {
                let channel = request
                    .channel
                    .clone()
                    .filter(|channel| !channel.is_empty())
                    .unwrap_or_else(|| config.chat.default_channel.clone());
                Self::Chat(ChatSession::new(channel, config.chat.clone()))
            }
            PaneKind::Popup => {
                let content = request.content.clone();
                match request.saved.as_ref().and_then(|saved| saved.remaining_secs) {
                    Some(0) => Self::Popup(TimedPopup::expired(content)),
                    Some(secs) => Self::Popup(TimedPopup::new(
                        content,
                        Duration::from_secs(u64::from(secs)),
                    )),
                    None => Self::Popup(TimedPopup::new(content, config.popup.duration())),
                }
            }
            PaneKind::EmojiPicker => Self::EmojiPicker(EmojiPicker::new()),
        }
    }

    pub fn kind(&self) -> PaneKind {
        match self {
            Self::Window { .. } => PaneKind::Window,
            Self::Chat(_) => PaneKind::Chat,
            Self::Popup(_) => PaneKind::Popup,
            Self::EmojiPicker(_) => PaneKind::EmojiPicker,
        }
    }

    /// Title the pane dictates, if any. Base windows keep the requested title.
    pub fn managed_title(&self) -> Option<String> {
        match self {
            Self::Chat(session) => Some(session.title()),
            Self::Popup(popup) => Some(popup.title()),
            Self::Window { .. } | Self::EmojiPicker(_) => None,
        }
    }

    /// Fills the kind-specific snapshot payload.
    pub fn write_payload(&self, snapshot: &mut WindowSnapshot) {
        match self {
            Self::Window { content } => snapshot.content = content.clone(),
            Self::Chat(session) => snapshot.channel = Some(session.channel().to_string()),
            Self::Popup(popup) => {
                snapshot.content = popup.content().to_string();
                snapshot.remaining_secs = Some(popup.remaining_secs());
            }
            Self::EmojiPicker(_) => {}
        }
    }

    pub fn as_chat(&self) -> Option<&ChatSession> {
        match self {
            Self::Chat(session) => Some(session),
            _ => None,
        }
    }

    pub fn as_chat_mut(&mut self) -> Option<&mut ChatSession> {
        match self {
            Self::Chat(session) => Some(session),
            _ => None,
        }
    }

    pub fn as_popup_mut(&mut self) -> Option<&mut TimedPopup> {
        match self {
            Self::Popup(popup) => Some(popup),
            _ => None,
        }
    }

    pub fn as_emoji_picker_mut(&mut self) -> Option<&mut EmojiPicker> {
        match self {
            Self::EmojiPicker(picker) => Some(picker),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::WindowId;

    #[test]
    fn factory_builds_each_kind() {
        let config = DesktopConfig::default();
        for kind in [
            PaneKind::Window,
            PaneKind::Chat,
            PaneKind::Popup,
            PaneKind::EmojiPicker,
        ] {
            assert_eq!(Pane::build(&WindowConfig::new(kind), &config).kind(), kind);
        }
    }

    #[test]
    fn chat_falls_back_to_default_channel() {
        let pane = Pane::build(
            &WindowConfig::new(PaneKind::Chat).with_channel(""),
            &DesktopConfig::default(),
        );
        assert_eq!(pane.as_chat().map(ChatSession::channel), Some("general"));
        assert_eq!(pane.managed_title(), Some("Chat - general".to_string()));
    }

    #[test]
    fn popup_counts_down_then_fades() {
        let mut popup = TimedPopup::new("bye", Duration::from_secs(2));
        assert_eq!(popup.title(), "Closing in 2s");
        popup.advance(Duration::from_millis(1100));
        assert_eq!(popup.title(), "Closing in 1s");
        assert!(!popup.is_fading());
        let events = popup.advance(Duration::from_secs(1));
        assert_eq!(events, vec![TimerEvent::Tick(0), TimerEvent::Completed]);
        assert!(popup.is_fading());
    }

    #[test]
    fn restored_popup_resumes_saved_countdown() {
        let saved = WindowSnapshot {
            id: WindowId::new("p1"),
            kind: PaneKind::Popup,
            title: "Closing in 4s".to_string(),
            content: "note".to_string(),
            x: 0,
            y: 0,
            width: 300,
            height: 200,
            minimized: false,
            z_index: 1000,
            channel: None,
            remaining_secs: Some(4),
        };
        let pane = Pane::build(&WindowConfig::from_snapshot(saved.clone()), &DesktopConfig::default());
        let mut snapshot = WindowSnapshot {
            content: String::new(),
            remaining_secs: None,
            ..saved
        };
        pane.write_payload(&mut snapshot);
        assert_eq!(snapshot.content, "note");
        assert_eq!(snapshot.remaining_secs, Some(4));
    }

    #[test]
    fn popup_saved_with_no_time_left_restores_fading() {
        let saved = WindowSnapshot {
            id: WindowId::new("p2"),
            kind: PaneKind::Popup,
            title: "Closing in 0s".to_string(),
            content: "done".to_string(),
            x: 0,
            y: 0,
            width: 300,
            height: 200,
            minimized: false,
            z_index: 1000,
            channel: None,
            remaining_secs: Some(0),
        };
        let mut pane = Pane::build(&WindowConfig::from_snapshot(saved), &DesktopConfig::default());
        let popup = pane.as_popup_mut().expect("popup");
        assert!(popup.is_fading());
        assert!(!popup.is_counting());
        assert_eq!(popup.title(), "Closing in 0s");
        assert_eq!(popup.advance(Duration::from_secs(1)), Vec::new());
    }
}
