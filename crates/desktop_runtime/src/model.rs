use serde::{Deserialize, Serialize};

pub const DEFAULT_VIEWPORT_WIDTH: i32 = 1280;
pub const DEFAULT_VIEWPORT_HEIGHT: i32 = 720;

const EMOJI_PICKER_PREFIX: &str = "emoji-";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(String);

impl WindowId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Allocates a fresh random (UUID v4) id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Id of the emoji picker paired with the chat window `chat`.
    pub fn emoji_picker_for(chat: &WindowId) -> Self {
        Self(format!("{EMOJI_PICKER_PREFIX}{}", chat.0))
    }

    /// For an emoji picker id, the chat window it belongs to.
    pub fn paired_chat(&self) -> Option<WindowId> {
        self.0
            .strip_prefix(EMOJI_PICKER_PREFIX)
            .filter(|chat| !chat.is_empty())
            .map(WindowId::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl WindowRect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..self
        }
    }

    pub fn right(self) -> i32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(self) -> i32 {
        self.y.saturating_add(self.h)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

impl PointerPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Resize handle, named by compass point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResizeEdge {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl ResizeEdge {
    pub const ALL: [ResizeEdge; 8] = [
        Self::NorthWest,
        Self::North,
        Self::NorthEast,
        Self::West,
        Self::East,
        Self::SouthWest,
        Self::South,
        Self::SouthEast,
    ];

    /// Direction vector `(dx, dy)` with components in `{-1, 0, 1}`.
    pub const fn direction(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
            Self::NorthEast => (1, -1),
            Self::NorthWest => (-1, -1),
            Self::SouthEast => (1, 1),
            Self::SouthWest => (-1, 1),
        }
    }

    pub fn from_direction(dx: i32, dy: i32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|edge| edge.direction() == (dx.signum(), dy.signum()))
    }
}

/// Closed set of pane kinds the desktop can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaneKind {
    Window,
    Chat,
    Popup,
    EmojiPicker,
}

impl PaneKind {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Chat => "chat",
            Self::Popup => "popup",
            Self::EmojiPicker => "emoji-picker",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "window" => Some(Self::Window),
            "chat" => Some(Self::Chat),
            "popup" => Some(Self::Popup),
            "emoji-picker" => Some(Self::EmojiPicker),
            _ => None,
        }
    }

    /// Default `(width, height)` for freshly opened panes of this kind.
    pub const fn default_size(self) -> (i32, i32) {
        match self {
            Self::Window => (600, 400),
            Self::Chat => (350, 700),
            Self::Popup => (300, 200),
            Self::EmojiPicker => (300, 400),
        }
    }

    pub const fn default_title(self) -> &'static str {
        match self {
            Self::Window => "Window",
            Self::Chat => "Chat",
            Self::Popup => "Popup",
            Self::EmojiPicker => "Emojis",
        }
    }

    /// Whether panes of this kind get a taskbar pin.
    pub const fn pinned(self) -> bool {
        !matches!(self, Self::EmojiPicker)
    }
}

impl From<String> for PaneKind {
    fn from(raw: String) -> Self {
        Self::from_tag(&raw).unwrap_or_else(|| {
            tracing::warn!("unknown pane kind `{raw}`; falling back to `window`");
            Self::Window
        })
    }
}

impl From<PaneKind> for String {
    fn from(kind: PaneKind) -> Self {
        kind.tag().to_string()
    }
}

/// Persisted form of one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub id: WindowId,
    pub kind: PaneKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub minimized: bool,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_secs: Option<u32>,
}

impl WindowSnapshot {
    pub fn rect(&self) -> WindowRect {
        WindowRect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DesktopSnapshot {
    pub windows: Vec<WindowSnapshot>,
}

/// Creation request handed to the coordinator's window factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub kind: PaneKind,
    pub id: Option<WindowId>,
    pub title: Option<String>,
    pub content: String,
    pub size: Option<(i32, i32)>,
    pub position: Option<(i32, i32)>,
    pub channel: Option<String>,
    pub saved: Option<WindowSnapshot>,
}

impl WindowConfig {
    pub fn new(kind: PaneKind) -> Self {
        Self {
            kind,
            id: None,
            title: None,
            content: String::new(),
            size: None,
            position: None,
            channel: None,
            saved: None,
        }
    }

    /// Request that recreates the window described by `snapshot`.
    pub fn from_snapshot(snapshot: WindowSnapshot) -> Self {
        Self {
            kind: snapshot.kind,
            id: Some(snapshot.id.clone()),
            title: Some(snapshot.title.clone()),
            content: snapshot.content.clone(),
            size: Some((snapshot.width, snapshot.height)),
            position: Some((snapshot.x, snapshot.y)),
            channel: snapshot.channel.clone(),
            saved: Some(snapshot),
        }
    }

    pub fn with_id(mut self, id: WindowId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.position = Some((x, y));
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskbarEntry {
    pub window_id: WindowId,
    pub title: String,
    pub minimized: bool,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn snapshot_json_uses_kind_tag_and_camel_case_fields() {
        let snapshot = WindowSnapshot {
            id: WindowId::new("w1"),
            kind: PaneKind::Chat,
            title: "Chat - general".to_string(),
            content: String::new(),
            x: 10,
            y: 20,
            width: 350,
            height: 700,
            minimized: true,
            z_index: 1001,
            channel: Some("general".to_string()),
            remaining_secs: None,
        };
        let value = serde_json::to_value(&snapshot).expect("serialize");
        assert_eq!(value["kind"], "chat");
        assert_eq!(value["zIndex"], 1001);
        assert_eq!(value["channel"], "general");
        assert!(value.get("remainingSecs").is_none());

        let back: WindowSnapshot = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, snapshot);
    }

    #[test]
    fn far_edges_saturate_instead_of_overflowing() {
        let rect = WindowRect::new(i32::MAX - 100, i32::MAX - 5, 350, 700);
        assert_eq!((rect.right(), rect.bottom()), (i32::MAX, i32::MAX));
        assert_eq!(rect.offset(500, 10).x, i32::MAX);
    }

    #[test]
    fn unknown_kind_tag_decodes_as_base_window() {
        let raw = r#"{"id":"w9","kind":"spreadsheet","x":0,"y":0,"width":400,"height":300}"#;
        let snapshot: WindowSnapshot = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(snapshot.kind, PaneKind::Window);
        assert!(!snapshot.minimized);
        assert_eq!(snapshot.title, "");
    }

    #[test]
    fn resize_edges_cover_every_nonzero_direction() {
        for dx in -1..=1 {
            for dy in -1..=1 {
                let edge = ResizeEdge::from_direction(dx, dy);
                if (dx, dy) == (0, 0) {
                    assert_eq!(edge, None);
                } else {
                    assert_eq!(edge.map(ResizeEdge::direction), Some((dx, dy)));
                }
            }
        }
    }

    #[test]
    fn emoji_picker_id_is_derived_from_chat_id() {
        let chat = WindowId::new("abc");
        let picker = WindowId::emoji_picker_for(&chat);
        assert_eq!(picker.as_str(), "emoji-abc");
        assert_eq!(picker.paired_chat(), Some(chat));
        assert_eq!(WindowId::new("emoji-").paired_chat(), None);
    }
}
