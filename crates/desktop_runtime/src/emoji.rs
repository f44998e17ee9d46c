//! Emoji picker state: a fixed category table with a name filter.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmojiCategory {
    pub name: &'static str,
    pub emojis: &'static [&'static str],
}

pub const EMOJI_CATEGORIES: [EmojiCategory; 5] = [
    EmojiCategory {
        name: "Smileys",
        emojis: &[
            "😀", "😃", "😄", "😁", "😅", "😂", "🤣", "😊", "😇", "🙂", "🙃", "😉", "😌", "😍",
            "🥰", "😘",
        ],
    },
    EmojiCategory {
        name: "Gestures",
        emojis: &[
            "👍", "👎", "👌", "✌️", "🤞", "🤜", "🤛", "👏", "🙌", "👐", "🤲", "🤝", "🙏",
        ],
    },
    EmojiCategory {
        name: "Heart",
        emojis: &[
            "❤️", "🧡", "💛", "💚", "💙", "💜", "🤎", "🖤", "🤍", "💔", "❣️", "💕", "💞", "💓",
            "💗", "💖",
        ],
    },
    EmojiCategory {
        name: "Animals",
        emojis: &[
            "🐶", "🐱", "🐭", "🐹", "🐰", "🦊", "🐻", "🐼", "🐨", "🐯", "🦁", "🐮", "🐷", "🐸",
        ],
    },
    EmojiCategory {
        name: "Food",
        emojis: &[
            "🍎", "🍐", "🍊", "🍋", "🍌", "🍉", "🍇", "🍓", "🍈", "🍒", "🍑", "🥭", "🍍", "🥥",
        ],
    },
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmojiPicker {
    query: String,
}

impl EmojiPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Categories whose name contains the query, case-insensitively. An empty query shows all.
    pub fn visible_categories(&self) -> Vec<&'static EmojiCategory> {
        let needle = self.query.trim().to_lowercase();
        EMOJI_CATEGORIES
            .iter()
            .filter(|category| needle.is_empty() || category.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Returns `emoji` when it belongs to the table.
    pub fn select(&self, emoji: &str) -> Option<&'static str> {
        EMOJI_CATEGORIES
            .iter()
            .flat_map(|category| category.emojis.iter().copied())
            .find(|candidate| *candidate == emoji)
    }
}
