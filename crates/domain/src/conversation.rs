//! Conversation entries and the bounded transcript window.
//!
//! Entries are persisted in the generation API's native turn shape
//! (`{"role": "user", "parts": [{"text": "..."}]}`) so a stored transcript
//! can be replayed to the backend verbatim.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Maximum number of entries kept per scope. Oldest entries are evicted first.
pub const MAX_TRANSCRIPT_ENTRIES: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// A single turn of a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    role: Role,
    text: String,
}

impl ConversationEntry {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

// ── serde: provider turn shape ───────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
struct TurnRef<'a> {
    role: Role,
    parts: [TextPartRef<'a>; 1],
}

#[derive(Serialize)]
struct TextPartRef<'a> {
    text: &'a str,
}

/// Accepted on-disk shapes: the provider turn, or a flat `{role, text}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Turn { role: Role, parts: Vec<TextPart> },
    Flat { role: Role, text: String },
}

impl Serialize for ConversationEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TurnRef {
            role: self.role,
            parts: [TextPartRef { text: &self.text }],
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConversationEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match StoredEntry::deserialize(deserializer)? {
            StoredEntry::Turn { role, parts } => {
                let text: String = parts.into_iter().filter_map(|p| p.text).collect();
                ConversationEntry { role, text }
            }
            StoredEntry::Flat { role, text } => ConversationEntry { role, text },
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Transcript
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Ordered, bounded history of one scope.
///
/// Never holds more than [`MAX_TRANSCRIPT_ENTRIES`] entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    entries: Vec<ConversationEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a transcript from persisted entries, keeping the most recent
    /// window if the input is oversized.
    pub fn from_entries(entries: Vec<ConversationEntry>) -> Self {
        let mut transcript = Self { entries };
        transcript.enforce_window();
        transcript
    }

    /// Append an entry, evicting the oldest entries beyond the window.
    pub fn push(&mut self, entry: ConversationEntry) {
        self.entries.push(entry);
        self.enforce_window();
    }

    /// Copy of this transcript with `entry` appended.
    pub fn with_entry(&self, entry: ConversationEntry) -> Self {
        let mut next = self.clone();
        next.push(entry);
        next
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ConversationEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    fn enforce_window(&mut self) {
        if self.entries.len() > MAX_TRANSCRIPT_ENTRIES {
            let excess = self.entries.len() - MAX_TRANSCRIPT_ENTRIES;
            self.entries.drain(..excess);
        }
    }
}

impl<'de> Deserialize<'de> for Transcript {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<ConversationEntry>::deserialize(deserializer)?;
        Ok(Transcript::from_entries(entries))
    }
}
