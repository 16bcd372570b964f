use serde::{Deserialize, Serialize};

pub mod record;
pub mod store;

pub use record::{format_timestamp, DialogueEntry, TranscriptRecord, TIMESTAMP_FORMAT};
pub use store::{write_record, TranscriptLayout, TranscriptStore};

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("failed to create transcript directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode transcript {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write transcript {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One message of the conversation. Fields are private so a turn cannot be
/// edited once it is part of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    speaker: Speaker,
    content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            content: content.into(),
        }
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered, append-only transcript of the active conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    turns: Vec<Turn>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
