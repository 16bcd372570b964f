use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Buffer of every prompt/reply pair the gateway has completed, replayed in
/// full ahead of each new prompt. Prompts are stored as sent, preamble
/// included.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    exchanges: Vec<(String, String)>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, prompt: &str, reply: &str) {
        self.exchanges.push((prompt.to_string(), reply.to_string()));
    }

    pub fn clear(&mut self) {
        self.exchanges.clear();
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn messages_for(&self, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.exchanges.len() * 2 + 1);
        for (sent, reply) in &self.exchanges {
            messages.push(ChatMessage::user(sent.as_str()));
            messages.push(ChatMessage::assistant(reply.as_str()));
        }
        messages.push(ChatMessage::user(prompt));
        messages
    }
}
