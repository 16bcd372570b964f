pub mod memory;
pub mod openai;

pub use memory::{ChatMessage, ChatRole, ConversationMemory};
pub use openai::{OpenAiConfig, OpenAiGateway, DEFAULT_API_BASE, OPENAI_API_KEY_ENV};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("missing model-provider credential `{key}`")]
    MissingApiKey { key: String },
    #[error("completion request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("completion endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode completion response: {0}")]
    Decode(String),
    #[error("completion response contained no reply message")]
    EmptyReply,
}

/// Blocking call-and-wait access to the model that writes assistant replies.
///
/// Implementations may keep conversational memory across `run` calls;
/// `clear` must drop all of it.
pub trait CompletionGateway {
    fn run(&mut self, prompt: &str) -> Result<String, ProviderError>;

    fn clear(&mut self);
}
