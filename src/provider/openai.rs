use super::{ChatMessage, CompletionGateway, ConversationMemory, ProviderError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub temperature: f64,
    /// `None` waits for the endpoint indefinitely.
    pub timeout: Option<Duration>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiGateway {
    config: OpenAiConfig,
    agent: ureq::Agent,
    memory: ConversationMemory,
}

impl OpenAiGateway {
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey {
                key: OPENAI_API_KEY_ENV.to_string(),
            });
        }

        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            config,
            agent: builder.build(),
            memory: ConversationMemory::new(),
        })
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }

    fn request_completion(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let url = self.endpoint();
        let body = serde_json::to_value(ChatCompletionRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages,
        })
        .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let response = match self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.config.api_key))
            .send_json(body)
        {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                return Err(ProviderError::Status {
                    status,
                    body: response.into_string().unwrap_or_default(),
                });
            }
            Err(err) => {
                return Err(ProviderError::Transport {
                    url,
                    reason: err.to_string(),
                });
            }
        };

        let parsed: ChatCompletionResponse = response
            .into_json()
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyReply)
    }
}

impl CompletionGateway for OpenAiGateway {
    fn run(&mut self, prompt: &str) -> Result<String, ProviderError> {
        let messages = self.memory.messages_for(prompt);
        let reply = self.request_completion(&messages)?;
        self.memory.record(prompt, &reply);
        Ok(reply)
    }

    fn clear(&mut self) {
        self.memory.clear();
    }
}
