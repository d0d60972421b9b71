//! Chat Backend Traits
//!
//! The tutor talks to language models through [`ChatBackend`]. A request is
//! the composed system instruction followed by the conversation history; the
//! reply is a single finished string.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::conversation::{Message, Role};

/// Default OpenAI chat model
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Default Ollama chat model
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

/// Role of a message on the wire
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instruction
    System,
    /// Learner message
    User,
    /// Model reply
    Assistant,
}

impl From<Role> for ChatRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Self::User,
            Role::Assistant => Self::Assistant,
        }
    }
}

/// A role-tagged message sent to a backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender role
    pub role: ChatRole,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// System instruction message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.into(),
            content: message.content.clone(),
        }
    }
}

/// A chat completion request
#[derive(Clone, Debug, PartialEq)]
pub struct ChatRequest {
    /// Model to use (backend-specific identifier)
    pub model: String,
    /// System instruction followed by history, in order
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature, if overridden
    pub temperature: Option<f32>,
}

impl ChatRequest {
    /// Build a request from a system instruction and history
    pub fn new<'a>(
        model: impl Into<String>,
        system: impl Into<String>,
        history: impl IntoIterator<Item = &'a Message>,
    ) -> Self {
        let mut messages = vec![ChatMessage::system(system)];
        messages.extend(history.into_iter().map(ChatMessage::from));
        Self {
            model: model.into(),
            messages,
            temperature: None,
        }
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 2.0));
        self
    }
}

/// A finished chat completion
#[derive(Clone, Debug, PartialEq)]
pub struct ChatResponse {
    /// Reply text
    pub content: String,
    /// Model that produced the reply
    pub model: String,
    /// Tokens used (if reported)
    pub tokens_used: Option<u32>,
    /// Request time in milliseconds
    pub duration_ms: Option<u64>,
}

/// Chat backend trait
///
/// Implement this trait to add support for another provider.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend name (e.g., "Ollama", "OpenAI")
    fn name(&self) -> &str;

    /// Model used when a request does not name one
    fn default_model(&self) -> &str;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Send a request and wait for the complete reply
    async fn complete(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse>;
}

/// Backend connection configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendConfig {
    /// Local Ollama server
    Ollama {
        /// Host address
        host: String,
        /// Port number
        port: u16,
        /// Chat model
        model: String,
    },
    /// OpenAI-compatible API
    OpenAi {
        /// API key for bearer authentication
        api_key: String,
        /// Custom base URL (optional)
        base_url: Option<String>,
        /// Chat model
        model: String,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Ollama {
            host: "localhost".to_string(),
            port: 11434,
            model: DEFAULT_OLLAMA_MODEL.to_string(),
        }
    }
}

impl BackendConfig {
    /// Ollama configuration
    pub fn ollama(host: impl Into<String>, port: u16, model: impl Into<String>) -> Self {
        Self::Ollama {
            host: host.into(),
            port,
            model: model.into(),
        }
    }

    /// OpenAI configuration with the default endpoint
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::OpenAi {
            api_key: api_key.into(),
            base_url: None,
            model: model.into(),
        }
    }

    /// Configured model
    #[must_use]
    pub fn model(&self) -> &str {
        match self {
            Self::Ollama { model, .. } | Self::OpenAi { model, .. } => model,
        }
    }
}
