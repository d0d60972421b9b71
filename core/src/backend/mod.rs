//! Chat Backend Integration
//!
//! Language model access through a common trait.
//!
//! # Available Backends
//!
//! - **OpenAI**: `/v1/chat/completions`, bearer auth
//! - **Ollama**: local server, `/api/chat`
//!
//! # Usage
//!
//! ```ignore
//! use kaiwa_core::backend::{BackendConfig, ChatBackend, ChatRequest, build_backend};
//!
//! let backend = build_backend(&BackendConfig::default())?;
//! let request = ChatRequest::new("", "You are a tutor", &history);
//! let reply = backend.complete(&request).await?;
//! ```

mod ollama;
mod openai;
mod traits;

use std::sync::Arc;

pub use ollama::OllamaBackend;
pub use openai::{OpenAiBackend, OPENAI_BASE_URL};
pub use traits::{
    BackendConfig, ChatBackend, ChatMessage, ChatRequest, ChatResponse, ChatRole,
    DEFAULT_OLLAMA_MODEL, DEFAULT_OPENAI_MODEL,
};

/// Build the backend described by `config`
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn build_backend(config: &BackendConfig) -> anyhow::Result<Arc<dyn ChatBackend>> {
    let backend: Arc<dyn ChatBackend> = match config {
        BackendConfig::Ollama { host, port, model } => {
            Arc::new(OllamaBackend::new(host.clone(), *port, model.clone())?)
        }
        BackendConfig::OpenAi {
            api_key,
            base_url,
            model,
        } => Arc::new(OpenAiBackend::new(
            api_key.clone(),
            base_url.clone(),
            model.clone(),
        )?),
    };
    tracing::info!(backend = backend.name(), model = backend.default_model(), "Chat backend ready");
    Ok(backend)
}
