//! Ollama Backend
//!
//! Chat completions against a local Ollama server through `/api/chat` with
//! streaming disabled. `/api/tags` doubles as the health probe.

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;

use super::traits::{BackendConfig, ChatBackend, ChatRequest, ChatResponse, DEFAULT_OLLAMA_MODEL};

/// Ollama backend client
#[derive(Clone, Debug)]
pub struct OllamaBackend {
    host: String,
    port: u16,
    model: String,
    http_client: reqwest::Client,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(host: impl Into<String>, port: u16, model: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            host: host.into(),
            port,
            model: model.into(),
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .context("Failed to create HTTP client")?,
        })
    }

    /// Create from `BackendConfig`, `None` for other providers
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &BackendConfig) -> anyhow::Result<Option<Self>> {
        match config {
            BackendConfig::Ollama { host, port, model } => {
                Self::new(host.clone(), *port, model.clone()).map(Some)
            }
            BackendConfig::OpenAi { .. } => Ok(None),
        }
    }

    fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url())
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url())
    }
}

/// Build the `/api/chat` request body
pub(crate) fn build_body(request: &ChatRequest, default_model: &str) -> serde_json::Value {
    let model = if request.model.is_empty() {
        default_model
    } else {
        &request.model
    };

    let mut body = serde_json::json!({
        "model": model,
        "messages": request.messages,
        "stream": false,
    });

    if let Some(temperature) = request.temperature {
        body["options"] = serde_json::json!({ "temperature": temperature });
    }

    body
}

/// Extract the reply from an `/api/chat` response body
pub(crate) fn parse_reply(data: &serde_json::Value) -> anyhow::Result<(String, Option<u32>)> {
    let content = data
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .context("Ollama response has no message content")?
        .to_string();

    let tokens_used = data
        .get("eval_count")
        .and_then(serde_json::Value::as_u64)
        .and_then(|c| u32::try_from(c).ok());

    Ok((content, tokens_used))
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    fn name(&self) -> &str {
        "Ollama"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.tags_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    async fn complete(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        let start = Instant::now();
        let body = build_body(request, &self.model);

        let response = self
            .http_client
            .post(self.chat_url())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {status}: {body}");
        }

        let data: serde_json::Value = response.json().await?;
        let (content, tokens_used) = parse_reply(&data)?;

        Ok(ChatResponse {
            content,
            model: body["model"].as_str().unwrap_or(DEFAULT_OLLAMA_MODEL).to_string(),
            tokens_used,
            duration_ms: u64::try_from(start.elapsed().as_millis()).ok(),
        })
    }
}
