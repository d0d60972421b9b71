//! OpenAI Backend
//!
//! Chat completions through `/v1/chat/completions` with bearer
//! authentication. Any OpenAI-compatible server works by overriding the base
//! URL.

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;

use super::traits::{BackendConfig, ChatBackend, ChatRequest, ChatResponse};

/// Public OpenAI endpoint
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// OpenAI backend client
#[derive(Clone)]
pub struct OpenAiBackend {
    api_key: String,
    base_url: String,
    model: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiBackend {
    /// Create a new OpenAI backend
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        model: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let base_url = base_url
            .unwrap_or_else(|| OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key: api_key.into(),
            base_url,
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
            BackendConfig::OpenAi {
                api_key,
                base_url,
                model,
            } => Self::new(api_key.clone(), base_url.clone(), model.clone()).map(Some),
            BackendConfig::Ollama { .. } => Ok(None),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn models_url(&self) -> String {
        format!("{}/v1/models", self.base_url)
    }
}

/// Build the `/v1/chat/completions` request body
pub(crate) fn build_body(request: &ChatRequest, default_model: &str) -> serde_json::Value {
    let model = if request.model.is_empty() {
        default_model
    } else {
        &request.model
    };

    let mut body = serde_json::json!({
        "model": model,
        "messages": request.messages,
    });

    if let Some(temperature) = request.temperature {
        body["temperature"] = serde_json::json!(temperature);
    }

    body
}

/// Extract the first choice from a completions response body
pub(crate) fn parse_reply(
    data: &serde_json::Value,
) -> anyhow::Result<(String, String, Option<u32>)> {
    if let Some(message) = data
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(serde_json::Value::as_str)
    {
        anyhow::bail!("OpenAI error: {message}");
    }

    let content = data
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .filter(|content| !content.is_empty())
        .context("OpenAI response has no message content")?
        .to_string();

    let model = data
        .get("model")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();

    let tokens_used = data
        .get("usage")
        .and_then(|u| u.get("total_tokens"))
        .and_then(serde_json::Value::as_u64)
        .and_then(|c| u32::try_from(c).ok());

    Ok((content, model, tokens_used))
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "OpenAI"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.models_url())
            .bearer_auth(&self.api_key)
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
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI returned {status}: {body}");
        }

        let data: serde_json::Value = response.json().await?;
        let (content, model, tokens_used) = parse_reply(&data)?;

        Ok(ChatResponse {
            content,
            model: if model.is_empty() {
                self.model.clone()
            } else {
                model
            },
            tokens_used,
            duration_ms: u64::try_from(start.elapsed().as_millis()).ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Message;

    #[test]
    fn test_base_url_override() {
        let backend = OpenAiBackend::new("k", Some("http://localhost:8000/".to_string()), "m").unwrap();
        assert_eq!(
            backend.completions_url(),
            "http://localhost:8000/v1/chat/completions"
        );

        let backend = OpenAiBackend::new("k", None, "m").unwrap();
        assert_eq!(
            backend.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let backend = OpenAiBackend::new("sk-secret", None, "m").unwrap();
        assert!(!format!("{backend:?}").contains("sk-secret"));
    }

    #[test]
    fn test_build_body() {
        let request = ChatRequest::new("gpt-4o", "sys", &[Message::user("やあ")]);
        let body = build_body(&request, "gpt-3.5-turbo");
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_parse_reply() {
        let data = serde_json::json!({
            "model": "gpt-3.5-turbo-0125",
            "choices": [{ "message": { "role": "assistant", "content": "はい" } }],
            "usage": { "total_tokens": 42 },
        });
        let (content, model, tokens) = parse_reply(&data).unwrap();
        assert_eq!(content, "はい");
        assert_eq!(model, "gpt-3.5-turbo-0125");
        assert_eq!(tokens, Some(42));
    }

    #[test]
    fn test_parse_reply_errors() {
        let err = parse_reply(&serde_json::json!({ "error": { "message": "bad key" } }))
            .unwrap_err();
        assert!(err.to_string().contains("bad key"));

        let empty = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "" } }],
        });
        assert!(parse_reply(&empty).is_err());
        assert!(parse_reply(&serde_json::json!({ "choices": [] })).is_err());
    }
}
