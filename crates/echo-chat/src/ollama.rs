//! Ollama chat API client.

use std::time::Duration;

use async_trait::async_trait;

use echo_core::config::InferenceConfig;

use crate::backend::InferenceBackend;
use crate::error::ChatError;
use crate::types::{ChatReply, ChatRequest};

/// `InferenceBackend` over Ollama's `/api/chat` endpoint.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaBackend {
    /// Build a client from the inference section of the config.
    ///
    /// Every request is bounded by `timeout_secs`.
    pub fn new(config: &InferenceConfig) -> Result<Self, ChatError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the Ollama server answers at all.
    pub async fn health_check(&self) -> Result<(), ChatError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Upstream { status, body });
        }
        Ok(())
    }

    fn transport_error(&self, err: reqwest::Error) -> ChatError {
        if err.is_timeout() {
            ChatError::Transport(format!(
                "Ollama did not answer within {}s",
                self.timeout.as_secs()
            ))
        } else if err.is_connect() {
            ChatError::Transport(format!("Ollama server not reachable at {}", self.base_url))
        } else {
            ChatError::from(err)
        }
    }
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    async fn chat(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let url = format!("{}/api/chat", self.base_url);
        tracing::debug!(url = %url, messages = request.messages.len(), "Sending chat request");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        parse_reply(&body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Extract the reply text from a `/api/chat` response body.
///
/// Anything other than `{"message": {"content": <string>}}` is rejected.
pub fn parse_reply(body: &str) -> Result<String, ChatError> {
    serde_json::from_str::<ChatReply>(body)
        .map(|reply| reply.message.content)
        .map_err(|e| ChatError::MalformedResponse(e.to_string()))
}
