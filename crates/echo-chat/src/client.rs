//! Client side of the relay's HTTP API.
//!
//! `ChatTransport` is the surface a front-end depends on. `RelayClient`
//! speaks to a running relay; `DemoFallback` keeps a front-end usable when
//! the relay cannot be reached.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use echo_core::types::Message;

use crate::error::ChatError;

/// Requests from a front-end give up after this long.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(12);

/// Operations a front-end needs from the relay.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one message and wait for the complete reply.
    async fn send_chat(&self, message: &str) -> Result<String, ChatError>;

    /// Full persisted conversation log.
    async fn fetch_history(&self) -> Result<Vec<Message>, ChatError>;

    /// Empty the persisted conversation log.
    async fn clear_memory(&self) -> Result<(), ChatError>;
}

#[derive(Debug, Serialize)]
struct SendBody<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReplyBody {
    reply: String,
}

#[derive(Debug, Deserialize)]
struct ClearBody {
    ok: bool,
}

/// HTTP client for a running relay.
#[derive(Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    /// `base_url` points at the API root, e.g. `http://127.0.0.1:3000/api`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ChatError> {
        Self::with_timeout(base_url, CLIENT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Internal(format!("failed to build HTTP client: {}", e)))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, ChatError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ChatError::Upstream {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ChatTransport for RelayClient {
    async fn send_chat(&self, message: &str) -> Result<String, ChatError> {
        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(&SendBody { message })
            .send()
            .await?;
        let body = Self::checked(response).await?.text().await?;

        serde_json::from_str::<ReplyBody>(&body)
            .map(|b| b.reply)
            .map_err(|_| ChatError::MalformedResponse("Invalid API response shape".to_string()))
    }

    async fn fetch_history(&self) -> Result<Vec<Message>, ChatError> {
        let response = self
            .client
            .get(format!("{}/history", self.base_url))
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    async fn clear_memory(&self) -> Result<(), ChatError> {
        let response = self
            .client
            .post(format!("{}/memory/clear", self.base_url))
            .send()
            .await?;
        let body: ClearBody = Self::checked(response).await?.json().await?;
        if body.ok {
            Ok(())
        } else {
            Err(ChatError::MalformedResponse(
                "relay refused to clear memory".to_string(),
            ))
        }
    }
}

/// Wraps a transport and answers locally when `send_chat` fails.
pub struct DemoFallback<T> {
    inner: T,
}

impl<T: ChatTransport> DemoFallback<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

/// Canned reply used while the relay is unreachable.
pub fn demo_reply(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        "Hi! I'm running in demo mode because the AI server isn't reachable right now."
            .to_string()
    } else {
        format!(
            "I couldn't reach the AI server, so this is a local demo response. You said: \"{}\".",
            trimmed
        )
    }
}

#[async_trait]
impl<T: ChatTransport> ChatTransport for DemoFallback<T> {
    async fn send_chat(&self, message: &str) -> Result<String, ChatError> {
        match self.inner.send_chat(message).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                warn!(error = %e, "Falling back to demo reply, is the relay running?");
                Ok(demo_reply(message))
            }
        }
    }

    async fn fetch_history(&self) -> Result<Vec<Message>, ChatError> {
        self.inner.fetch_history().await
    }

    async fn clear_memory(&self) -> Result<(), ChatError> {
        self.inner.clear_memory().await
    }
}
