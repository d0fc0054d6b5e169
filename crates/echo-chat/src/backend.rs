//! Seam between the relay and whatever answers chat requests.

use async_trait::async_trait;

use crate::error::ChatError;
use crate::types::ChatRequest;

/// A non-streaming chat-completion endpoint.
///
/// Implementations make exactly one attempt per call and report a
/// non-success response as `ChatError::Upstream`.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Send one request and return the complete reply text.
    async fn chat(&self, request: &ChatRequest) -> Result<String, ChatError>;

    /// Model tag placed on outgoing requests.
    fn model(&self) -> &str;
}
