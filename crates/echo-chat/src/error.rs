//! Error types for the chat relay and its clients.

/// Errors from a chat turn.
///
/// Persistence failures never show up here: the memory store logs and
/// swallows them.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("invalid message: {0}")]
    Validation(String),
    #[error("inference backend returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("malformed inference response: {0}")]
    MalformedResponse(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Whether the failure belongs to the inference backend rather than the relay.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ChatError::Upstream { .. } | ChatError::MalformedResponse(_)
        )
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ChatError::MalformedResponse(err.to_string())
        } else if err.is_builder() {
            ChatError::Internal(err.to_string())
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}
