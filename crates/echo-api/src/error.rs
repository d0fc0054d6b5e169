//! API error types and JSON error response formatting.
//!
//! ApiError maps chat failures to HTTP status codes and the small JSON
//! bodies front-ends expect: `{"error": ...}` plus `details` for backend
//! failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use echo_chat::ChatError;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short human-readable error.
    pub error: String,
    /// Raw backend output, present only on 502 responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid input.
    BadRequest(String),
    /// 502 Bad Gateway - the inference backend failed.
    BadGateway { error: String, details: String },
    /// 500 Internal Server Error - anything else. The message is logged only.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(error) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error,
                    details: None,
                },
            ),
            ApiError::BadGateway { error, details } => (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    error,
                    details: Some(details),
                },
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Server error".to_string(),
                        details: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Validation(_) => ApiError::BadRequest("Invalid message".to_string()),
            ChatError::Upstream { body, .. } => ApiError::BadGateway {
                error: "Ollama chat failed".to_string(),
                details: body,
            },
            ChatError::MalformedResponse(msg) => ApiError::BadGateway {
                error: "Ollama chat failed".to_string(),
                details: msg,
            },
            other => ApiError::Internal(other.to_string()),
        }
    }
}
