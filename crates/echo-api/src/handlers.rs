//! Route handler functions for all API endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use echo_core::types::Message;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Query parameter types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// Return only the trailing `limit` messages.
    pub limit: Option<usize>,
}

// =============================================================================
// Request / response types
// =============================================================================

/// Body of POST /api/chat.
///
/// `message` is kept as raw JSON so a missing or non-string value can be
/// reported as a 400 instead of axum's default rejection.
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub message: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub model: String,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET / - plain-text banner so a browser hitting the port sees something.
pub async fn root() -> &'static str {
    "Echo backend is running. API at /api/chat and /api/history"
}

/// GET /api/health - liveness probe.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        model: state.relay.model().to_string(),
    })
}

/// GET /api/history - the persisted log, optionally only its tail.
pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Json<Vec<Message>> {
    match params.limit {
        Some(limit) => Json(state.relay.recent(limit)),
        None => Json(state.relay.history()),
    }
}

/// POST /api/memory/clear - empty the persisted log.
pub async fn clear_memory(State(state): State<AppState>) -> Json<ClearResponse> {
    state.relay.clear();
    Json(ClearResponse {
        ok: true,
        message: "Memory cleared".to_string(),
    })
}

/// POST /api/chat - run one chat turn.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = match payload {
        Ok(Json(body)) => match body.message {
            serde_json::Value::String(text) => text,
            _ => return Err(ApiError::BadRequest("Invalid message".to_string())),
        },
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected chat body");
            return Err(ApiError::BadRequest("Invalid message".to_string()));
        }
    };

    let reply = state.relay.handle_turn(&message).await?;
    Ok(Json(ChatResponse { reply }))
}
