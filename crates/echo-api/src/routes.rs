//! Router setup with all API routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use echo_core::config::ServerConfig;
use echo_core::error::EchoError;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/history", get(handlers::history))
        .route("/memory/clear", post(handlers::clear_memory))
        .route("/chat", post(handlers::chat));

    Router::new()
        .route("/", get(handlers::root))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB global limit
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until the process exits.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<(), EchoError> {
    let addr = config.bind_addr();
    let model = state.relay.model().to_string();
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| EchoError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(addr = %addr, model = %model, "Echo backend listening");

    axum::serve(listener, router)
        .await
        .map_err(|e| EchoError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
