//! HTTP-level tests for the Ollama backend and the relay client.
//!
//! Each test starts a throwaway axum server on 127.0.0.1:0 that plays the
//! part of Ollama or of the relay.

use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use echo_chat::{
    ChatError, ChatRequest, ChatTransport, InferenceBackend, OllamaBackend, PromptMessage,
    RelayClient, Role,
};
use echo_core::config::InferenceConfig;

// =============================================================================
// Helpers
// =============================================================================

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// An address nothing is listening on.
async fn dead_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn backend_for(url: &str, timeout_secs: u64) -> OllamaBackend {
    OllamaBackend::new(&InferenceConfig {
        url: url.to_string(),
        model: "gemma3:1b".to_string(),
        timeout_secs,
    })
    .unwrap()
}

fn request(text: &str) -> ChatRequest {
    ChatRequest {
        model: "gemma3:1b".to_string(),
        messages: vec![
            PromptMessage::new(Role::System, "be chill"),
            PromptMessage::new(Role::User, text),
        ],
        stream: false,
    }
}

// =============================================================================
// OllamaBackend
// =============================================================================

#[tokio::test]
async fn test_ollama_chat_happy_path() {
    let router = Router::new().route(
        "/api/chat",
        post(|Json(req): Json<ChatRequest>| async move {
            assert!(!req.stream);
            assert_eq!(req.model, "gemma3:1b");
            let last = req.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Json(json!({
                "model": req.model,
                "message": { "role": "assistant", "content": format!("you said {}", last) },
                "done": true
            }))
        }),
    );
    let url = serve(router).await;

    let reply = backend_for(&url, 5).chat(&request("hi")).await.unwrap();
    assert_eq!(reply, "you said hi");
}

#[tokio::test]
async fn test_ollama_non_success_is_upstream_error() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async { (StatusCode::NOT_FOUND, "model \"gemma3:1b\" not found") }),
    );
    let url = serve(router).await;

    let err = backend_for(&url, 5).chat(&request("hi")).await.unwrap_err();
    match err {
        ChatError::Upstream { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("not found"));
        }
        other => panic!("expected Upstream, got {:?}", other),
    }
}

#[tokio::test]
async fn test_ollama_unexpected_shape_fails_closed() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async { Json(json!({ "done": true })) }),
    );
    let url = serve(router).await;

    let err = backend_for(&url, 5).chat(&request("hi")).await.unwrap_err();
    assert!(matches!(err, ChatError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_ollama_unreachable_is_transport_error() {
    let url = dead_address().await;
    let err = backend_for(&url, 5).chat(&request("hi")).await.unwrap_err();
    assert!(matches!(err, ChatError::Transport(_)));
}

#[tokio::test]
async fn test_ollama_timeout_is_transport_error() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({ "message": { "content": "too late" } }))
        }),
    );
    let url = serve(router).await;

    let err = backend_for(&url, 1).chat(&request("hi")).await.unwrap_err();
    match err {
        ChatError::Transport(msg) => assert!(msg.contains("1s")),
        other => panic!("expected Transport, got {:?}", other),
    }
}

#[tokio::test]
async fn test_ollama_health_check() {
    let router = Router::new().route(
        "/api/tags",
        get(|| async { Json(json!({ "models": [{ "name": "gemma3:1b" }] })) }),
    );
    let url = serve(router).await;
    assert!(backend_for(&url, 5).health_check().await.is_ok());

    let dead = dead_address().await;
    assert!(backend_for(&dead, 5).health_check().await.is_err());
}

// =============================================================================
// RelayClient
// =============================================================================

fn relay_router() -> Router {
    Router::new()
        .route(
            "/api/chat",
            post(|Json(body): Json<Value>| async move {
                match body["message"].as_str() {
                    Some("break") => (
                        StatusCode::BAD_GATEWAY,
                        Json(json!({ "error": "Ollama chat failed", "details": "boom" })),
                    ),
                    Some("weird") => (StatusCode::OK, Json(json!({ "answer": "?" }))),
                    Some(text) => (StatusCode::OK, Json(json!({ "reply": format!("re: {}", text) }))),
                    None => (
                        StatusCode::BAD_REQUEST,
                        Json(json!({ "error": "Invalid message" })),
                    ),
                }
            }),
        )
        .route(
            "/api/history",
            get(|| async {
                Json(json!([
                    { "sender": "user", "text": "hi", "timestamp": "2025-05-01T12:00:00.000Z" },
                    { "sender": "ai", "text": "hey", "timestamp": "2025-05-01T12:00:01.000Z" }
                ]))
            }),
        )
        .route(
            "/api/memory/clear",
            post(|| async { Json(json!({ "ok": true, "message": "Memory cleared" })) }),
        )
}

#[tokio::test]
async fn test_relay_client_send_chat() {
    let url = serve(relay_router()).await;
    let client = RelayClient::new(format!("{}/api", url)).unwrap();
    assert_eq!(client.send_chat("yo").await.unwrap(), "re: yo");
}

#[tokio::test]
async fn test_relay_client_surfaces_status() {
    let url = serve(relay_router()).await;
    let client = RelayClient::new(format!("{}/api", url)).unwrap();
    let err = client.send_chat("break").await.unwrap_err();
    assert!(matches!(err, ChatError::Upstream { status: 502, .. }));
}

#[tokio::test]
async fn test_relay_client_rejects_bad_shape() {
    let url = serve(relay_router()).await;
    let client = RelayClient::new(format!("{}/api", url)).unwrap();
    let err = client.send_chat("weird").await.unwrap_err();
    assert!(matches!(err, ChatError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_relay_client_history_and_clear() {
    let url = serve(relay_router()).await;
    let client = RelayClient::new(format!("{}/api/", url)).unwrap();

    let history = client.fetch_history().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].text, "hey");

    assert!(client.clear_memory().await.is_ok());
}

#[tokio::test]
async fn test_relay_client_unreachable() {
    let url = dead_address().await;
    let client = RelayClient::new(format!("{}/api", url)).unwrap();
    assert!(matches!(
        client.send_chat("hello").await.unwrap_err(),
        ChatError::Transport(_)
    ));
}
