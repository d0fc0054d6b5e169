//! Chat relay: runs one turn against the memory log and the backend.

use std::sync::Arc;

use tracing::{error, info, warn};

use echo_core::config::ChatConfig;
use echo_core::types::{Message, Sender};
use echo_storage::MemoryStore;

use crate::backend::InferenceBackend;
use crate::error::ChatError;
use crate::prompt::build_request;

/// Mediates between HTTP handlers, the durable log, and the inference backend.
pub struct ChatRelay {
    store: Arc<MemoryStore>,
    backend: Arc<dyn InferenceBackend>,
    config: ChatConfig,
}

impl ChatRelay {
    pub fn new(
        store: Arc<MemoryStore>,
        backend: Arc<dyn InferenceBackend>,
        config: ChatConfig,
    ) -> Self {
        Self {
            store,
            backend,
            config,
        }
    }

    /// Handle one user message and return the model's reply.
    ///
    /// The user message is logged before the backend is called and is not
    /// rolled back if the call fails. The reply is logged only on success.
    pub async fn handle_turn(&self, text: &str) -> Result<String, ChatError> {
        if text.is_empty() {
            return Err(ChatError::Validation("message cannot be empty".to_string()));
        }

        let log = self.store.record(Sender::User, text);
        let request = build_request(self.backend.model(), &log, &self.config);

        let reply = match self.backend.chat(&request).await {
            Ok(reply) => reply,
            Err(e) if e.is_upstream() => {
                warn!(error = %e, history = log.len(), "Inference backend rejected chat request");
                return Err(e);
            }
            Err(e) => {
                error!(error = %e, history = log.len(), "Inference backend call failed");
                return Err(e);
            }
        };

        self.store.record(Sender::Ai, &reply);
        info!(
            context = request.messages.len() - 1,
            reply_chars = reply.chars().count(),
            "Chat turn completed"
        );
        Ok(reply)
    }

    /// Full persisted log, oldest first.
    pub fn history(&self) -> Vec<Message> {
        self.store.snapshot()
    }

    /// The trailing `count` messages, oldest first.
    pub fn recent(&self, count: usize) -> Vec<Message> {
        self.store.recent(count)
    }

    /// Empty the log. Returns `false` if the file could not be rewritten.
    pub fn clear(&self) -> bool {
        let persisted = self.store.clear();
        info!(persisted, "Memory cleared");
        persisted
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use echo_storage::MemoryFile;

    use crate::types::{ChatRequest, Role};

    /// Backend that replies from a script and records what it was sent.
    struct ScriptedBackend {
        outcome: Box<dyn Fn(&ChatRequest) -> Result<String, ChatError> + Send + Sync>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedBackend {
        fn replying(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                outcome: Box::new(move |_: &ChatRequest| Ok(reply.to_string())),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                outcome: Box::new(move |_: &ChatRequest| {
                    Err(ChatError::Upstream {
                        status,
                        body: "model exploded".to_string(),
                    })
                }),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn last_request(&self) -> ChatRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl InferenceBackend for ScriptedBackend {
        async fn chat(&self, request: &ChatRequest) -> Result<String, ChatError> {
            self.requests.lock().unwrap().push(request.clone());
            tokio::task::yield_now().await;
            (self.outcome)(request)
        }

        fn model(&self) -> &str {
            "test-model"
        }
    }

    fn relay_with(backend: Arc<ScriptedBackend>) -> (tempfile::TempDir, ChatRelay) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::open(MemoryFile::new(
            dir.path().join("memory.json"),
        )));
        let relay = ChatRelay::new(store, backend, ChatConfig::default());
        (dir, relay)
    }

    #[tokio::test]
    async fn test_turn_logs_user_and_reply() {
        let (_dir, relay) = relay_with(ScriptedBackend::replying("not much"));
        let reply = relay.handle_turn("what's up").await.unwrap();

        assert_eq!(reply, "not much");
        let history = relay.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sender, Sender::User);
        assert_eq!(history[0].text, "what's up");
        assert_eq!(history[1].sender, Sender::Ai);
        assert_eq!(history[1].text, "not much");
        assert_eq!(relay.store().file().load(), history);
    }

    #[tokio::test]
    async fn test_empty_message_rejected_without_side_effects() {
        let backend = ScriptedBackend::replying("unused");
        let (_dir, relay) = relay_with(Arc::clone(&backend));

        let err = relay.handle_turn("").await.unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
        assert!(relay.history().is_empty());
        assert!(backend.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_leaves_orphaned_user_message() {
        let (_dir, relay) = relay_with(ScriptedBackend::failing(503));

        let err = relay.handle_turn("hello?").await.unwrap_err();
        assert!(matches!(err, ChatError::Upstream { status: 503, .. }));

        let history = relay.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sender, Sender::User);
        assert_eq!(history[0].text, "hello?");
    }

    #[tokio::test]
    async fn test_request_carries_model_persona_and_context() {
        let backend = ScriptedBackend::replying("ok");
        let (_dir, relay) = relay_with(Arc::clone(&backend));

        relay.handle_turn("first").await.unwrap();
        relay.handle_turn("second").await.unwrap();

        let request = backend.last_request();
        assert_eq!(request.model, "test-model");
        assert!(!request.stream);
        let roles: Vec<Role> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(request.messages[3].content, "second");
    }

    #[tokio::test]
    async fn test_long_history_gets_hint_and_window() {
        let backend = ScriptedBackend::replying("yep");
        let (_dir, relay) = relay_with(Arc::clone(&backend));

        for i in 0..6 {
            relay.handle_turn(&format!("q{}", i)).await.unwrap();
        }

        // 10 logged messages + the 6th user message = 11 at request time
        let request = backend.last_request();
        assert_eq!(request.messages.len(), 9);
        assert!(request.messages[0]
            .content
            .contains("You have 11 messages in our conversation history."));
        assert_eq!(request.messages[8].content, "q5");
        assert_eq!(relay.history().len(), 12);
    }

    #[tokio::test]
    async fn test_whitespace_message_is_accepted() {
        let (_dir, relay) = relay_with(ScriptedBackend::replying("?"));
        assert!(relay.handle_turn("   ").await.is_ok());
        assert_eq!(relay.history().len(), 2);
    }

    #[tokio::test]
    async fn test_recent_returns_trailing_messages() {
        let (_dir, relay) = relay_with(ScriptedBackend::replying("a"));
        relay.handle_turn("one").await.unwrap();
        relay.handle_turn("two").await.unwrap();

        let recent = relay.recent(3);
        let texts: Vec<&str> = recent.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "two", "a"]);
        assert_eq!(relay.recent(100).len(), 4);
        assert!(relay.recent(0).is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_also_keeps_user_message() {
        let backend = Arc::new(ScriptedBackend {
            outcome: Box::new(|_: &ChatRequest| {
                Err(ChatError::Transport("connection refused".to_string()))
            }),
            requests: Mutex::new(Vec::new()),
        });
        let (_dir, relay) = relay_with(backend);

        let err = relay.handle_turn("anyone?").await.unwrap_err();
        assert!(!err.is_upstream());
        assert_eq!(relay.history().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_empties_history() {
        let (_dir, relay) = relay_with(ScriptedBackend::replying("k"));
        relay.handle_turn("hi").await.unwrap();
        assert!(relay.clear());
        assert!(relay.history().is_empty());
        assert!(relay.store().file().load().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_turns_lose_no_append() {
        let (_dir, relay) = relay_with(ScriptedBackend::replying("same"));
        relay.handle_turn("seed").await.unwrap();
        let initial = relay.history().len();
        let relay = Arc::new(relay);

        let mut handles = Vec::new();
        for i in 0..32 {
            let relay = Arc::clone(&relay);
            handles.push(tokio::spawn(async move {
                relay.handle_turn(&format!("turn {}", i)).await
            }));
        }

        let mut completed = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                completed += 1;
            }
        }

        assert_eq!(completed, 32);
        assert_eq!(relay.history().len(), initial + 2 * completed);
        assert_eq!(relay.store().file().load().len(), initial + 2 * completed);
    }
}
