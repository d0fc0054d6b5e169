//! Typing-playback view state for a chat front-end.
//!
//! Enforces the exchange lifecycle:
//! - Idle -> Loading (message submitted, transcript cleared)
//! - Loading -> Typing (reply arrived, revealing characters)
//! - Typing -> Idle (reveal finished, reply highlighted)
//! - Loading -> Idle (request failed or reply empty)
//!
//! Every visible change is published as a `ViewSnapshot` on a broadcast
//! channel so a renderer can redraw without polling.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use echo_core::types::Sender;

use crate::client::ChatTransport;

/// Delay between two revealed characters.
pub const CHAR_INTERVAL: Duration = Duration::from_millis(15);

/// How long a finished reply stays marked as new.
pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(2000);

pub const GREETING: &str = "Hello! I'm Echo, your AI companion. How can I help you today?";

pub const CLEARED_GREETING: &str = "Conversation cleared. How can I help you today?";

/// Snapshots buffered per subscriber before older ones are dropped.
pub const EVENT_CAPACITY: usize = 1024;

/// Shown instead of a reply when the exchange fails.
pub const FALLBACK_ERROR: &str =
    "Sorry, I encountered an error talking to the AI. Please try again.";

/// Phase of the current exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackPhase {
    /// Ready for input.
    Idle,
    /// Waiting for the relay to answer.
    Loading,
    /// Revealing the reply.
    Typing,
}

impl fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackPhase::Idle => write!(f, "Idle"),
            PlaybackPhase::Loading => write!(f, "Loading"),
            PlaybackPhase::Typing => write!(f, "Typing"),
        }
    }
}

impl PlaybackPhase {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &PlaybackPhase) -> bool {
        matches!(
            (self, target),
            (PlaybackPhase::Idle, PlaybackPhase::Loading)
                | (PlaybackPhase::Loading, PlaybackPhase::Typing)
                | (PlaybackPhase::Typing, PlaybackPhase::Idle)
                | (PlaybackPhase::Loading, PlaybackPhase::Idle)
        )
    }
}

/// A message as the front-end displays it.
///
/// The `id` is local to this view and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl RenderedMessage {
    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::Ai,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub phase: PlaybackPhase,
    pub messages: Vec<RenderedMessage>,
    pub is_new_message: bool,
}

/// Result of a `send_message` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Reply received and fully revealed.
    Delivered,
    /// The exchange failed and the fallback message is shown.
    Failed,
    /// Blank input, nothing sent.
    Ignored,
    /// An exchange is already in progress.
    Busy,
}

#[derive(Debug, Clone, Copy)]
pub struct PlaybackTiming {
    pub char_interval: Duration,
    pub highlight: Duration,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self {
            char_interval: CHAR_INTERVAL,
            highlight: HIGHLIGHT_DURATION,
        }
    }
}

struct ViewState {
    phase: PlaybackPhase,
    messages: Vec<RenderedMessage>,
    is_new_message: bool,
    /// Bumped on each highlight so a stale timer does not clear a newer one.
    highlight_generation: u64,
}

impl ViewState {
    fn transition(&mut self, target: PlaybackPhase) -> bool {
        if self.phase.can_transition_to(&target) {
            tracing::debug!("Playback phase: {} -> {}", self.phase, target);
            self.phase = target;
            true
        } else {
            false
        }
    }

    fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            phase: self.phase,
            messages: self.messages.clone(),
            is_new_message: self.is_new_message,
        }
    }
}

/// Client-side chat view: render list, exchange phase, and highlight flag.
///
/// Cloning yields another handle to the same view.
#[derive(Clone)]
pub struct ChatView {
    transport: Arc<dyn ChatTransport>,
    state: Arc<Mutex<ViewState>>,
    events: broadcast::Sender<ViewSnapshot>,
    timing: PlaybackTiming,
}

impl ChatView {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self::with_timing(transport, PlaybackTiming::default())
    }

    pub fn with_timing(transport: Arc<dyn ChatTransport>, timing: PlaybackTiming) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transport,
            state: Arc::new(Mutex::new(ViewState {
                phase: PlaybackPhase::Idle,
                messages: vec![RenderedMessage::ai(GREETING)],
                is_new_message: false,
                highlight_generation: 0,
            })),
            events,
            timing,
        }
    }

    /// Receive every snapshot published from now on.
    ///
    /// A reply longer than `EVENT_CAPACITY` characters publishes more frames
    /// than the channel holds. A receiver that falls behind gets
    /// `RecvError::Lagged` and should redraw from `snapshot()`, which always
    /// holds the current frame.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewSnapshot> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.lock().snapshot()
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.lock().phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == PlaybackPhase::Loading
    }

    pub fn is_typing(&self) -> bool {
        self.phase() == PlaybackPhase::Typing
    }

    pub fn messages(&self) -> Vec<RenderedMessage> {
        self.lock().messages.clone()
    }

    /// Submit a message and play back the reply.
    ///
    /// Returns once the view is `Idle` again. Blank input is ignored and a
    /// submission during an exchange is rejected.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Ignored;
        }

        {
            let mut state = self.lock();
            if !state.transition(PlaybackPhase::Loading) {
                return SendOutcome::Busy;
            }
            state.messages.clear();
            state.is_new_message = false;
            self.publish(&state);
        }

        match self.transport.send_chat(text).await {
            Ok(reply) => {
                self.play(&reply).await;
                SendOutcome::Delivered
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat exchange failed");
                let mut state = self.lock();
                state.transition(PlaybackPhase::Idle);
                state.messages = vec![RenderedMessage::ai(FALLBACK_ERROR)];
                self.publish(&state);
                SendOutcome::Failed
            }
        }
    }

    /// Clear the relay's memory and reset the transcript.
    ///
    /// Only acts while `Idle`, like the input box. Returns `false` if an
    /// exchange is in progress or the relay could not be cleared; in the
    /// latter case the transcript is reset anyway.
    pub async fn clear_history(&self) -> bool {
        if self.phase() != PlaybackPhase::Idle {
            tracing::debug!("Clear ignored during an exchange");
            return false;
        }

        let cleared = match self.transport.clear_memory().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to clear relay memory");
                false
            }
        };

        let mut state = self.lock();
        // A message submitted while the clear was in flight owns the transcript now.
        if state.phase != PlaybackPhase::Idle {
            return cleared;
        }
        state.messages = vec![RenderedMessage::ai(CLEARED_GREETING)];
        state.is_new_message = false;
        self.publish(&state);
        cleared
    }

    async fn play(&self, reply: &str) {
        let mut message = RenderedMessage::ai(String::with_capacity(reply.len()));

        for c in reply.chars() {
            {
                let mut state = self.lock();
                if state.phase == PlaybackPhase::Loading {
                    state.transition(PlaybackPhase::Typing);
                }
                message.text.push(c);
                state.messages = vec![message.clone()];
                self.publish(&state);
            }
            tokio::time::sleep(self.timing.char_interval).await;
        }

        let generation = {
            let mut state = self.lock();
            state.transition(PlaybackPhase::Idle);
            state.is_new_message = true;
            state.highlight_generation += 1;
            self.publish(&state);
            state.highlight_generation
        };

        let view = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(view.timing.highlight).await;
            let mut state = view.lock();
            if state.highlight_generation == generation && state.is_new_message {
                state.is_new_message = false;
                view.publish(&state);
            }
        });
    }

    fn publish(&self, state: &ViewState) {
        // No receivers is fine; the snapshot is still readable on demand.
        let _ = self.events.send(state.snapshot());
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
