//! Chat turn handling.
//!
//! One turn: load the session's history, build the prompt (system
//! instruction, then history, then the new user message), call the
//! inference client, and on success append exactly two messages — the
//! user's, then the assistant's reply. An inference failure appends
//! nothing, so a failed turn never leaves a half-written conversation.

use std::sync::Arc;

use crate::llm::{InferenceClient, Message};
use crate::session::SessionStore;

/// Result of a completed chat turn.
#[derive(Debug)]
pub struct ChatOutcome {
    /// The assistant's reply text.
    pub reply: String,
    /// The full updated conversation history.
    pub history: Vec<Message>,
}

/// A failed chat turn.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The inference call failed. Retryable; no history was written.
    #[error("inference call failed: {0}")]
    Upstream(#[source] anyhow::Error),
}

/// Executes chat turns against the session store and inference client.
#[derive(Clone)]
pub struct ChatService {
    sessions: SessionStore,
    client: Arc<dyn InferenceClient>,
    system_prompt: String,
    history_window: Option<usize>,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("system_prompt", &self.system_prompt)
            .field("history_window", &self.history_window)
            .finish_non_exhaustive()
    }
}

impl ChatService {
    /// Create a new chat service.
    ///
    /// `history_window` bounds how many prior messages are sent upstream
    /// per turn; the stored log itself is never truncated.
    #[must_use]
    pub fn new(
        sessions: SessionStore,
        client: Arc<dyn InferenceClient>,
        system_prompt: impl Into<String>,
        history_window: Option<usize>,
    ) -> Self {
        Self {
            sessions,
            client,
            system_prompt: system_prompt.into(),
            history_window,
        }
    }

    /// Run one chat turn for the given session.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Upstream`] if the inference call fails; in
    /// that case the session's stored history is unchanged.
    pub async fn take_turn(
        &self,
        session_id: &str,
        user_message: &str,
    ) -> Result<ChatOutcome, ChatError> {
        let log = self.sessions.get_or_create(session_id);
        let history = log.read_all();

        let prompt = self.build_prompt(&history, user_message);
        tracing::debug!(
            session_id = %session_id,
            prompt_len = prompt.len(),
            history_len = history.len(),
            "Calling inference service"
        );

        let reply = self
            .client
            .infer(&prompt)
            .await
            .map_err(ChatError::Upstream)?;

        // Only a successful turn is recorded, user message first.
        log.append(Message::user(user_message));
        log.append(Message::assistant(reply.clone()));

        tracing::info!(
            session_id = %session_id,
            reply_len = reply.len(),
            message_count = log.len(),
            "Chat turn completed"
        );

        Ok(ChatOutcome {
            reply,
            history: log.read_all(),
        })
    }

    /// Assemble the ordered prompt: system instruction, prior history
    /// (optionally windowed to the most recent messages), new user message.
    fn build_prompt(&self, history: &[Message], user_message: &str) -> Vec<Message> {
        let window = match self.history_window {
            Some(n) if history.len() > n => &history[history.len() - n..],
            _ => history,
        };

        let mut prompt = Vec::with_capacity(window.len() + 2);
        prompt.push(Message::system(self.system_prompt.clone()));
        prompt.extend_from_slice(window);
        prompt.push(Message::user(user_message));
        prompt
    }
}
