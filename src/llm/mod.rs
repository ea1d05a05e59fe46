//! Inference client trait and implementations.
//!
//! This module provides the abstraction for talking to an OpenAI-compatible
//! chat-completions service. The rest of the application only sees the
//! [`InferenceClient`] trait: an ordered message list in, reply text out.
//!
//! # Implementations
//!
//! - [`ChatCompletionsClient`]: non-streaming `/v1/chat/completions` client

pub mod chat_completions;
pub mod provider;

pub use chat_completions::ChatCompletionsClient;
pub use provider::Provider;

/// LLM connection and model settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Base URL for the LLM API (e.g., `https://api.openai.com`).
    pub base_url: String,
    /// Optional API key for authentication.
    pub api_key: Option<String>,
    /// Model identifier (e.g., `gpt-4o-mini`).
    pub model: String,
    /// Provider type (auto-detected from `base_url`).
    pub provider: Provider,
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content of the message.
    pub content: String,
}

impl Message {
    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
}

/// Trait for non-streaming inference clients.
///
/// Implementations take the full ordered prompt and return the generated
/// reply text. A failed call is terminal for the current request; callers
/// own retry decisions.
#[async_trait::async_trait]
pub trait InferenceClient: Send + Sync {
    /// Generate a reply for the given ordered message list.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream request fails or the response
    /// cannot be interpreted.
    async fn infer(&self, messages: &[Message]) -> anyhow::Result<String>;
}
