//! Parley
//!
//! A minimal chat-session backend: accepts user messages over HTTP,
//! forwards conversation context to an OpenAI-compatible inference
//! service, and keeps per-session message history so multi-turn
//! conversations retain context.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP server with permissive CORS and a
//!   static-asset fallback
//! - **Session Store**: per-session append-only message log, one owning
//!   instance per session key
//! - **Chat**: turn handler that builds the prompt, calls inference, and
//!   records the exchange only on success
//! - **LLM**: non-streaming chat-completions client behind a trait
//!
//! # Modules
//!
//! - [`chat`]: chat turn handling
//! - [`config`]: layered application configuration
//! - [`error`]: API error taxonomy and response mapping
//! - [`llm`]: inference client trait and implementations
//! - [`server`]: router and HTTP handlers
//! - [`session`]: conversation and session management

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod server;
pub mod session;

use std::sync::Arc;

use chat::ChatService;
use session::SessionStore;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Session store for conversation history.
    pub sessions: SessionStore,
    /// Chat turn handler.
    pub chat: Arc<ChatService>,
}
