//! Session and conversation history management.
//!
//! This module provides in-memory session storage for keeping conversation
//! state across requests. Each session is identified by an opaque string key
//! and owns one append-only message log.
//!
//! # Architecture
//!
//! - [`SessionLog`]: one session's ordered, append-only message sequence
//! - [`SessionStore`]: thread-safe map from session key to its single
//!   [`SessionLog`] instance
//! - [`SessionCommand`] / [`SessionReply`]: the store's control protocol
//!
//! Each key maps to exactly one log instance, and every mutation goes
//! through that instance's own lock, so concurrent appends to the same
//! session serialize while distinct sessions proceed in parallel.
//!
//! # Example
//!
//! ```rust
//! use parley::llm::Message;
//! use parley::session::SessionStore;
//!
//! let store = SessionStore::new();
//! let log = store.create();
//! log.append(Message::user("Hello!"));
//!
//! assert_eq!(log.read_all().len(), 1);
//! ```

mod log;
mod protocol;

pub use log::{SessionLog, SessionStore};
pub use protocol::{ProtocolError, SessionCommand, SessionReply};
