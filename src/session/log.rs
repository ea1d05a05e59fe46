//! Append-only conversation log and session storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::llm::Message;

/// One session's conversation log.
///
/// The log is append-only: messages are never mutated or removed once
/// written, and reads always replay them in append order. Cloning is cheap
/// and clones share the same underlying log.
#[derive(Debug)]
pub struct SessionLog {
    inner: Arc<LogInner>,
}

#[derive(Debug)]
struct LogInner {
    /// Unique session identifier.
    id: String,
    /// Ordered conversation messages.
    messages: RwLock<Vec<Message>>,
    /// Session creation time.
    created_at: DateTime<Utc>,
}

impl Clone for SessionLog {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SessionLog {
    fn new(id: String) -> Self {
        Self {
            inner: Arc::new(LogInner {
                id,
                messages: RwLock::new(Vec::new()),
                created_at: Utc::now(),
            }),
        }
    }

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Get the session creation time.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// Reset the log to empty.
    ///
    /// Idempotent: calling this on an already-empty log is a no-op.
    pub fn initialize(&self) {
        self.inner.messages.write().unwrap().clear();
    }

    /// Append a message at the end of the log, preserving prior contents.
    pub fn append(&self, message: Message) {
        self.inner.messages.write().unwrap().push(message);
    }

    /// Get the full ordered message sequence.
    ///
    /// A log that was never written to yields an empty list; absence of
    /// data is not an error.
    #[must_use]
    pub fn read_all(&self) -> Vec<Message> {
        self.inner.messages.read().unwrap().clone()
    }

    /// Get the number of messages in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.messages.read().unwrap().len()
    }

    /// Check if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Thread-safe store mapping session keys to their logs.
///
/// Each key resolves to exactly one [`SessionLog`] instance for the
/// lifetime of the store; `get_or_create` never replaces an existing log.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    sessions: RwLock<HashMap<String, SessionLog>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a new session store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                sessions: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Create a new session with a generated ID and return its log.
    #[must_use]
    pub fn create(&self) -> SessionLog {
        let id = Uuid::new_v4().to_string();
        self.get_or_create(&id)
    }

    /// Get a session's log by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<SessionLog> {
        let guard = self.inner.sessions.read().unwrap();
        guard.get(id).cloned()
    }

    /// Get a session's log by ID, creating it if it doesn't exist.
    ///
    /// Insertion happens under the write lock, so two concurrent callers
    /// with the same key always end up sharing one log instance.
    #[must_use]
    pub fn get_or_create(&self, id: &str) -> SessionLog {
        // Fast path for existing sessions.
        {
            let guard = self.inner.sessions.read().unwrap();
            if let Some(log) = guard.get(id) {
                return log.clone();
            }
        }

        let mut guard = self.inner.sessions.write().unwrap();
        guard
            .entry(id.to_string())
            .or_insert_with(|| SessionLog::new(id.to_string()))
            .clone()
    }

    /// Get the number of sessions in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.sessions.read().unwrap().len()
    }

    /// Check if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// List all session IDs.
    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        self.inner
            .sessions
            .read()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    }
}
