//! Session store control protocol.
//!
//! The store is driven through three command shapes, mirrored from its
//! JSON wire form: `{"type":"init"}`, `{"type":"append","message":{...}}`
//! and `{"type":"history"}`. `init` and `append` answer with a bare
//! acknowledgment, `history` with the full message list. A payload that
//! does not parse, or that names an unknown command type, is rejected
//! before any state is touched.

use serde::{Deserialize, Serialize};

use crate::llm::Message;

use super::SessionStore;

/// A control command addressed to one session's log.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SessionCommand {
    /// Reset the session's log to empty.
    Init,
    /// Append one message at the end of the log.
    Append {
        /// The message to append.
        message: Message,
    },
    /// Read the full ordered log.
    History,
}

/// Reply to a [`SessionCommand`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SessionReply {
    /// Empty acknowledgment (`init`, `append`).
    Ack,
    /// History payload (`history`).
    History {
        /// The full ordered message sequence.
        history: Vec<Message>,
    },
}

/// Rejection of a malformed control payload.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The payload was not valid JSON or named an unknown command type.
    #[error("invalid session command: {0}")]
    InvalidCommand(#[from] serde_json::Error),
}

impl SessionStore {
    /// Execute a typed control command against the addressed session.
    ///
    /// Commands against a session that does not exist yet treat it as
    /// empty: `init` and `append` create it, `history` answers with an
    /// empty list without creating anything.
    pub fn execute(&self, session_id: &str, command: SessionCommand) -> SessionReply {
        match command {
            SessionCommand::Init => {
                self.get_or_create(session_id).initialize();
                SessionReply::Ack
            }
            SessionCommand::Append { message } => {
                self.get_or_create(session_id).append(message);
                SessionReply::Ack
            }
            SessionCommand::History => {
                let history = self
                    .get(session_id)
                    .map(|log| log.read_all())
                    .unwrap_or_default();
                SessionReply::History { history }
            }
        }
    }

    /// Parse and execute a raw JSON control payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidCommand`] for unparseable payloads
    /// or unrecognized command types; stored history is left untouched in
    /// either case.
    pub fn execute_raw(&self, session_id: &str, payload: &[u8]) -> Result<SessionReply, ProtocolError> {
        let command: SessionCommand = serde_json::from_slice(payload)?;
        Ok(self.execute(session_id, command))
    }
}
