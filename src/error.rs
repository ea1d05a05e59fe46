//! API error taxonomy and response mapping.
//!
//! Every handler failure funnels through [`ApiError`], which maps onto the
//! three externally visible failure classes: client input errors (400),
//! upstream inference failures (502, carrying the session id so the caller
//! can retry without losing its conversation), and unanticipated internal
//! faults (logged, generic 500).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Errors surfaced by the HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or incomplete client input. No side effects occurred.
    #[error("{0}")]
    BadRequest(String),

    /// The inference service failed. History was not mutated; the caller
    /// may retry with the same session id.
    #[error("inference upstream error for session {session_id}")]
    Upstream {
        /// Session the failed turn was addressed to.
        session_id: String,
    },

    /// Unanticipated internal fault.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Body of a 502 upstream-failure response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpstreamErrorBody {
    session_id: String,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Upstream { session_id } => (
                StatusCode::BAD_GATEWAY,
                Json(UpstreamErrorBody {
                    session_id,
                    error: "AI upstream error. Please retry.".to_string(),
                }),
            )
                .into_response(),
            Self::Internal(e) => {
                tracing::error!(error = ?e, "Unhandled internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
            }
        }
    }
}
