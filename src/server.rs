//! HTTP server: routing, CORS, and the API handlers.
//!
//! Three JSON endpoints (`/api/session`, `/api/chat`, `/api/history`) plus
//! a static-asset fallback. Every response carries permissive cross-origin
//! headers so any browser-based client can call the API, and `OPTIONS`
//! preflights are answered directly with an empty 204.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, Request, State},
    extract::rejection::JsonRejection,
    handler::HandlerWithoutStateExt,
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::chat::{ChatError, ChatService};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::llm::{ChatCompletionsClient, LlmSettings, Message};
use crate::session::{SessionCommand, SessionReply, SessionStore};

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>, settings: LlmSettings) -> anyhow::Result<()> {
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        "LLM configuration loaded"
    );

    let sessions = SessionStore::new();
    let client = Arc::new(ChatCompletionsClient::new(settings));
    let chat = Arc::new(ChatService::new(
        sessions.clone(),
        client,
        config.chat.system_prompt.clone(),
        config.chat.history_window,
    ));

    let state = AppState { sessions, chat };
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new("static")
        .append_index_html_on_directories(true)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(not_found.into_service());

    // Panic boundary sits inside the CORS middleware so even the generic
    // 500 carries the cross-origin headers.
    Router::new()
        .route("/api/session", post(api_create_session))
        .route("/api/chat", post(api_chat))
        .route("/api/history", get(api_history))
        .fallback_service(static_files)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Convert an unanticipated handler panic into the generic server error.
///
/// The panic message is logged by the error mapping; no internal detail
/// reaches the caller.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    ApiError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}

/// Answer `OPTIONS` preflights with an empty 204 and stamp permissive
/// cross-origin headers onto every other response.
async fn cors(req: Request, next: Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

/// Fallback for paths with no matching route or static asset.
async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Response from session creation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionCreated {
    /// Opaque identifier for the new session.
    session_id: String,
}

/// Request body for chat API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    /// User message content.
    #[serde(default)]
    message: Option<String>,
    /// Optional session ID (generates a new one if not provided).
    #[serde(default)]
    session_id: Option<String>,
}

/// Response from chat API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponse {
    /// Session ID for this conversation.
    session_id: String,
    /// The assistant's reply.
    reply: String,
    /// Full updated conversation history.
    history: Vec<Message>,
}

/// Query parameters for the history endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryQuery {
    #[serde(default)]
    session_id: Option<String>,
}

/// Response from the history endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryResponse {
    session_id: String,
    history: Vec<Message>,
}

/// POST /api/session - Create a session with empty history.
async fn api_create_session(State(state): State<AppState>) -> Json<SessionCreated> {
    let session_id = uuid::Uuid::new_v4().to_string();
    state.sessions.execute(&session_id, SessionCommand::Init);

    tracing::info!(session_id = %session_id, "Created session");
    Json(SessionCreated { session_id })
}

/// POST /api/chat - Run one chat turn and return the updated transcript.
async fn api_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected unparseable chat body");
        ApiError::BadRequest("Invalid JSON".to_string())
    })?;

    let message = req.message.unwrap_or_default().trim().to_string();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message is required".to_string()));
    }

    let session_id = req
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::info!(
        session_id = %session_id,
        message_len = message.len(),
        "Received chat request"
    );

    match state.chat.take_turn(&session_id, &message).await {
        Ok(outcome) => Ok(Json(ChatResponse {
            session_id,
            reply: outcome.reply,
            history: outcome.history,
        })),
        Err(ChatError::Upstream(e)) => {
            tracing::error!(session_id = %session_id, error = ?e, "Inference call failed");
            Err(ApiError::Upstream { session_id })
        }
    }
}

/// GET /api/history - Get a session's full transcript.
///
/// An unknown session answers with an empty history, not an error.
async fn api_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Some(session_id) = query.session_id.filter(|id| !id.is_empty()) else {
        return Err(ApiError::BadRequest("sessionId is required".to_string()));
    };

    let history = match state.sessions.execute(&session_id, SessionCommand::History) {
        SessionReply::History { history } => history,
        SessionReply::Ack => Vec::new(),
    };

    Ok(Json(HistoryResponse {
        session_id,
        history,
    }))
}
