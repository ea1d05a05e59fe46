//! End-to-end API tests against the real router with a stubbed
//! inference client.

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{Value, json};

use parley::AppState;
use parley::chat::ChatService;
use parley::llm::{InferenceClient, Message};
use parley::server::build_router;
use parley::session::SessionStore;

/// Inference stub with a fixed outcome.
struct StubInference {
    reply: Option<&'static str>,
}

#[async_trait::async_trait]
impl InferenceClient for StubInference {
    async fn infer(&self, _messages: &[Message]) -> anyhow::Result<String> {
        match self.reply {
            Some(r) => Ok(r.to_string()),
            None => Err(anyhow::anyhow!("upstream unavailable")),
        }
    }
}

fn test_server(reply: Option<&'static str>) -> (TestServer, SessionStore) {
    let sessions = SessionStore::new();
    let chat = Arc::new(ChatService::new(
        sessions.clone(),
        Arc::new(StubInference { reply }),
        "You are a helpful AI.",
        None,
    ));
    let state = AppState {
        sessions: sessions.clone(),
        chat,
    };
    let server = TestServer::new(build_router(state)).expect("failed to build test server");
    (server, sessions)
}

#[tokio::test]
async fn create_session_returns_id_with_empty_history() {
    let (server, _sessions) = test_server(Some("hi"));

    let resp = server.post("/api/session").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    let session_id = body["sessionId"].as_str().expect("sessionId missing");
    assert!(!session_id.is_empty());

    let resp = server
        .get("/api/history")
        .add_query_param("sessionId", session_id)
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["sessionId"], session_id);
    assert_eq!(body["history"], json!([]));
}

#[tokio::test]
async fn chat_turn_records_user_then_assistant() {
    let (server, sessions) = test_server(Some("mock reply"));

    let resp = server.post("/api/session").await;
    let session_id = resp.json::<Value>()["sessionId"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = server
        .post("/api/chat")
        .json(&json!({"sessionId": session_id, "message": "hello"}))
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["sessionId"], session_id);
    assert_eq!(body["reply"], "mock reply");
    assert_eq!(
        body["history"],
        json!([
            {"role": "user", "content": "hello"},
            {"role": "assistant", "content": "mock reply"},
        ])
    );

    // Stored history matches the response exactly.
    let stored = sessions.get(&session_id).unwrap().read_all();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].content, "hello");
    assert_eq!(stored[1].content, "mock reply");
}

#[tokio::test]
async fn chat_without_session_id_generates_one() {
    let (server, sessions) = test_server(Some("ok"));

    let resp = server
        .post("/api/chat")
        .json(&json!({"message": "hello"}))
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    let session_id = body["sessionId"].as_str().unwrap();
    assert!(!session_id.is_empty());
    assert!(sessions.get(session_id).is_some());
}

#[tokio::test]
async fn empty_message_is_rejected_without_side_effects() {
    let (server, sessions) = test_server(Some("ok"));

    let resp = server
        .post("/api/chat")
        .json(&json!({"message": ""}))
        .await;
    resp.assert_status_bad_request();
    assert!(sessions.is_empty());

    let resp = server
        .post("/api/chat")
        .json(&json!({"message": "   "}))
        .await;
    resp.assert_status_bad_request();
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn unparseable_body_is_rejected() {
    let (server, sessions) = test_server(Some("ok"));

    let resp = server
        .post("/api/chat")
        .content_type("application/json")
        .text("{not json")
        .await;
    resp.assert_status_bad_request();
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn history_requires_session_id() {
    let (server, _sessions) = test_server(Some("ok"));

    let resp = server.get("/api/history").await;
    resp.assert_status_bad_request();
}

#[tokio::test]
async fn history_for_unknown_session_is_empty_not_error() {
    let (server, sessions) = test_server(Some("ok"));

    let resp = server
        .get("/api/history")
        .add_query_param("sessionId", "never-seen")
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["sessionId"], "never-seen");
    assert_eq!(body["history"], json!([]));

    // The read alone must not create the session.
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn inference_failure_is_502_and_history_unchanged() {
    let (server, sessions) = test_server(Some("first"));

    let resp = server
        .post("/api/chat")
        .json(&json!({"sessionId": "abc", "message": "hello"}))
        .await;
    resp.assert_status_ok();
    let before = sessions.get("abc").unwrap().len();

    // Same store, but wired to an inference client that always fails.
    let chat = Arc::new(ChatService::new(
        sessions.clone(),
        Arc::new(StubInference { reply: None }),
        "You are a helpful AI.",
        None,
    ));
    let state = AppState {
        sessions: sessions.clone(),
        chat,
    };
    let failing = TestServer::new(build_router(state)).expect("failed to build test server");

    let resp = failing
        .post("/api/chat")
        .json(&json!({"sessionId": "abc", "message": "again"}))
        .await;
    assert_eq!(resp.status_code(), 502);
    let body: Value = resp.json();
    assert_eq!(body["sessionId"], "abc");
    assert!(body["error"].as_str().unwrap().contains("retry"));

    assert_eq!(sessions.get("abc").unwrap().len(), before);
}

#[tokio::test]
async fn concurrent_turns_on_one_session_both_land_whole() {
    let (server, sessions) = test_server(Some("reply"));
    let server = Arc::new(server);

    let a = {
        let server = Arc::clone(&server);
        async move {
            server
                .post("/api/chat")
                .json(&json!({"sessionId": "shared", "message": "from-a"}))
                .await
        }
    };
    let b = {
        let server = Arc::clone(&server);
        async move {
            server
                .post("/api/chat")
                .json(&json!({"sessionId": "shared", "message": "from-b"}))
                .await
        }
    };

    let (ra, rb) = tokio::join!(a, b);
    ra.assert_status_ok();
    rb.assert_status_ok();

    let stored = sessions.get("shared").unwrap().read_all();
    assert_eq!(stored.len(), 4);
    let contents: Vec<&str> = stored.iter().map(|m| m.content.as_str()).collect();
    assert!(contents.contains(&"from-a"));
    assert!(contents.contains(&"from-b"));
    // User message directly precedes its assistant reply in both turns.
    for (i, m) in stored.iter().enumerate() {
        if m.content.starts_with("from-") {
            assert_eq!(stored[i + 1].content, "reply");
        }
    }
}

/// Inference stub that panics mid-request.
struct PanickingInference;

#[async_trait::async_trait]
impl InferenceClient for PanickingInference {
    async fn infer(&self, _messages: &[Message]) -> anyhow::Result<String> {
        panic!("inference client blew up");
    }
}

#[tokio::test]
async fn handler_panic_becomes_generic_500_with_cors_headers() {
    let sessions = SessionStore::new();
    let chat = Arc::new(ChatService::new(
        sessions.clone(),
        Arc::new(PanickingInference),
        "You are a helpful AI.",
        None,
    ));
    let state = AppState {
        sessions: sessions.clone(),
        chat,
    };
    let server = TestServer::new(build_router(state)).expect("failed to build test server");

    let resp = server
        .post("/api/chat")
        .json(&json!({"sessionId": "abc", "message": "hello"}))
        .await;
    assert_eq!(resp.status_code(), 500);

    // Generic body only; the panic message must not leak.
    let body = resp.text();
    assert_eq!(body, "Server error");
    assert!(!body.contains("blew up"));

    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .unwrap()
            .to_str()
            .unwrap(),
        "*"
    );

    // The failed turn wrote nothing.
    assert!(sessions.get("abc").unwrap().is_empty());
}

#[tokio::test]
async fn unknown_path_is_404() {
    let (server, _sessions) = test_server(Some("ok"));

    let resp = server.get("/api/no-such-endpoint").await;
    resp.assert_status_not_found();

    let resp = server.post("/definitely/not/here").await;
    resp.assert_status_not_found();
}

#[tokio::test]
async fn options_preflight_is_204_with_cors_headers() {
    let (server, _sessions) = test_server(Some("ok"));

    let resp = server.method(axum::http::Method::OPTIONS, "/api/chat").await;
    assert_eq!(resp.status_code(), 204);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .unwrap()
            .to_str()
            .unwrap(),
        "*"
    );
    assert_eq!(
        resp.headers()
            .get("access-control-allow-methods")
            .unwrap()
            .to_str()
            .unwrap(),
        "GET,POST,OPTIONS"
    );
}

#[tokio::test]
async fn all_responses_carry_cors_headers() {
    let (server, _sessions) = test_server(Some("ok"));

    let resp = server.post("/api/session").await;
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .unwrap()
            .to_str()
            .unwrap(),
        "*"
    );

    let resp = server.get("/api/history").await; // 400 path
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .unwrap()
            .to_str()
            .unwrap(),
        "*"
    );
}
