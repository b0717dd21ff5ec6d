use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use parley_core::chat::coordinator::CONTENT_FILTER_APOLOGY;
use parley_core::chat::service::{ChatService, ChatServiceOptions};
use parley_core::llm::provider::{FragmentStream, LlmProvider};
use parley_core::transcript::memory::MemoryTranscriptStore;
use parley_infra::llm::echo::EchoProvider;
use parley_infra::store::AnyTranscriptStore;
use parley_types::llm::{GenerationError, GenerationRequest};

use crate::http::router::build_router;
use crate::state::AppState;

/// Provider whose every request is rejected by the content filter.
struct FilteredProvider;

impl LlmProvider for FilteredProvider {
    fn name(&self) -> &str {
        "filtered"
    }

    fn stream(&self, _request: GenerationRequest) -> FragmentStream {
        Box::pin(futures_util::stream::once(async {
            Err::<String, _>(GenerationError::ContentFiltered(
                "content management policy".to_string(),
            ))
        }))
    }
}

fn app_with(provider: Arc<dyn LlmProvider>) -> Router {
    let store = Arc::new(AnyTranscriptStore::Memory(MemoryTranscriptStore::new()));
    let service = ChatService::new(store, provider, ChatServiceOptions::default());
    build_router(AppState::new(service), None)
}

fn app() -> Router {
    app_with(Arc::new(EchoProvider::new()))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body)
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn stream_turn(app: &Router, user: &str, session: &str, message: &str) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/api/chat/stream",
            json!({ "userID": user, "sessionID": session, "message": message }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_start_generates_unique_session_ids() {
    let app = app();

    let (status, first) = send_json(&app, post_json("/api/chat/start", json!({ "userID": "alice" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    let first_id = first["sessionID"].as_str().unwrap().to_string();
    assert!(!first_id.is_empty());

    let (_, second) = send_json(&app, post_json("/api/chat/start", json!({ "userID": "alice" }))).await;
    assert_ne!(second["sessionID"].as_str().unwrap(), first_id);
}

#[tokio::test]
async fn test_start_keeps_given_session_id() {
    let (status, body) = send_json(
        &app(),
        post_json("/api/chat/start", json!({ "userID": "alice", "sessionID": "s-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessionID"], "s-1");
}

#[tokio::test]
async fn test_start_without_user_is_bad_request() {
    let (status, body) = send_json(&app(), post_json("/api/chat/start", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userID is required");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/chat/stream")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send_json(&app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request format");
}

#[tokio::test]
async fn test_wrong_method_is_405_with_json_error() {
    let app = app();

    let (status, body) = send_json(&app, get("/api/chat/start")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method not allowed");

    let (status, _) = send_json(&app, post_json("/api/chat/history", json!({}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_stream_missing_fields_name_the_field() {
    let app = app();
    let cases = [
        (json!({ "sessionID": "s", "message": "hi" }), "userID is required"),
        (json!({ "userID": "u", "message": "hi" }), "sessionID is required"),
        (json!({ "userID": "u", "sessionID": "s" }), "message is required"),
    ];

    for (body, expected) in cases {
        let (status, response) = send_json(&app, post_json("/api/chat/stream", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], expected);
    }
}

#[tokio::test]
async fn test_stream_is_plain_text_and_commits_turn() {
    let app = app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/chat/stream",
            json!({ "userID": "alice", "sessionID": "s-1", "message": "Hello there" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/plain"));
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"Hello there");

    let (status, history) = send_json(&app, get("/api/chat/history?userID=alice&sessionID=s-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        history,
        json!({ "messages": [
            { "type": "human", "content": "Hello there" },
            { "type": "ai", "content": "Hello there" },
        ]})
    );
}

#[tokio::test]
async fn test_filtered_generation_streams_apology_and_keeps_human_input() {
    let app = app_with(Arc::new(FilteredProvider));

    let body = stream_turn(&app, "alice", "s-1", "something rude").await;
    assert_eq!(body, CONTENT_FILTER_APOLOGY);

    let (_, history) = send_json(&app, get("/api/chat/history?userID=alice&sessionID=s-1")).await;
    assert_eq!(
        history,
        json!({ "messages": [{ "type": "human", "content": "something rude" }] })
    );
}

#[tokio::test]
async fn test_history_of_unknown_session_is_empty() {
    let (status, body) = send_json(&app(), get("/api/chat/history?userID=alice&sessionID=nope")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "messages": [] }));
}

#[tokio::test]
async fn test_history_requires_both_ids() {
    let app = app();

    let (status, body) = send_json(&app, get("/api/chat/history?sessionID=s-1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userID is required");

    let (status, body) = send_json(&app, get("/api/chat/history?userID=alice")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "sessionID is required");
}

#[tokio::test]
async fn test_conversations_are_partitioned_by_user() {
    let app = app();

    stream_turn(&app, "alice", "a-1", "one").await;
    stream_turn(&app, "alice", "a-1", "two").await;
    stream_turn(&app, "alice", "a-2", "three").await;
    stream_turn(&app, "bob", "b-1", "four").await;
    // Started but never used: no document, so not listed.
    send(&app, post_json("/api/chat/start", json!({ "userID": "alice", "sessionID": "a-3" }))).await;

    let (status, body) = send_json(&app, get("/api/user/conversations?userID=alice")).await;
    assert_eq!(status, StatusCode::OK);
    let mut conversations = body["conversations"].as_array().unwrap().clone();
    conversations.sort_by_key(|c| c["sessionID"].as_str().unwrap().to_string());
    assert_eq!(
        conversations,
        vec![
            json!({ "sessionID": "a-1", "messageCount": 4 }),
            json!({ "sessionID": "a-2", "messageCount": 2 }),
        ]
    );

    let (_, body) = send_json(&app, get("/api/user/conversations?userID=carol")).await;
    assert_eq!(body, json!({ "conversations": [] }));
}

#[tokio::test]
async fn test_conversations_requires_user() {
    let (status, body) = send_json(&app(), get("/api/user/conversations")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userID is required");
}

#[tokio::test]
async fn test_delete_clears_transcript_and_allows_reuse() {
    let app = app();
    stream_turn(&app, "alice", "s-1", "first").await;

    let (status, body) = send_json(
        &app,
        post_json("/api/chat/delete", json!({ "userID": "alice", "sessionID": "s-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (_, history) = send_json(&app, get("/api/chat/history?userID=alice&sessionID=s-1")).await;
    assert_eq!(history, json!({ "messages": [] }));
    let (_, listing) = send_json(&app, get("/api/user/conversations?userID=alice")).await;
    assert_eq!(listing, json!({ "conversations": [] }));

    stream_turn(&app, "alice", "s-1", "again").await;
    let (_, history) = send_json(&app, get("/api/chat/history?userID=alice&sessionID=s-1")).await;
    assert_eq!(history["messages"].as_array().unwrap().len(), 2);
    assert_eq!(history["messages"][0]["content"], "again");
}

#[tokio::test]
async fn test_delete_requires_session() {
    let (status, body) = send_json(&app(), post_json("/api/chat/delete", json!({ "userID": "alice" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "sessionID is required");
}

#[tokio::test]
async fn test_health_reports_provider() {
    let (status, body) = send_json(&app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["provider"], "echo");
}

#[tokio::test]
async fn test_static_dir_served_as_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>parley</h1>").unwrap();

    let store = Arc::new(AnyTranscriptStore::Memory(MemoryTranscriptStore::new()));
    let service = ChatService::new(store, Arc::new(EchoProvider::new()), ChatServiceOptions::default());
    let app = build_router(AppState::new(service), Some(dir.path()));

    let (status, body) = send(&app, get("/index.html")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"<h1>parley</h1>");

    let (status, _) = send(&app, get("/missing.css")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
