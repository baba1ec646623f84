//! The HTTP transport's routes and session rules.

#![cfg(feature = "http")]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use tower::ServiceExt;

use capstan_mcp::capabilities::build_dispatcher;
use capstan_mcp::config::ServerConfig;
use capstan_mcp::transport::http::SESSION_HEADER;
use capstan_mcp::transport::HttpTransport;
use capstan_mcp::types::error_codes;

fn transport() -> HttpTransport {
    let dispatcher = build_dispatcher(&ServerConfig::default()).unwrap();
    HttpTransport::new(Arc::new(dispatcher), Duration::from_secs(5))
}

fn post(session: Option<&str>, body: Value) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json");
    if let Some(id) = session {
        req = req.header(SESSION_HEADER, id);
    }
    req.body(Body::from(body.to_string())).unwrap()
}

fn delete(session: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri("/mcp")
        .header(SESSION_HEADER, session)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn initialize() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "http-test", "version": "1.0"}
        }
    })
}

async fn open_session(t: &HttpTransport) -> String {
    let resp = t.router().oneshot(post(None, initialize())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    resp.headers()[SESSION_HEADER].to_str().unwrap().to_string()
}

#[tokio::test]
async fn test_initialize_opens_session() {
    let t = transport();
    let resp = t.router().oneshot(post(None, initialize())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let id = resp.headers()[SESSION_HEADER].to_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&id).is_ok());

    let body = json_body(resp).await;
    assert_eq!(body["result"]["serverInfo"]["name"], "capstan-mcp");
    assert_eq!(t.sessions().count().await, 1);
}

#[tokio::test]
async fn test_session_header_rules() {
    let t = transport();
    let list = json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"});

    let resp = t.router().oneshot(post(None, list.clone())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = t
        .router()
        .oneshot(post(Some("00000000-0000-4000-8000-000000000000"), list.clone()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let id = open_session(&t).await;
    let resp = t.router().oneshot(post(Some(&id), list)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["result"]["tools"][0]["name"], "hello_world");
}

#[tokio::test]
async fn test_tool_call_and_notification() {
    let t = transport();
    let id = open_session(&t).await;

    let resp = t
        .router()
        .oneshot(post(
            Some(&id),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let resp = t
        .router()
        .oneshot(post(
            Some(&id),
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {"name": "calculate", "arguments": {"operation": "divide", "x": 1, "y": 0}}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["result"]["isError"], true);
    assert_eq!(body["result"]["content"][0]["text"], "cannot divide by zero");
}

#[tokio::test]
async fn test_delete_ends_session() {
    let t = transport();
    let id = open_session(&t).await;

    let resp = t.router().oneshot(delete(&id)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = t.router().oneshot(delete(&id)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = t
        .router()
        .oneshot(post(Some(&id), json!({"jsonrpc": "2.0", "id": 4, "method": "ping"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_idle_session_expires() {
    let dispatcher = build_dispatcher(&ServerConfig::default()).unwrap();
    let t = HttpTransport::with_idle_timeout(
        Arc::new(dispatcher),
        Duration::from_secs(5),
        Duration::from_millis(20),
    );
    let id = open_session(&t).await;

    tokio::time::sleep(Duration::from_millis(60)).await;

    let resp = t
        .router()
        .oneshot(post(Some(&id), json!({"jsonrpc": "2.0", "id": 5, "method": "ping"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(t.sessions().count().await, 0);
}

#[tokio::test]
async fn test_malformed_body() {
    let t = transport();
    let req = Request::builder()
        .method("POST")
        .uri("/mcp")
        .body(Body::from("{\"broken\":"))
        .unwrap();

    let resp = t.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["id"], Value::Null);
    assert_eq!(body["error"]["code"], error_codes::PARSE_ERROR);
}

#[tokio::test]
async fn test_health() {
    let t = transport();
    open_session(&t).await;

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = t.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"], 1);
}
