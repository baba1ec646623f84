//! The `http_request` tool against a local mock server.

use serde_json::json;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use capstan::{CallContext, Dispatcher, ToolCallResult};
use capstan_mcp::capabilities::build_dispatcher;
use capstan_mcp::config::ServerConfig;

fn dispatcher() -> Dispatcher {
    build_dispatcher(&ServerConfig::default()).unwrap()
}

async fn request(d: &Dispatcher, args: serde_json::Value) -> ToolCallResult {
    d.call_tool("http_request", Some(&args), CallContext::new()).await
}

#[tokio::test]
async fn test_get_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&server)
        .await;

    let d = dispatcher();
    let result = request(&d, json!({"method": "GET", "url": format!("{}/ping", server.uri())})).await;
    assert!(!result.is_error);
    assert_eq!(result.joined_text(), "Status: 200\nBody: pong");
}

#[tokio::test]
async fn test_error_status_is_still_success() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/items/9"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such item"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/boom"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&server)
        .await;

    let d = dispatcher();
    let result = request(&d, json!({"method": "DELETE", "url": format!("{}/items/9", server.uri())})).await;
    assert!(!result.is_error);
    assert_eq!(result.joined_text(), "Status: 404\nBody: no such item");

    let result = request(&d, json!({"method": "GET", "url": format!("{}/boom", server.uri())})).await;
    assert!(!result.is_error);
    assert_eq!(result.joined_text(), "Status: 503\nBody: down");
}

#[tokio::test]
async fn test_post_forwards_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(body_string("hello"))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .expect(1)
        .mount(&server)
        .await;

    let d = dispatcher();
    let result = request(
        &d,
        json!({"method": "POST", "url": format!("{}/echo", server.uri()), "body": "hello"}),
    )
    .await;
    assert_eq!(result.joined_text(), "Status: 201\nBody: created");
}

#[tokio::test]
async fn test_connection_failure_is_error() {
    // Bind and drop a listener to get a port nobody is serving.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let d = dispatcher();
    let result = request(&d, json!({"method": "GET", "url": format!("http://127.0.0.1:{port}/")})).await;
    assert!(result.is_error);
    assert!(result.joined_text().starts_with("unable to execute request: "));
}

#[tokio::test]
async fn test_schema_rejects_bad_input() {
    let d = dispatcher();

    let result = request(&d, json!({"method": "GET", "url": "ftp://example.com"})).await;
    assert!(result.is_error);
    assert_eq!(
        result.joined_text(),
        "invalid argument 'url': does not match pattern ^https?://.*"
    );

    let result = request(&d, json!({"method": "PATCH", "url": "http://example.com"})).await;
    assert!(result.is_error);
    assert_eq!(
        result.joined_text(),
        "invalid argument 'method': must be one of: GET, POST, PUT, DELETE"
    );
}
