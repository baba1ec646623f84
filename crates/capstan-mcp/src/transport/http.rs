//! HTTP transport: JSON-RPC over `POST /mcp`, session teardown over
//! `DELETE /mcp`, and an unauthenticated `GET /health`.
//!
//! Sessions are keyed by the `Mcp-Session-Id` header. An `initialize` request
//! without the header opens a session and the id comes back in the response
//! header; every other request must carry it.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use capstan::Dispatcher;

use crate::session::SessionRegistry;
use crate::types::{error_codes, JsonRpcError, McpError, McpResult, RequestId};

use super::framing;

pub const SESSION_HEADER: &str = "mcp-session-id";

struct HttpState {
    sessions: SessionRegistry,
}

pub struct HttpTransport {
    state: Arc<HttpState>,
}

impl HttpTransport {
    pub fn new(dispatcher: Arc<Dispatcher>, request_timeout: Duration) -> Self {
        Self {
            state: Arc::new(HttpState {
                sessions: SessionRegistry::new(dispatcher, request_timeout),
            }),
        }
    }

    /// Close sessions that see no traffic for `idle_timeout`.
    pub fn with_idle_timeout(
        dispatcher: Arc<Dispatcher>,
        request_timeout: Duration,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            state: Arc::new(HttpState {
                sessions: SessionRegistry::new(dispatcher, request_timeout)
                    .with_idle_timeout(idle_timeout),
            }),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.state.sessions
    }

    /// The routes, ready to serve or to drive directly in tests.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers([HeaderName::from_static(SESSION_HEADER)]);

        Router::new()
            .route("/mcp", post(handle_post).delete(handle_delete))
            .route("/health", get(handle_health))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors),
            )
            .with_state(Arc::clone(&self.state))
    }

    /// Serve on `addr` until Ctrl-C.
    pub async fn run(&self, addr: &str) -> McpResult<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("HTTP transport listening on {addr}");

        let sweeper = tokio::spawn(sweep_idle_sessions(Arc::clone(&self.state)));

        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await;
        sweeper.abort();
        served.map_err(|e| McpError::Transport(e.to_string()))?;

        tracing::info!("HTTP transport stopped");
        Ok(())
    }
}

async fn sweep_idle_sessions(state: Arc<HttpState>) {
    let period = (state.sessions.idle_timeout() / 4)
        .clamp(Duration::from_secs(1), Duration::from_secs(60));
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        let expired = state.sessions.expire_idle().await;
        if expired > 0 {
            tracing::info!("Expired {expired} idle sessions");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn handle_post(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let msg = match framing::parse_message(&body) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!("Rejected HTTP message: {e}");
            return (StatusCode::BAD_REQUEST, Json(framing::undecodable_reply(&e))).into_response();
        }
    };

    let session = match session_id(&headers) {
        Some(id) => match state.sessions.get(id).await {
            Some(session) => session,
            None => {
                return error_response(
                    StatusCode::NOT_FOUND,
                    error_codes::INVALID_REQUEST,
                    format!("Unknown session: {id}"),
                )
            }
        },
        None if msg.method() == Some("initialize") => state.sessions.create().await,
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_REQUEST,
                "Missing Mcp-Session-Id header".to_string(),
            )
        }
    };

    let mut response = match session.handler.handle_message(msg).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };

    if let Ok(value) = HeaderValue::from_str(&session.id) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

async fn handle_delete(State(state): State<Arc<HttpState>>, headers: HeaderMap) -> Response {
    let Some(id) = session_id(&headers) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_REQUEST,
            "Missing Mcp-Session-Id header".to_string(),
        );
    };

    if state.sessions.remove(id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(
            StatusCode::NOT_FOUND,
            error_codes::INVALID_REQUEST,
            format!("Unknown session: {id}"),
        )
    }
}

async fn handle_health(State(state): State<Arc<HttpState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions.count().await,
    }))
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok())
}

fn error_response(status: StatusCode, code: i32, message: String) -> Response {
    (status, Json(JsonRpcError::new(RequestId::Null, code, message))).into_response()
}
