//! Routes JSON-RPC messages to the capability dispatcher.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use capstan::{CallContext, Dispatcher, Request};

use crate::types::*;

use super::negotiation::NegotiatedCapabilities;
use super::validator::validate_request;

/// One client session's view of the server.
///
/// The dispatcher is shared by every session; the handshake state and the
/// table of in-flight requests belong to this session alone.
pub struct ProtocolHandler {
    dispatcher: Arc<Dispatcher>,
    capabilities: Mutex<NegotiatedCapabilities>,
    in_flight: Mutex<HashMap<RequestId, CancellationToken>>,
    request_timeout: Duration,
}

impl ProtocolHandler {
    pub fn new(dispatcher: Arc<Dispatcher>, request_timeout: Duration) -> Self {
        Self {
            dispatcher,
            capabilities: Mutex::new(NegotiatedCapabilities::default()),
            in_flight: Mutex::new(HashMap::new()),
            request_timeout,
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub async fn is_initialized(&self) -> bool {
        self.capabilities.lock().await.initialized
    }

    /// Handle one inbound message. Requests always produce a reply;
    /// notifications never do.
    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<Value> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif).await;
                None
            }
            _ => {
                tracing::warn!("Received unexpected message type from client");
                None
            }
        }
    }

    /// Cancel every request still running in this session.
    pub async fn cancel_all(&self) {
        let in_flight = self.in_flight.lock().await;
        for token in in_flight.values() {
            token.cancel();
        }
        if !in_flight.is_empty() {
            tracing::info!("Cancelled {} in-flight requests", in_flight.len());
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Value {
        if let Err(e) = validate_request(&request) {
            return serde_json::to_value(e.to_json_rpc_error(request.id)).unwrap_or_default();
        }

        tracing::debug!("Request {}: {}", request.id, request.method);
        let id = request.id.clone();
        let result = self.dispatch_request(request).await;

        match result {
            Ok(value) => serde_json::to_value(JsonRpcResponse::new(id, value)).unwrap_or_default(),
            Err(e) => serde_json::to_value(e.to_json_rpc_error(id)).unwrap_or_default(),
        }
    }

    async fn dispatch_request(&self, request: JsonRpcRequest) -> McpResult<Value> {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;

        match method.as_str() {
            "initialize" => self.handle_initialize(params).await,
            "ping" => Ok(Value::Object(serde_json::Map::new())),

            "tools/list" => self.dispatch(&id, Request::ListTools).await,
            "tools/call" => {
                let p: ToolCallParams = parse_params(params, "Tool call")?;
                self.dispatch(
                    &id,
                    Request::CallTool {
                        name: p.name,
                        arguments: p.arguments,
                    },
                )
                .await
            }

            "resources/list" => self.dispatch(&id, Request::ListResources).await,
            "resources/templates/list" => self.dispatch(&id, Request::ListResourceTemplates).await,
            "resources/read" => {
                let p: ResourceReadParams = parse_params(params, "Resource read")?;
                self.dispatch(&id, Request::ReadResource { uri: p.uri }).await
            }

            "prompts/list" => self.dispatch(&id, Request::ListPrompts).await,
            "prompts/get" => {
                let p: PromptGetParams = parse_params(params, "Prompt get")?;
                self.dispatch(
                    &id,
                    Request::GetPrompt {
                        name: p.name,
                        arguments: p.arguments,
                    },
                )
                .await
            }

            _ => Err(McpError::MethodNotFound(method)),
        }
    }

    /// Run one capability request under a fresh deadline and a cancellation
    /// token registered against the request id.
    async fn dispatch(&self, id: &RequestId, request: Request) -> McpResult<Value> {
        let token = CancellationToken::new();
        self.in_flight.lock().await.insert(id.clone(), token.clone());

        let ctx = CallContext::with_timeout(self.request_timeout).with_token(token);
        let result = self.dispatcher.dispatch(request, ctx).await;

        self.in_flight.lock().await.remove(id);

        result?
            .into_value()
            .map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "notifications/initialized" | "initialized" => {
                self.capabilities.lock().await.mark_initialized();
            }
            "notifications/cancelled" | "$/cancelRequest" => {
                self.handle_cancelled(notification.params).await;
            }
            _ => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    async fn handle_cancelled(&self, params: Option<Value>) {
        let params: CancelledParams = match parse_params(params, "Cancellation") {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Ignoring malformed cancellation: {e}");
                return;
            }
        };

        let Some(id) = RequestId::from_value(&params.request_id) else {
            tracing::warn!("Ignoring cancellation with unusable request id");
            return;
        };

        match self.in_flight.lock().await.get(&id) {
            Some(token) => {
                tracing::info!(
                    "Cancelling request {id}: {}",
                    params.reason.as_deref().unwrap_or("no reason given")
                );
                token.cancel();
            }
            // Already finished, or never seen. Both are fine.
            None => tracing::debug!("Cancellation for unknown request {id}"),
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let init_params: InitializeParams = parse_params(params, "Initialize")?;

        let result = self.capabilities.lock().await.negotiate(init_params);

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>, what: &str) -> McpResult<T> {
    params
        .filter(|p| !p.is_null())
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?
        .ok_or_else(|| McpError::InvalidParams(format!("{what} params required")))
}
