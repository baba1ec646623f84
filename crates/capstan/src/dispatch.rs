//! Request dispatch: resolve, validate, invoke, wrap.
//!
//! Each request walks `Idle → Resolving → Validating → Invoking → Completed`.
//! Any stage may end the walk with a [`DispatchError`]; nothing is retried.
//! Handler panics are caught here, at the invocation boundary, so a single
//! broken capability cannot take down the session.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;

use crate::capability::{HandlerResult, ResourceRequest};
use crate::context::CallContext;
use crate::error::{CapabilityKind, DispatchError, DispatchResult};
use crate::registry::{Registry, ResolvedResource};
use crate::types::{
    PromptGetResult, PromptListResult, ReadResourceResult, ResourceListResult,
    ResourceTemplateListResult, ToolCallResult, ToolListResult,
};
use crate::validate::{bind_prompt_arguments, validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    Idle,
    Resolving,
    Validating,
    Invoking,
    Completed,
}

/// A decoded inbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ListTools,
    CallTool {
        name: String,
        arguments: Option<Value>,
    },
    ListResources,
    ListResourceTemplates,
    ReadResource {
        uri: String,
    },
    ListPrompts,
    GetPrompt {
        name: String,
        arguments: Option<Value>,
    },
}

/// The capability-kind-specific success payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Tools(ToolListResult),
    ToolCall(ToolCallResult),
    Resources(ResourceListResult),
    ResourceTemplates(ResourceTemplateListResult),
    Resource(ReadResourceResult),
    Prompts(PromptListResult),
    Prompt(PromptGetResult),
}

impl Reply {
    pub fn into_value(self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Routes requests to registered capabilities. Holds no mutable state.
pub struct Dispatcher {
    registry: Registry,
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub async fn dispatch(&self, request: Request, ctx: CallContext) -> DispatchResult<Reply> {
        match request {
            Request::ListTools => Ok(Reply::Tools(ToolListResult {
                tools: self.registry.list_tools(),
                next_cursor: None,
            })),
            Request::CallTool { name, arguments } => Ok(Reply::ToolCall(
                self.call_tool(&name, arguments.as_ref(), ctx).await,
            )),
            Request::ListResources => Ok(Reply::Resources(ResourceListResult {
                resources: self.registry.list_resources(),
                next_cursor: None,
            })),
            Request::ListResourceTemplates => {
                Ok(Reply::ResourceTemplates(ResourceTemplateListResult {
                    resource_templates: self.registry.list_templates(),
                    next_cursor: None,
                }))
            }
            Request::ReadResource { uri } => {
                self.read_resource(&uri, ctx).await.map(Reply::Resource)
            }
            Request::ListPrompts => Ok(Reply::Prompts(PromptListResult {
                prompts: self.registry.list_prompts(),
                next_cursor: None,
            })),
            Request::GetPrompt { name, arguments } => self
                .get_prompt(&name, arguments.as_ref(), ctx)
                .await
                .map(Reply::Prompt),
        }
    }

    /// Call a tool. Every failure becomes an `is_error` envelope.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<&Value>,
        ctx: CallContext,
    ) -> ToolCallResult {
        match self.try_call_tool(name, arguments, ctx).await {
            Ok(result) => result,
            Err(e) => ToolCallResult::error(e.to_string()),
        }
    }

    pub async fn try_call_tool(
        &self,
        name: &str,
        arguments: Option<&Value>,
        ctx: CallContext,
    ) -> DispatchResult<ToolCallResult> {
        let kind = CapabilityKind::Tool;
        tracing::debug!("Calling tool: {name}");

        stage(DispatchStage::Resolving, kind, name);
        let tool = self.registry.tool(name)?;

        stage(DispatchStage::Validating, kind, name);
        let args = validate(&tool.schema, arguments).inspect_err(|e| {
            tracing::debug!("Tool {name} rejected arguments: {e}");
        })?;

        let handler = Arc::clone(&tool.handler);
        let call_ctx = ctx.clone();
        let result = invoke(kind, name, &ctx, move || handler(call_ctx, args)).await?;

        stage(DispatchStage::Completed, kind, name);
        Ok(result)
    }

    pub async fn read_resource(&self, uri: &str, ctx: CallContext) -> DispatchResult<ReadResourceResult> {
        let kind = CapabilityKind::Resource;
        tracing::debug!("Reading resource: {uri}");

        stage(DispatchStage::Resolving, kind, uri);
        let (handler, params) = match self.registry.resource(uri)? {
            ResolvedResource::Static(r) => (Arc::clone(&r.handler), Default::default()),
            ResolvedResource::Template(t, params) => (Arc::clone(&t.handler), params),
        };

        // Resources take no arguments; the URI itself was validated by resolution.
        stage(DispatchStage::Validating, kind, uri);
        let request = ResourceRequest {
            uri: uri.to_string(),
            params,
        };

        let call_ctx = ctx.clone();
        let contents = invoke(kind, uri, &ctx, move || handler(call_ctx, request)).await?;

        stage(DispatchStage::Completed, kind, uri);
        Ok(ReadResourceResult { contents })
    }

    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<&Value>,
        ctx: CallContext,
    ) -> DispatchResult<PromptGetResult> {
        let kind = CapabilityKind::Prompt;
        tracing::debug!("Getting prompt: {name}");

        stage(DispatchStage::Resolving, kind, name);
        let prompt = self.registry.prompt(name)?;

        stage(DispatchStage::Validating, kind, name);
        let args = bind_prompt_arguments(&prompt.arguments, arguments)?;

        let handler = Arc::clone(&prompt.handler);
        let call_ctx = ctx.clone();
        let result = invoke(kind, name, &ctx, move || handler(call_ctx, args)).await?;

        stage(DispatchStage::Completed, kind, name);
        Ok(result)
    }
}

fn stage(stage: DispatchStage, kind: CapabilityKind, identifier: &str) {
    tracing::trace!("{kind} {identifier}: {stage:?}");
}

/// Run a handler under the fault boundary, honoring cancellation and deadline.
async fn invoke<T, F>(
    kind: CapabilityKind,
    identifier: &str,
    ctx: &CallContext,
    start: F,
) -> DispatchResult<T>
where
    F: FnOnce() -> BoxFuture<'static, HandlerResult<T>>,
{
    stage(DispatchStage::Invoking, kind, identifier);

    if ctx.is_cancelled() {
        return Err(DispatchError::Cancelled);
    }

    let fault = |payload: Box<dyn Any + Send>| {
        tracing::error!(
            "{kind} {identifier} panicked: {}",
            panic_message(payload.as_ref())
        );
        DispatchError::Fault {
            kind,
            identifier: identifier.to_string(),
        }
    };

    // The handler may panic while building its future, or while it runs.
    let future = std::panic::catch_unwind(AssertUnwindSafe(start)).map_err(fault)?;
    let guarded = AssertUnwindSafe(future).catch_unwind();

    let bounded = async {
        match ctx.deadline() {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .map_err(|_| DispatchError::TimedOut(ctx.timeout().unwrap_or_default())),
            None => Ok(guarded.await),
        }
    };

    let outcome = tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(DispatchError::Cancelled),
        outcome = bounded => outcome,
    };

    match outcome {
        Ok(Ok(Ok(value))) => Ok(value),
        Ok(Ok(Err(e))) => {
            tracing::warn!("{kind} {identifier} failed: {e}");
            Err(e.into())
        }
        Ok(Err(payload)) => Err(fault(payload)),
        Err(e) => {
            tracing::warn!("{kind} {identifier} aborted: {e}");
            Err(e)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::capability::{argument, PromptRecord, ResourceRecord, TemplateRecord, ToolRecord};
    use crate::error::HandlerError;
    use crate::schema::{Field, Schema};
    use crate::template::UriTemplate;
    use crate::types::{Content, PromptMessage, ResourceContent};

    fn explode() -> ToolCallResult {
        panic!("secret internal state")
    }

    fn dispatcher() -> Dispatcher {
        let mut builder = Registry::builder();
        builder
            .register(ToolRecord::new(
                "echo",
                "Echo the message",
                Schema::new().field(Field::string("message").required()),
                |_ctx, args| async move {
                    Ok(ToolCallResult::text(args.str("message").unwrap_or_default()))
                },
            ))
            .unwrap()
            .register(ToolRecord::new("fail", "Always fails", Schema::new(), |_ctx, _args| async {
                Err(HandlerError::failed("backend unavailable"))
            }))
            .unwrap()
            .register(ToolRecord::new("explode", "Panics", Schema::new(), |_ctx, _args| async {
                Ok(explode())
            }))
            .unwrap()
            .register(ToolRecord::new(
                "explode_early",
                "Panics before returning a future",
                Schema::new(),
                |_ctx, _args| -> futures::future::Ready<HandlerResult<ToolCallResult>> {
                    panic!("boom")
                },
            ))
            .unwrap()
            .register(ToolRecord::new("sleep", "Sleeps", Schema::new(), |_ctx, _args| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(ToolCallResult::text("woke"))
            }))
            .unwrap()
            .register(TemplateRecord::new(
                UriTemplate::parse("test://dynamic/resource/{id}").unwrap(),
                "Dynamic Resource",
                |_ctx, req| async move {
                    let id = req.params.get("id").unwrap_or_default().to_string();
                    Ok(vec![ResourceContent::text(req.uri, "text/plain", id)])
                },
            ))
            .unwrap()
            .register(ResourceRecord::new("docs://missing", "Missing", |_ctx, _req| async {
                Err(HandlerError::failed("failed to read missing.md"))
            }))
            .unwrap()
            .register(PromptRecord::new(
                "code_review",
                "Code review assistance",
                vec![argument("pr_number", "Pull request number", true)],
                |_ctx, args| async move {
                    let pr = args.require("pr_number")?;
                    Ok(PromptGetResult::new(
                        "Code review assistance",
                        vec![PromptMessage::assistant(Content::embedded(
                            format!("git://pulls/{pr}/diff"),
                            "text/x-diff",
                        ))],
                    ))
                },
            ))
            .unwrap();
        Dispatcher::new(builder.build())
    }

    #[tokio::test]
    async fn test_call_tool_success() {
        let d = dispatcher();
        let result = d
            .call_tool("echo", Some(&json!({ "message": "hi" })), CallContext::new())
            .await;
        assert!(!result.is_error);
        assert_eq!(result.joined_text(), "hi");
    }

    #[tokio::test]
    async fn test_unknown_tool_envelope() {
        let d = dispatcher();
        let result = d.call_tool("nope", None, CallContext::new()).await;
        assert!(result.is_error);
        assert_eq!(result.joined_text(), "unknown capability nope");
    }

    #[tokio::test]
    async fn test_validation_envelope_names_field() {
        let d = dispatcher();
        let result = d.call_tool("echo", Some(&json!({})), CallContext::new()).await;
        assert!(result.is_error);
        assert_eq!(
            result.joined_text(),
            "invalid argument 'message': missing required field"
        );
    }

    #[tokio::test]
    async fn test_handler_error_envelope() {
        let d = dispatcher();
        let result = d.call_tool("fail", None, CallContext::new()).await;
        assert!(result.is_error);
        assert_eq!(result.joined_text(), "backend unavailable");
    }

    #[tokio::test]
    async fn test_panic_is_contained_and_next_call_succeeds() {
        let d = dispatcher();

        let result = d.call_tool("explode", None, CallContext::new()).await;
        assert!(result.is_error);
        let text = result.joined_text();
        assert_eq!(text, "internal error while invoking explode");
        assert!(!text.contains("secret"));

        let result = d.call_tool("explode_early", None, CallContext::new()).await;
        assert!(result.is_error);

        let result = d
            .call_tool("echo", Some(&json!({ "message": "still alive" })), CallContext::new())
            .await;
        assert!(!result.is_error);
        assert_eq!(result.joined_text(), "still alive");
    }

    #[tokio::test]
    async fn test_deadline_bounds_slow_handler() {
        let d = dispatcher();
        let ctx = CallContext::with_timeout(Duration::from_millis(20));
        let err = d.try_call_tool("sleep", None, ctx).await.unwrap_err();
        assert_eq!(err, DispatchError::TimedOut(Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_cancellation_stops_waiting() {
        let d = dispatcher();
        let ctx = CallContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });
        let err = d.try_call_tool("sleep", None, ctx).await.unwrap_err();
        assert_eq!(err, DispatchError::Cancelled);
    }

    #[tokio::test]
    async fn test_read_template_resource() {
        let d = dispatcher();
        let result = d
            .read_resource("test://dynamic/resource/42", CallContext::new())
            .await
            .unwrap();
        assert_eq!(result.contents[0].uri, "test://dynamic/resource/42");
        assert_eq!(result.contents[0].text.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_resource_errors_propagate() {
        let d = dispatcher();
        let err = d
            .read_resource("docs://missing", CallContext::new())
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::Handler("failed to read missing.md".to_string()));

        let err = d
            .read_resource("test://other/42", CallContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound { kind: CapabilityKind::Resource, .. }));
    }

    #[tokio::test]
    async fn test_prompt_required_argument() {
        let d = dispatcher();
        let err = d
            .get_prompt("code_review", None, CallContext::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("pr_number"));

        let err = d
            .get_prompt("code_review", Some(&json!({ "pr_number": "" })), CallContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "pr_number is required");

        let result = d
            .get_prompt("code_review", Some(&json!({ "pr_number": "123" })), CallContext::new())
            .await
            .unwrap();
        match &result.messages[0].content {
            Content::Resource { resource } => assert_eq!(resource.uri, "git://pulls/123/diff"),
            other => panic!("expected embedded resource, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_list_is_idempotent() {
        let d = dispatcher();
        let first = d.dispatch(Request::ListTools, CallContext::new()).await.unwrap();
        let second = d.dispatch(Request::ListTools, CallContext::new()).await.unwrap();
        assert_eq!(first, second);
        let value = first.into_value().unwrap();
        assert_eq!(value["tools"][0]["name"], "echo");
        assert_eq!(value["tools"].as_array().unwrap().len(), 5);
    }
}
