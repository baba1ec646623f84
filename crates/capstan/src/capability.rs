//! Capability records and the handler shapes they carry.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;

use crate::context::CallContext;
use crate::error::{CapabilityKind, HandlerError};
use crate::schema::Schema;
use crate::template::{UriParams, UriTemplate};
use crate::types::{
    PromptArgument, PromptDefinition, PromptGetResult, ResourceContent, ResourceDefinition,
    ResourceTemplateDefinition, ToolCallResult, ToolDefinition,
};
use crate::validate::{Arguments, PromptArguments};

pub type HandlerResult<T> = Result<T, HandlerError>;

pub type ToolFn =
    Arc<dyn Fn(CallContext, Arguments) -> BoxFuture<'static, HandlerResult<ToolCallResult>> + Send + Sync>;

pub type ResourceFn = Arc<
    dyn Fn(CallContext, ResourceRequest) -> BoxFuture<'static, HandlerResult<Vec<ResourceContent>>>
        + Send
        + Sync,
>;

pub type PromptFn = Arc<
    dyn Fn(CallContext, PromptArguments) -> BoxFuture<'static, HandlerResult<PromptGetResult>>
        + Send
        + Sync,
>;

/// What a resource handler receives: the requested URI plus any template captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub uri: String,
    pub params: UriParams,
}

#[derive(Clone)]
pub struct ToolRecord {
    pub name: String,
    pub description: String,
    pub schema: Schema,
    pub handler: ToolFn,
}

impl ToolRecord {
    /// A tool whose handler reads from the validated [`Arguments`] directly.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Schema,
        handler: F,
    ) -> Self
    where
        F: Fn(CallContext, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<ToolCallResult>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler: Arc::new(move |ctx, args| handler(ctx, args).boxed()),
        }
    }

    /// A tool whose handler receives arguments bound into `T`.
    pub fn typed<T, F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Schema,
        handler: F,
    ) -> Self
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(CallContext, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<ToolCallResult>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        Self::new(name, description, schema, move |ctx, args: Arguments| {
            let handler = Arc::clone(&handler);
            async move {
                let typed: T = args.bind()?;
                handler(ctx, typed).await
            }
        })
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            input_schema: self.schema.to_json_schema(),
        }
    }
}

#[derive(Clone)]
pub struct ResourceRecord {
    pub uri: String,
    pub name: String,
    pub description: Option<String>,
    pub mime_type: Option<String>,
    pub handler: ResourceFn,
}

impl ResourceRecord {
    pub fn new<F, Fut>(uri: impl Into<String>, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(CallContext, ResourceRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<Vec<ResourceContent>>> + Send + 'static,
    {
        Self {
            uri: uri.into(),
            name: name.into(),
            description: None,
            mime_type: None,
            handler: resource_fn(handler),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn definition(&self) -> ResourceDefinition {
        ResourceDefinition {
            uri: self.uri.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
        }
    }
}

#[derive(Clone)]
pub struct TemplateRecord {
    pub template: UriTemplate,
    pub name: String,
    pub description: Option<String>,
    pub mime_type: Option<String>,
    pub handler: ResourceFn,
}

impl TemplateRecord {
    pub fn new<F, Fut>(template: UriTemplate, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(CallContext, ResourceRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<Vec<ResourceContent>>> + Send + 'static,
    {
        Self {
            template,
            name: name.into(),
            description: None,
            mime_type: None,
            handler: resource_fn(handler),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn definition(&self) -> ResourceTemplateDefinition {
        ResourceTemplateDefinition {
            uri_template: self.template.as_str().to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
        }
    }
}

#[derive(Clone)]
pub struct PromptRecord {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
    pub handler: PromptFn,
}

impl PromptRecord {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        arguments: Vec<PromptArgument>,
        handler: F,
    ) -> Self
    where
        F: Fn(CallContext, PromptArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<PromptGetResult>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            arguments,
            handler: Arc::new(move |ctx, args| handler(ctx, args).boxed()),
        }
    }

    pub fn definition(&self) -> PromptDefinition {
        PromptDefinition {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            arguments: if self.arguments.is_empty() {
                None
            } else {
                Some(self.arguments.clone())
            },
        }
    }
}

/// Shorthand for a prompt argument spec.
pub fn argument(name: &str, description: &str, required: bool) -> PromptArgument {
    PromptArgument {
        name: name.to_string(),
        description: Some(description.to_string()),
        required,
    }
}

fn resource_fn<F, Fut>(handler: F) -> ResourceFn
where
    F: Fn(CallContext, ResourceRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<Vec<ResourceContent>>> + Send + 'static,
{
    Arc::new(move |ctx, req| handler(ctx, req).boxed())
}

/// Any registrable capability.
#[derive(Clone)]
pub enum Capability {
    Tool(ToolRecord),
    Resource(ResourceRecord),
    ResourceTemplate(TemplateRecord),
    Prompt(PromptRecord),
}

impl Capability {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::Tool(_) => CapabilityKind::Tool,
            Capability::Resource(_) | Capability::ResourceTemplate(_) => CapabilityKind::Resource,
            Capability::Prompt(_) => CapabilityKind::Prompt,
        }
    }

    /// Name, URI, or template pattern.
    pub fn identifier(&self) -> &str {
        match self {
            Capability::Tool(t) => &t.name,
            Capability::Resource(r) => &r.uri,
            Capability::ResourceTemplate(t) => t.template.as_str(),
            Capability::Prompt(p) => &p.name,
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("kind", &self.kind())
            .field("identifier", &self.identifier())
            .finish()
    }
}

impl From<ToolRecord> for Capability {
    fn from(r: ToolRecord) -> Self {
        Capability::Tool(r)
    }
}

impl From<ResourceRecord> for Capability {
    fn from(r: ResourceRecord) -> Self {
        Capability::Resource(r)
    }
}

impl From<TemplateRecord> for Capability {
    fn from(r: TemplateRecord) -> Self {
        Capability::ResourceTemplate(r)
    }
}

impl From<PromptRecord> for Capability {
    fn from(r: PromptRecord) -> Self {
        Capability::Prompt(r)
    }
}
