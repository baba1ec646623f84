//! Capability registry: built once at startup, read-only afterwards.

use std::collections::HashMap;
use std::future::Future;

use serde::de::DeserializeOwned;

use crate::capability::{
    Capability, HandlerResult, PromptRecord, ResourceRecord, ResourceRequest, TemplateRecord,
    ToolRecord,
};
use crate::context::CallContext;
use crate::error::{CapabilityKind, ConfigError, DispatchError, DispatchResult};
use crate::schema::Schema;
use crate::template::{UriParams, UriTemplate};
use crate::types::{
    PromptArgument, PromptDefinition, PromptGetResult, ResourceContent, ResourceDefinition,
    ResourceTemplateDefinition, ToolCallResult, ToolDefinition,
};
use crate::validate::{Arguments, PromptArguments};

/// Collects registrations. Duplicates are rejected here, never at request time.
#[derive(Default)]
pub struct RegistryBuilder {
    tools: Vec<ToolRecord>,
    resources: Vec<ResourceRecord>,
    templates: Vec<TemplateRecord>,
    prompts: Vec<PromptRecord>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, capability: impl Into<Capability>) -> Result<&mut Self, ConfigError> {
        let capability = capability.into();
        let kind = capability.kind();
        let identifier = capability.identifier().to_string();

        if self.contains(kind, &identifier) {
            return Err(ConfigError::Duplicate { kind, identifier });
        }

        match capability {
            Capability::Tool(tool) => {
                tool.schema.check(&tool.name)?;
                self.tools.push(tool);
            }
            Capability::Resource(resource) => self.resources.push(resource),
            Capability::ResourceTemplate(template) => self.templates.push(template),
            Capability::Prompt(prompt) => {
                if let Some(dup) = first_duplicate(prompt.arguments.iter().map(|a| a.name.as_str())) {
                    return Err(ConfigError::DuplicateField {
                        owner: prompt.name.clone(),
                        field: dup.to_string(),
                    });
                }
                self.prompts.push(prompt);
            }
        }

        tracing::debug!("Registered {kind} {identifier}");
        Ok(self)
    }

    pub fn tool<F, Fut>(
        &mut self,
        name: &str,
        description: &str,
        schema: Schema,
        handler: F,
    ) -> Result<&mut Self, ConfigError>
    where
        F: Fn(CallContext, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<ToolCallResult>> + Send + 'static,
    {
        self.register(ToolRecord::new(name, description, schema, handler))
    }

    /// Register a tool whose validated arguments are bound into `T` before the call.
    pub fn typed_tool<T, F, Fut>(
        &mut self,
        name: &str,
        description: &str,
        schema: Schema,
        handler: F,
    ) -> Result<&mut Self, ConfigError>
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(CallContext, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<ToolCallResult>> + Send + 'static,
    {
        self.register(ToolRecord::typed(name, description, schema, handler))
    }

    pub fn resource<F, Fut>(
        &mut self,
        uri: &str,
        name: &str,
        description: &str,
        mime_type: &str,
        handler: F,
    ) -> Result<&mut Self, ConfigError>
    where
        F: Fn(CallContext, ResourceRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<Vec<ResourceContent>>> + Send + 'static,
    {
        self.register(
            ResourceRecord::new(uri, name, handler)
                .describe(description)
                .mime_type(mime_type),
        )
    }

    pub fn resource_template<F, Fut>(
        &mut self,
        uri_template: &str,
        name: &str,
        description: &str,
        mime_type: &str,
        handler: F,
    ) -> Result<&mut Self, ConfigError>
    where
        F: Fn(CallContext, ResourceRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<Vec<ResourceContent>>> + Send + 'static,
    {
        let template = UriTemplate::parse(uri_template)?;
        self.register(
            TemplateRecord::new(template, name, handler)
                .describe(description)
                .mime_type(mime_type),
        )
    }

    pub fn prompt<F, Fut>(
        &mut self,
        name: &str,
        description: &str,
        arguments: Vec<PromptArgument>,
        handler: F,
    ) -> Result<&mut Self, ConfigError>
    where
        F: Fn(CallContext, PromptArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<PromptGetResult>> + Send + 'static,
    {
        self.register(PromptRecord::new(name, description, arguments, handler))
    }

    fn contains(&self, kind: CapabilityKind, identifier: &str) -> bool {
        match kind {
            CapabilityKind::Tool => self.tools.iter().any(|t| t.name == identifier),
            CapabilityKind::Resource => {
                self.resources.iter().any(|r| r.uri == identifier)
                    || self.templates.iter().any(|t| t.template.as_str() == identifier)
            }
            CapabilityKind::Prompt => self.prompts.iter().any(|p| p.name == identifier),
        }
    }

    /// Freeze the registrations.
    pub fn build(self) -> Registry {
        let tool_index = self
            .tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        let resource_index = self
            .resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.uri.clone(), i))
            .collect();
        let prompt_index = self
            .prompts
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();

        tracing::info!(
            "Registry built: {} tools, {} resources, {} resource templates, {} prompts",
            self.tools.len(),
            self.resources.len(),
            self.templates.len(),
            self.prompts.len()
        );

        Registry {
            tools: self.tools,
            resources: self.resources,
            templates: self.templates,
            prompts: self.prompts,
            tool_index,
            resource_index,
            prompt_index,
        }
    }
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = std::collections::HashSet::new();
    names.into_iter().find(|n| !seen.insert(*n))
}

/// A resolved capability, ready for invocation.
pub enum Resolved<'a> {
    Tool(&'a ToolRecord),
    Resource(&'a ResourceRecord),
    Template(&'a TemplateRecord, UriParams),
    Prompt(&'a PromptRecord),
}

/// A resolved resource: an exact static URI or a template match.
pub enum ResolvedResource<'a> {
    Static(&'a ResourceRecord),
    Template(&'a TemplateRecord, UriParams),
}

impl<'a> From<ResolvedResource<'a>> for Resolved<'a> {
    fn from(r: ResolvedResource<'a>) -> Self {
        match r {
            ResolvedResource::Static(record) => Resolved::Resource(record),
            ResolvedResource::Template(record, params) => Resolved::Template(record, params),
        }
    }
}

/// Immutable capability registry. Safe to share across threads.
pub struct Registry {
    tools: Vec<ToolRecord>,
    resources: Vec<ResourceRecord>,
    templates: Vec<TemplateRecord>,
    prompts: Vec<PromptRecord>,
    tool_index: HashMap<String, usize>,
    resource_index: HashMap<String, usize>,
    prompt_index: HashMap<String, usize>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn resolve(&self, kind: CapabilityKind, identifier: &str) -> DispatchResult<Resolved<'_>> {
        match kind {
            CapabilityKind::Tool => self.tool(identifier).map(Resolved::Tool),
            CapabilityKind::Resource => self.resource(identifier).map(Resolved::from),
            CapabilityKind::Prompt => self.prompt(identifier).map(Resolved::Prompt),
        }
    }

    pub fn tool(&self, name: &str) -> DispatchResult<&ToolRecord> {
        self.tool_index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| DispatchError::not_found(CapabilityKind::Tool, name))
    }

    pub fn prompt(&self, name: &str) -> DispatchResult<&PromptRecord> {
        self.prompt_index
            .get(name)
            .map(|&i| &self.prompts[i])
            .ok_or_else(|| DispatchError::not_found(CapabilityKind::Prompt, name))
    }

    /// Exact static URI first, then templates in registration order.
    /// When several templates match, the first registered wins.
    pub fn resource(&self, uri: &str) -> DispatchResult<ResolvedResource<'_>> {
        if let Some(&i) = self.resource_index.get(uri) {
            return Ok(ResolvedResource::Static(&self.resources[i]));
        }

        self.templates
            .iter()
            .find_map(|t| {
                t.template
                    .matches(uri)
                    .map(|params| ResolvedResource::Template(t, params))
            })
            .ok_or_else(|| DispatchError::not_found(CapabilityKind::Resource, uri))
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(ToolRecord::definition).collect()
    }

    pub fn list_resources(&self) -> Vec<ResourceDefinition> {
        self.resources.iter().map(ResourceRecord::definition).collect()
    }

    pub fn list_templates(&self) -> Vec<ResourceTemplateDefinition> {
        self.templates.iter().map(TemplateRecord::definition).collect()
    }

    pub fn list_prompts(&self) -> Vec<PromptDefinition> {
        self.prompts.iter().map(PromptRecord::definition).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::argument;
    use crate::schema::Schema;
    use crate::template::UriTemplate;
    use crate::types::{PromptGetResult, ResourceContent, ToolCallResult};

    fn tool(name: &str) -> ToolRecord {
        ToolRecord::new(name, "test tool", Schema::new(), |_ctx, _args| async {
            Ok(ToolCallResult::text("ok"))
        })
    }

    fn template(pattern: &str, name: &str) -> TemplateRecord {
        TemplateRecord::new(UriTemplate::parse(pattern).unwrap(), name, |_ctx, req| async move {
            Ok(vec![ResourceContent::text(req.uri, "text/plain", "body")])
        })
    }

    #[test]
    fn test_resolve_tool() {
        let mut builder = Registry::builder();
        builder.register(tool("calculate")).unwrap();
        builder.register(tool("greeting")).unwrap();
        let registry = builder.build();

        assert_eq!(registry.tool("greeting").unwrap().name, "greeting");
        let err = registry.tool("unknown").err().unwrap();
        assert_eq!(err, DispatchError::not_found(CapabilityKind::Tool, "unknown"));
    }

    #[test]
    fn test_duplicate_tool_is_config_error() {
        let mut builder = Registry::builder();
        builder.register(tool("calculate")).unwrap();
        let err = builder.register(tool("calculate")).err().unwrap();
        assert!(matches!(
            err,
            ConfigError::Duplicate { kind: CapabilityKind::Tool, ref identifier } if identifier == "calculate"
        ));
    }

    #[test]
    fn test_same_name_across_kinds_allowed() {
        let mut builder = Registry::builder();
        builder.register(tool("greeting")).unwrap();
        builder
            .register(PromptRecord::new("greeting", "p", vec![], |_ctx, _args| async {
                Ok(PromptGetResult::new("p", vec![]))
            }))
            .unwrap();
        let registry = builder.build();
        assert!(registry.resolve(CapabilityKind::Prompt, "greeting").is_ok());
    }

    #[test]
    fn test_duplicate_prompt_argument_rejected() {
        let mut builder = Registry::builder();
        let prompt = PromptRecord::new(
            "p",
            "p",
            vec![argument("a", "", true), argument("a", "", false)],
            |_ctx, _args| async { Ok(PromptGetResult::new("p", vec![])) },
        );
        assert!(builder.register(prompt).is_err());
    }

    #[test]
    fn test_duplicate_template_rejected() {
        let mut builder = Registry::builder();
        builder.register(template("test://dynamic/resource/{id}", "a")).unwrap();
        assert!(builder
            .register(template("test://dynamic/resource/{id}", "b"))
            .is_err());
    }

    #[test]
    fn test_static_resource_wins_over_template() {
        let mut builder = Registry::builder();
        builder.register(template("test://dynamic/resource/{id}", "dynamic")).unwrap();
        builder
            .register(ResourceRecord::new("test://dynamic/resource/static", "fixed", |_ctx, req| async move {
                Ok(vec![ResourceContent::text(req.uri, "text/plain", "fixed")])
            }))
            .unwrap();
        let registry = builder.build();

        assert!(matches!(
            registry.resource("test://dynamic/resource/static").ok().unwrap(),
            ResolvedResource::Static(r) if r.name == "fixed"
        ));
        assert!(matches!(
            registry.resource("test://dynamic/resource/42").ok().unwrap(),
            ResolvedResource::Template(t, ref params) if t.name == "dynamic" && params.get("id") == Some("42")
        ));
    }

    #[test]
    fn test_resolve_resource_through_kind() {
        let mut builder = Registry::builder();
        builder.register(template("test://dynamic/resource/{id}", "dynamic")).unwrap();
        let registry = builder.build();

        assert!(matches!(
            registry.resolve(CapabilityKind::Resource, "test://dynamic/resource/7").ok().unwrap(),
            Resolved::Template(t, ref params) if t.name == "dynamic" && params.get("id") == Some("7")
        ));
    }

    #[test]
    fn test_ambiguous_templates_first_registered_wins() {
        let mut builder = Registry::builder();
        builder.register(template("users://{id}/profile", "first")).unwrap();
        builder.register(template("users://{name}/profile", "second")).unwrap();
        let registry = builder.build();

        assert!(matches!(
            registry.resource("users://7/profile").ok().unwrap(),
            ResolvedResource::Template(t, _) if t.name == "first"
        ));
    }

    #[test]
    fn test_builder_shorthands() {
        let mut builder = Registry::builder();
        builder
            .resource("config://app", "App Config", "Application configuration", "text/plain", |_ctx, req| async move {
                Ok(vec![ResourceContent::text(req.uri, "text/plain", "App configuration here")])
            })
            .unwrap()
            .resource_template("greeting://{name}", "Greeting", "Personal greeting", "text/plain", |_ctx, req| async move {
                let name = req.params.get("name").unwrap_or_default().to_string();
                Ok(vec![ResourceContent::text(req.uri, "text/plain", format!("Hello, {name}!"))])
            })
            .unwrap();
        assert!(builder
            .resource_template("greeting://plain", "Bad", "", "text/plain", |_ctx, _req| async {
                Ok(vec![])
            })
            .is_err());

        let registry = builder.build();
        let resources = registry.list_resources();
        assert_eq!(resources[0].mime_type.as_deref(), Some("text/plain"));
        assert_eq!(registry.list_templates()[0].uri_template, "greeting://{name}");
    }

    #[test]
    fn test_unmatched_resource_not_found() {
        let mut builder = Registry::builder();
        builder.register(template("test://dynamic/resource/{id}", "dynamic")).unwrap();
        let registry = builder.build();
        assert!(registry.resource("test://other/resource/42").is_err());
        assert!(registry.resource("test://dynamic/resource").is_err());
    }

    #[test]
    fn test_listing_preserves_registration_order() {
        let mut builder = Registry::builder();
        for name in ["zeta", "alpha", "mid"] {
            builder.register(tool(name)).unwrap();
        }
        let registry = builder.build();

        let first: Vec<_> = registry.list_tools().into_iter().map(|t| t.name).collect();
        let second: Vec<_> = registry.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(first, vec!["zeta", "alpha", "mid"]);
        assert_eq!(first, second);
    }
}
