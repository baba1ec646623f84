//! Capstan: capability registry and dispatch core for MCP-style servers.
//!
//! A [`Registry`] is assembled once at startup from tool, resource, resource
//! template and prompt records, then frozen. A [`Dispatcher`] routes decoded
//! requests through resolution, argument validation and a fault-isolated
//! handler invocation.

pub mod capability;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod schema;
pub mod template;
pub mod types;
pub mod validate;

pub use capability::{
    argument, Capability, HandlerResult, PromptRecord, ResourceRecord, ResourceRequest,
    TemplateRecord, ToolRecord,
};
pub use context::CallContext;
pub use dispatch::{DispatchStage, Dispatcher, Reply, Request};
pub use error::{
    CapabilityKind, ConfigError, DispatchError, DispatchResult, HandlerError, ValidationError,
};
pub use registry::{Registry, RegistryBuilder, Resolved, ResolvedResource};
pub use schema::{Field, FieldKind, Schema};
pub use template::{UriParams, UriTemplate};
pub use types::*;
pub use validate::{bind_prompt_arguments, validate, Arguments, PromptArguments};
