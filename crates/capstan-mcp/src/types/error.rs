//! Server error type and JSON-RPC error codes.

use std::time::Duration;

use capstan::{CapabilityKind, DispatchError};

use super::message::{JsonRpcError, RequestId};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// MCP-specific error codes.
pub mod mcp_error_codes {
    pub const REQUEST_CANCELLED: i32 = -32800;
    pub const RESOURCE_NOT_FOUND: i32 = -32802;
    pub const TOOL_NOT_FOUND: i32 = -32803;
    pub const PROMPT_NOT_FOUND: i32 = -32804;
    pub const INVALID_ARGUMENTS: i32 = -32810;
    pub const HANDLER_FAILED: i32 = -32811;
}

#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Request cancelled")]
    RequestCancelled,

    #[error("Request timed out after {0:?}")]
    RequestTimedOut(Duration),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    /// Arguments failed schema validation; carries the field-level message.
    #[error("{0}")]
    InvalidArguments(String),

    /// A handler reported a failure; carries its message verbatim.
    #[error("{0}")]
    HandlerFailed(String),

    /// A handler panicked. The message never includes the panic payload.
    #[error("{0}")]
    HandlerFault(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;
        match self {
            McpError::ParseError(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::InternalError(_) | McpError::HandlerFault(_) => INTERNAL_ERROR,
            McpError::RequestCancelled | McpError::RequestTimedOut(_) => REQUEST_CANCELLED,
            McpError::ResourceNotFound(_) => RESOURCE_NOT_FOUND,
            McpError::ToolNotFound(_) => TOOL_NOT_FOUND,
            McpError::PromptNotFound(_) => PROMPT_NOT_FOUND,
            McpError::InvalidArguments(_) => INVALID_ARGUMENTS,
            McpError::HandlerFailed(_) => HANDLER_FAILED,
            McpError::Transport(_) | McpError::Io(_) => INTERNAL_ERROR,
            McpError::Json(_) => PARSE_ERROR,
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError::new(id, self.code(), self.to_string())
    }
}

impl From<DispatchError> for McpError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::NotFound { kind, identifier } => match kind {
                CapabilityKind::Tool => McpError::ToolNotFound(identifier),
                CapabilityKind::Resource => McpError::ResourceNotFound(identifier),
                CapabilityKind::Prompt => McpError::PromptNotFound(identifier),
            },
            DispatchError::Validation(v) => McpError::InvalidArguments(v.to_string()),
            DispatchError::Handler(message) => McpError::HandlerFailed(message),
            e @ DispatchError::Fault { .. } => McpError::HandlerFault(e.to_string()),
            DispatchError::Cancelled => McpError::RequestCancelled,
            DispatchError::TimedOut(after) => McpError::RequestTimedOut(after),
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;
