//! Error taxonomy for registration and dispatch.

use std::fmt;
use std::time::Duration;

/// The three capability kinds a registry knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    Tool,
    Resource,
    Prompt,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityKind::Tool => write!(f, "tool"),
            CapabilityKind::Resource => write!(f, "resource"),
            CapabilityKind::Prompt => write!(f, "prompt"),
        }
    }
}

/// Registration-time failures. These are fatal at startup.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("duplicate {kind} registration: {identifier}")]
    Duplicate {
        kind: CapabilityKind,
        identifier: String,
    },

    #[error("duplicate field '{field}' in schema for {owner}")]
    DuplicateField { owner: String, field: String },

    #[error("invalid pattern for field '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid URI template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },
}

/// A caller-supplied argument did not satisfy its schema.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid argument '{field}': {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "missing required field")
    }
}

/// Failure signaled by capability logic.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),

    /// Typed binding of already-validated arguments failed.
    #[error(transparent)]
    Binding(#[from] ValidationError),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }
}

/// Everything that can go wrong while dispatching one request.
///
/// None of these tear down the session; the protocol layer turns each into a
/// well-formed error envelope.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("unknown capability {identifier}")]
    NotFound {
        kind: CapabilityKind,
        identifier: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Handler(String),

    /// The handler panicked. The payload is logged, never returned.
    #[error("internal error while invoking {identifier}")]
    Fault {
        kind: CapabilityKind,
        identifier: String,
    },

    #[error("request cancelled")]
    Cancelled,

    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
}

impl DispatchError {
    pub fn not_found(kind: CapabilityKind, identifier: impl Into<String>) -> Self {
        DispatchError::NotFound {
            kind,
            identifier: identifier.into(),
        }
    }
}

impl From<HandlerError> for DispatchError {
    fn from(e: HandlerError) -> Self {
        match e {
            HandlerError::Failed(message) => DispatchError::Handler(message),
            HandlerError::Binding(v) => DispatchError::Validation(v),
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
