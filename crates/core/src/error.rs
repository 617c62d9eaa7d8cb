//! Error types for the agentplan domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

use crate::resource::ResourceKind;

/// The top-level error type for agentplan operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Resource resolution ---
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Action errors ---
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures while resolving or using a named resource.
///
/// These are local to the resolving call: the resolver never retries or
/// swallows them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResourceError {
    #[error("Resource not found: {kind} '{name}'")]
    NotFound { kind: ResourceKind, name: String },

    #[error("Cyclic resource dependency: {}", chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },

    #[error("Resource '{name}' was expected to be a {expected} but is a {actual}")]
    KindMismatch {
        name: String,
        expected: ResourceKind,
        actual: ResourceKind,
    },

    #[error("Unknown resource type: {0}")]
    UnknownType(String),

    #[error("Invalid arguments for {kind} '{name}': {reason}")]
    InvalidArguments {
        kind: ResourceKind,
        name: String,
        reason: String,
    },

    #[error("No foreign runtime available to build {kind} '{name}'")]
    ForeignRuntimeUnavailable { kind: ResourceKind, name: String },

    #[error("Resource construction failed: {0}")]
    Construction(String),

    #[error("Missing prompt variable: {0}")]
    MissingPromptVariable(String),

    #[error("Malformed prompt template: {0}")]
    MalformedTemplate(String),

    #[error("Chat request failed: {0}")]
    Chat(String),

    #[error("Resolver is no longer available")]
    ResolverDropped,
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Failures raised by an action while handling an event.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Event '{event_type}' could not be decoded: {reason}")]
    InvalidEvent { event_type: String, reason: String },

    #[error("No handler bound for function {0}")]
    UnboundFunction(String),

    #[error("Event encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Action failed: {0}")]
    Failed(String),
}
