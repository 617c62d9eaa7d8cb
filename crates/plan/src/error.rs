//! Errors raised while compiling, validating or decoding an agent plan.
//!
//! All of these surface before any plan is produced; resolve-time failures
//! use [`agentplan_core::ResourceError`] instead.

use agentplan_core::{EventType, ResourceKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Duplicate action name: {0}")]
    DuplicateAction(String),

    #[error("Duplicate {kind} resource name: {name}")]
    DuplicateResource { kind: ResourceKind, name: String },

    #[error("Action '{0}' must listen to at least one event type")]
    NoListenedEvents(String),

    #[error("Arguments of {kind} '{name}' are not serializable: {reason}")]
    Serialization {
        kind: ResourceKind,
        name: String,
        reason: String,
    },

    #[error("Unsupported resource provider tag: {0}")]
    UnsupportedProviderTag(String),

    #[error("Malformed plan document: {0}")]
    MalformedDocument(String),

    #[error("Event type '{event_type}' routes to undeclared action '{action}'")]
    DanglingRoute { event_type: EventType, action: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_resource_mentions_kind() {
        let err = PlanError::DuplicateResource {
            kind: ResourceKind::Tool,
            name: "add".into(),
        };
        assert_eq!(err.to_string(), "Duplicate tool resource name: add");
    }
}
