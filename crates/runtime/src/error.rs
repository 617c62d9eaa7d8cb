use agentplan_core::ActionError;
use thiserror::Error;

/// Failures of the local runner.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Action '{action}' failed: {source}")]
    Action {
        action: String,
        #[source]
        source: ActionError,
    },

    #[error("More than {limit} events were produced for one input")]
    EventLimitExceeded { limit: usize },

    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Malformed output event: {0}")]
    InvalidOutput(String),
}
