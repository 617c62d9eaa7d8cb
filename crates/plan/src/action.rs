//! Actions: named behaviors bound to the event types they listen to.

use agentplan_core::EventType;
use serde::{Deserialize, Serialize};

use crate::function::FunctionRef;

/// A compiled action. Immutable once part of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,

    /// The function run when a listened event arrives.
    pub exec: FunctionRef,

    /// Event types this action reacts to, in declaration order.
    pub listen_event_types: Vec<EventType>,
}

impl Action {
    pub fn new(name: impl Into<String>, exec: FunctionRef, listen_event_types: Vec<EventType>) -> Self {
        Self {
            name: name.into(),
            exec,
            listen_event_types,
        }
    }

    pub fn listens_to(&self, event_type: &EventType) -> bool {
        self.listen_event_types.contains(event_type)
    }
}
