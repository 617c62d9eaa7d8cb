//! The dispatch table: `{event type -> ordered action names}`.

use std::collections::BTreeMap;

use agentplan_core::EventType;
use serde::{Deserialize, Serialize};

/// Routes an event type to the actions listening to it.
///
/// The order of names for one event type is the order in which the actions
/// were declared; it decides which action runs first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DispatchTable {
    routes: BTreeMap<EventType, Vec<String>>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bind(&mut self, event_type: EventType, action: &str) {
        self.routes.entry(event_type).or_default().push(action.to_string());
    }

    /// Actions listening to `event_type`. Unrouted types yield an empty slice.
    pub fn route(&self, event_type: &EventType) -> &[String] {
        self.routes.get(event_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn event_types(&self) -> impl Iterator<Item = &EventType> {
        self.routes.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EventType, &[String])> {
        self.routes.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
