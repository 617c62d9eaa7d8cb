//! Built-in actions appended to every plan.
//!
//! They come after user actions so that user actions can emit the chat and
//! tool events these consume.

mod chat_model_action;
mod tool_call_action;

use std::sync::Arc;

use agentplan_core::{ChatRequestEvent, ToolRequestEvent, ToolResponseEvent, TypedEvent};

use crate::action::Action;
use crate::function::{FunctionCatalog, FunctionRef};

pub use chat_model_action::ChatModelAction;
pub use tool_call_action::ToolCallAction;

pub const CHAT_MODEL_ACTION: &str = "chat_model_action";
pub const TOOL_CALL_ACTION: &str = "tool_call_action";

const BUILTIN_MODULE: &str = "agentplan_plan::actions";

fn builtin_ref(name: &str) -> FunctionRef {
    FunctionRef::native(BUILTIN_MODULE, name)
}

/// The built-in actions, in the order they are appended to a plan.
pub fn builtin_actions() -> Vec<Action> {
    vec![
        Action::new(
            CHAT_MODEL_ACTION,
            builtin_ref(CHAT_MODEL_ACTION),
            vec![ChatRequestEvent::event_type(), ToolResponseEvent::event_type()],
        ),
        Action::new(
            TOOL_CALL_ACTION,
            builtin_ref(TOOL_CALL_ACTION),
            vec![ToolRequestEvent::event_type()],
        ),
    ]
}

pub(crate) fn register_builtins(catalog: &mut FunctionCatalog) {
    catalog.register_action(builtin_ref(CHAT_MODEL_ACTION), Arc::new(ChatModelAction));
    catalog.register_action(builtin_ref(TOOL_CALL_ACTION), Arc::new(ToolCallAction));
}

#[cfg(test)]
mod test_support {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use agentplan_core::{Event, ExecutionContext, Resource, ResourceError, ResourceKind};

    /// An execution context over a fixed set of resources that keeps every
    /// sent event.
    #[derive(Default)]
    pub struct RecordingContext {
        resources: HashMap<(ResourceKind, String), Resource>,
        sent: Mutex<Vec<Event>>,
    }

    impl RecordingContext {
        pub fn with(mut self, name: &str, resource: Resource) -> Self {
            self.resources.insert((resource.kind(), name.to_string()), resource);
            self
        }

        pub fn sent(&self) -> Vec<Event> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl ExecutionContext for RecordingContext {
        fn send_event(&self, event: Event) {
            self.sent.lock().unwrap().push(event);
        }

        fn get_resource(&self, name: &str, kind: ResourceKind) -> Result<Resource, ResourceError> {
            self.resources
                .get(&(kind, name.to_string()))
                .cloned()
                .ok_or_else(|| ResourceError::NotFound {
                    kind,
                    name: name.to_string(),
                })
        }
    }
}
