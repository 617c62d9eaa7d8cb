//! The execution context a host hands to actions.

use std::sync::Arc;

use crate::chat_model::ChatModel;
use crate::error::ResourceError;
use crate::event::Event;
use crate::prompt::Prompt;
use crate::resource::{Resource, ResourceKind};
use crate::tool::Tool;

/// Supplied by the host to every action invocation.
///
/// Event delivery is one-way: an action reacts to an event and may hand new
/// events to the context, but never returns a value to whoever sent it.
pub trait ExecutionContext: Send + Sync {
    /// Enqueue an event for future dispatch.
    fn send_event(&self, event: Event);

    /// Look up a resource declared by the agent, building it on first use.
    fn get_resource(&self, name: &str, kind: ResourceKind) -> Result<Resource, ResourceError>;

    fn chat_model(&self, name: &str) -> Result<Arc<dyn ChatModel>, ResourceError> {
        self.get_resource(name, ResourceKind::ChatModel)?.into_chat_model(name)
    }

    fn tool(&self, name: &str) -> Result<Arc<dyn Tool>, ResourceError> {
        self.get_resource(name, ResourceKind::Tool)?.into_tool(name)
    }

    fn prompt(&self, name: &str) -> Result<Arc<Prompt>, ResourceError> {
        self.get_resource(name, ResourceKind::Prompt)?.into_prompt(name)
    }
}
