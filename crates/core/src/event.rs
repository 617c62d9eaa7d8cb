//! Events: the typed messages that drive actions.
//!
//! Every event carries a namespace-qualified [`EventType`]. Actions listen to
//! event types, and the compiled dispatch table routes each incoming event to
//! the actions bound to its type.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ActionError;
use crate::message::{ChatMessage, MessageToolCall};

/// A globally unique, namespace-qualified event type identifier
/// (e.g. `agentplan.event.InputEvent`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(String);

impl EventType {
    pub fn new(qualified: impl Into<String>) -> Self {
        Self(qualified.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// An event struct with a fixed, qualified type identifier.
pub trait TypedEvent: Serialize + DeserializeOwned {
    const EVENT_TYPE: &'static str;

    fn event_type() -> EventType {
        EventType::new(Self::EVENT_TYPE)
    }
}

/// The envelope every event travels in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub event_type: EventType,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Wrap a typed event.
    pub fn new<T: TypedEvent>(event: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::raw(T::event_type(), serde_json::to_value(event)?))
    }

    /// Build an event of an arbitrary type from a raw payload.
    pub fn raw(event_type: EventType, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn is<T: TypedEvent>(&self) -> bool {
        self.event_type.as_str() == T::EVENT_TYPE
    }

    /// Decode the payload as `T`. Fails if the type does not match.
    pub fn decode<T: TypedEvent>(&self) -> Result<T, ActionError> {
        if !self.is::<T>() {
            return Err(ActionError::InvalidEvent {
                event_type: self.event_type.to_string(),
                reason: format!("expected {}", T::EVENT_TYPE),
            });
        }
        serde_json::from_value(self.payload.clone()).map_err(|e| ActionError::InvalidEvent {
            event_type: self.event_type.to_string(),
            reason: e.to_string(),
        })
    }
}

// ── Built-in events ─────────────────────────────────────────────────────────

/// An input record entering the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub key: String,
    pub input: serde_json::Value,
}

impl TypedEvent for InputEvent {
    const EVENT_TYPE: &'static str = "agentplan.event.InputEvent";
}

/// A result record leaving the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEvent {
    pub key: String,
    pub output: serde_json::Value,
}

impl TypedEvent for OutputEvent {
    const EVENT_TYPE: &'static str = "agentplan.event.OutputEvent";
}

/// Ask the built-in chat action to run a chat model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequestEvent {
    pub request_id: Uuid,
    /// Name of the chat model resource.
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequestEvent {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            model: model.into(),
            messages,
        }
    }
}

impl TypedEvent for ChatRequestEvent {
    const EVENT_TYPE: &'static str = "agentplan.event.ChatRequestEvent";
}

/// The final answer for a chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponseEvent {
    pub request_id: Uuid,
    pub response: ChatMessage,
}

impl TypedEvent for ChatResponseEvent {
    const EVENT_TYPE: &'static str = "agentplan.event.ChatResponseEvent";
}

/// Tool calls requested by a model. The conversation so far travels with the
/// event so the chat action can resume without keyed state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequestEvent {
    pub request_id: Uuid,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tool_calls: Vec<MessageToolCall>,
}

impl TypedEvent for ToolRequestEvent {
    const EVENT_TYPE: &'static str = "agentplan.event.ToolRequestEvent";
}

/// Results of executed tool calls, one tool message per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponseEvent {
    pub request_id: Uuid,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub responses: Vec<ChatMessage>,
}

impl TypedEvent for ToolResponseEvent {
    const EVENT_TYPE: &'static str = "agentplan.event.ToolResponseEvent";
}
