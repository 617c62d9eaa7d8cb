//! # agentplan core
//!
//! Domain types and traits shared by the plan compiler and by execution
//! hosts: events, chat messages, resource kinds, tools, prompts and the chat
//! model connection/session pair.
//!
//! ## Design Philosophy
//!
//! Every pluggable capability is a trait here. Implementations live with the
//! code that provides them. This enables:
//! - Building resources by name at run time without knowing their concrete type
//! - Easy testing with mock connections and tools
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod event;
pub mod message;
pub mod resource;
pub mod tool;
pub mod prompt;
pub mod chat_model;
pub mod context;

// Re-export key types at crate root for ergonomics
pub use error::{ActionError, Error, ResourceError, Result, ToolError};
pub use event::{
    ChatRequestEvent, ChatResponseEvent, Event, EventType, InputEvent, OutputEvent,
    ToolRequestEvent, ToolResponseEvent, TypedEvent,
};
pub use message::{ChatMessage, ExtraArgs, MessageToolCall, Role};
pub use resource::{Resource, ResourceKind, ResourceResolver};
pub use tool::{Tool, ToolCall, ToolMetadata, ToolResult};
pub use prompt::Prompt;
pub use chat_model::{ChatModel, ChatModelConnection, ChatModelSettings, ChatSession, PromptRef};
pub use context::ExecutionContext;
