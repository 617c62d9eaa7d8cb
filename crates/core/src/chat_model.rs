//! Chat model connections and chat model sessions.
//!
//! A connection knows how to talk to one model backend. A session binds a
//! connection to a prompt, a set of tools and default options, all referenced
//! by name and resolved through the agent's resources when `chat` runs.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ResourceError;
use crate::message::{ChatMessage, ExtraArgs, Role};
use crate::prompt::Prompt;
use crate::resource::ResourceResolver;
use crate::tool::Tool;

/// A connection to a model backend.
#[async_trait]
pub trait ChatModelConnection: Send + Sync {
    /// Send messages (and the tools the model may call) to the backend.
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        tools: &[Arc<dyn Tool>],
        options: &ExtraArgs,
    ) -> Result<ChatMessage, ResourceError>;
}

/// A configured chat session over a connection.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, messages: Vec<ChatMessage>, options: ExtraArgs) -> Result<ChatMessage, ResourceError>;
}

/// A prompt given by resource name or inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptRef {
    Named(String),
    Inline(Prompt),
}

/// Declarative settings for a [`ChatSession`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatModelSettings {
    pub name: String,

    /// Name of the connection resource
    pub connection: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<PromptRef>,

    /// Names of tool resources offered to the model
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,

    /// Default backend options (temperature, max_tokens, ...)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub options: ExtraArgs,
}

/// The default [`ChatModel`]: applies the prompt, binds tools and delegates
/// to the connection.
pub struct ChatSession {
    settings: ChatModelSettings,
    resolver: Arc<dyn ResourceResolver>,
}

impl ChatSession {
    pub fn new(settings: ChatModelSettings, resolver: Arc<dyn ResourceResolver>) -> Self {
        Self { settings, resolver }
    }

    pub fn settings(&self) -> &ChatModelSettings {
        &self.settings
    }
}

#[async_trait]
impl ChatModel for ChatSession {
    async fn chat(&self, messages: Vec<ChatMessage>, options: ExtraArgs) -> Result<ChatMessage, ResourceError> {
        let connection = self.resolver.connection(&self.settings.connection)?;

        let messages = match &self.settings.prompt {
            Some(prompt_ref) => {
                let prompt = match prompt_ref {
                    PromptRef::Named(name) => self.resolver.prompt(name)?,
                    PromptRef::Inline(prompt) => Arc::new(prompt.clone()),
                };
                prompt.format_messages(Role::User, &merge_extra_args(&messages))?
            }
            None => messages,
        };

        let tools = self
            .settings
            .tools
            .iter()
            .map(|name| self.resolver.tool(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut merged = self.settings.options.clone();
        merged.extend(options);

        tracing::debug!(
            model = %self.settings.name,
            connection = %self.settings.connection,
            messages = messages.len(),
            tools = tools.len(),
            "Delegating chat to connection"
        );
        connection.chat(messages, &tools, &merged).await
    }
}

/// Merge every message's template variables in order; later keys win.
pub fn merge_extra_args(messages: &[ChatMessage]) -> ExtraArgs {
    let mut merged = ExtraArgs::new();
    for msg in messages {
        for (key, value) in &msg.extra_args {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
