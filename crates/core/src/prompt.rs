//! Prompt templates.
//!
//! A prompt is either a single text template or a list of message templates.
//! Placeholders are written `{name}`; `{{` and `}}` produce literal braces.

use serde::{Deserialize, Serialize};

use crate::error::ResourceError;
use crate::message::{ChatMessage, ExtraArgs, Role};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prompt {
    Text(String),
    Messages(Vec<ChatMessage>),
}

impl Prompt {
    pub fn from_text(text: impl Into<String>) -> Self {
        Prompt::Text(text.into())
    }

    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Prompt::Messages(messages)
    }

    /// Render the prompt as one string. Message templates are joined by newlines.
    pub fn format_string(&self, vars: &ExtraArgs) -> Result<String, ResourceError> {
        match self {
            Prompt::Text(text) => render(text, vars),
            Prompt::Messages(messages) => {
                let rendered = messages
                    .iter()
                    .map(|m| render(&m.content, vars))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rendered.join("\n"))
            }
        }
    }

    /// Render the prompt as chat messages. A text prompt becomes a single
    /// message with the given role.
    pub fn format_messages(&self, role: Role, vars: &ExtraArgs) -> Result<Vec<ChatMessage>, ResourceError> {
        match self {
            Prompt::Text(text) => Ok(vec![ChatMessage::new(role, render(text, vars)?)]),
            Prompt::Messages(messages) => messages
                .iter()
                .map(|m| {
                    Ok(ChatMessage {
                        content: render(&m.content, vars)?,
                        ..m.clone()
                    })
                })
                .collect(),
        }
    }
}

/// Substitute `{name}` placeholders from `vars`.
pub fn render(template: &str, vars: &ExtraArgs) -> Result<String, ResourceError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => key.push(ch),
                        None => {
                            return Err(ResourceError::MalformedTemplate(format!(
                                "unclosed placeholder '{{{key}'"
                            )));
                        }
                    }
                }
                let key = key.trim();
                match vars.get(key) {
                    Some(serde_json::Value::String(s)) => out.push_str(s),
                    Some(other) => out.push_str(&other.to_string()),
                    None => return Err(ResourceError::MissingPromptVariable(key.to_string())),
                }
            }
            '}' => {
                return Err(ResourceError::MalformedTemplate(
                    "single '}' outside a placeholder".into(),
                ));
            }
            c => out.push(c),
        }
    }

    Ok(out)
}
