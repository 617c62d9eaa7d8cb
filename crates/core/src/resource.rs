//! Resources: named, lazily built objects shared by actions.
//!
//! The set of resource kinds is closed. A [`Resource`] is one instantiated
//! object of one kind; identity is `Arc` pointer identity, so two handles to
//! the same cached resource compare equal under [`Resource::ptr_eq`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chat_model::{ChatModel, ChatModelConnection};
use crate::error::ResourceError;
use crate::prompt::Prompt;
use crate::tool::Tool;

/// The kinds of resource an agent can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    ChatModel,
    ChatModelConnection,
    Tool,
    Prompt,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::ChatModel,
        ResourceKind::ChatModelConnection,
        ResourceKind::Tool,
        ResourceKind::Prompt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::ChatModel => "chat_model",
            ResourceKind::ChatModelConnection => "chat_model_connection",
            ResourceKind::Tool => "tool",
            ResourceKind::Prompt => "prompt",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An instantiated resource.
#[derive(Clone)]
pub enum Resource {
    ChatModel(Arc<dyn ChatModel>),
    ChatModelConnection(Arc<dyn ChatModelConnection>),
    Tool(Arc<dyn Tool>),
    Prompt(Arc<Prompt>),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::ChatModel(_) => ResourceKind::ChatModel,
            Resource::ChatModelConnection(_) => ResourceKind::ChatModelConnection,
            Resource::Tool(_) => ResourceKind::Tool,
            Resource::Prompt(_) => ResourceKind::Prompt,
        }
    }

    /// True when both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Resource) -> bool {
        match (self, other) {
            (Resource::ChatModel(a), Resource::ChatModel(b)) => Arc::ptr_eq(a, b),
            (Resource::ChatModelConnection(a), Resource::ChatModelConnection(b)) => {
                Arc::ptr_eq(a, b)
            }
            (Resource::Tool(a), Resource::Tool(b)) => Arc::ptr_eq(a, b),
            (Resource::Prompt(a), Resource::Prompt(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn mismatch(&self, name: &str, expected: ResourceKind) -> ResourceError {
        ResourceError::KindMismatch {
            name: name.to_string(),
            expected,
            actual: self.kind(),
        }
    }

    pub fn into_chat_model(self, name: &str) -> Result<Arc<dyn ChatModel>, ResourceError> {
        match self {
            Resource::ChatModel(model) => Ok(model),
            other => Err(other.mismatch(name, ResourceKind::ChatModel)),
        }
    }

    pub fn into_connection(self, name: &str) -> Result<Arc<dyn ChatModelConnection>, ResourceError> {
        match self {
            Resource::ChatModelConnection(conn) => Ok(conn),
            other => Err(other.mismatch(name, ResourceKind::ChatModelConnection)),
        }
    }

    pub fn into_tool(self, name: &str) -> Result<Arc<dyn Tool>, ResourceError> {
        match self {
            Resource::Tool(tool) => Ok(tool),
            other => Err(other.mismatch(name, ResourceKind::Tool)),
        }
    }

    pub fn into_prompt(self, name: &str) -> Result<Arc<Prompt>, ResourceError> {
        match self {
            Resource::Prompt(prompt) => Ok(prompt),
            other => Err(other.mismatch(name, ResourceKind::Prompt)),
        }
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Tool(tool) => write!(f, "Resource::Tool({})", tool.name()),
            Resource::Prompt(prompt) => write!(f, "Resource::Prompt({prompt:?})"),
            other => write!(f, "Resource::{}", other.kind()),
        }
    }
}

/// Resolves resources declared in the same agent by kind and name.
///
/// Resources receive a resolver when they are built so that they can look up
/// their own named dependencies (a chat model resolving its connection, its
/// prompt and its tools).
pub trait ResourceResolver: Send + Sync {
    fn resolve(&self, kind: ResourceKind, name: &str) -> Result<Resource, ResourceError>;

    fn chat_model(&self, name: &str) -> Result<Arc<dyn ChatModel>, ResourceError> {
        self.resolve(ResourceKind::ChatModel, name)?.into_chat_model(name)
    }

    fn connection(&self, name: &str) -> Result<Arc<dyn ChatModelConnection>, ResourceError> {
        self.resolve(ResourceKind::ChatModelConnection, name)?
            .into_connection(name)
    }

    fn tool(&self, name: &str) -> Result<Arc<dyn Tool>, ResourceError> {
        self.resolve(ResourceKind::Tool, name)?.into_tool(name)
    }

    fn prompt(&self, name: &str) -> Result<Arc<Prompt>, ResourceError> {
        self.resolve(ResourceKind::Prompt, name)?.into_prompt(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_round_trip() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::parse(kind.as_str()), Some(kind));
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert_eq!(ResourceKind::parse("vector_store"), None);
    }

    #[test]
    fn ptr_eq_tracks_identity() {
        let prompt = Arc::new(Prompt::from_text("hi"));
        let a = Resource::Prompt(prompt.clone());
        let b = Resource::Prompt(prompt);
        let c = Resource::Prompt(Arc::new(Prompt::from_text("hi")));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn wrong_kind_is_reported() {
        let res = Resource::Prompt(Arc::new(Prompt::from_text("hi")));
        let err = res.into_tool("greeting").err().unwrap();
        assert!(matches!(
            err,
            ResourceError::KindMismatch { expected: ResourceKind::Tool, actual: ResourceKind::Prompt, .. }
        ));
    }
}
