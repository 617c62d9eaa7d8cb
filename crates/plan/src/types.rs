//! The resource type catalog: how a type identifier becomes a resource.
//!
//! Native providers name a type by `(module, clazz)`; the host running the
//! plan looks that identifier up here and calls its constructor with the
//! provider's arguments.

use std::collections::HashMap;
use std::sync::Arc;

use agentplan_core::{
    ChatSession, Prompt, Resource, ResourceError, ResourceKind, ResourceResolver,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::function::FunctionCatalog;
use crate::tools::FunctionTool;

/// Constructor arguments: plain JSON data only.
pub type ResourceArgs = serde_json::Map<String, serde_json::Value>;

/// Identifies a constructible resource type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeIdentifier {
    pub module: String,
    pub clazz: String,
}

impl TypeIdentifier {
    pub fn new(module: impl Into<String>, clazz: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            clazz: clazz.into(),
        }
    }
}

impl std::fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.module, self.clazz)
    }
}

/// Everything a constructor may use besides its arguments.
pub struct ProvideContext<'a> {
    pub name: &'a str,
    pub kind: ResourceKind,
    /// Resolves sibling resources; may be stored for later use.
    pub resolver: Arc<dyn ResourceResolver>,
    pub functions: &'a FunctionCatalog,
}

impl ProvideContext<'_> {
    /// Deserialize constructor arguments into `T`.
    pub fn parse_args<T: DeserializeOwned>(&self, args: ResourceArgs) -> Result<T, ResourceError> {
        serde_json::from_value(serde_json::Value::Object(args)).map_err(|e| {
            ResourceError::InvalidArguments {
                kind: self.kind,
                name: self.name.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

/// A resource type that can be declared by type and arguments.
pub trait DeclarableResource: Sized {
    const KIND: ResourceKind;
    const MODULE: &'static str;
    const CLASS: &'static str;

    fn build(args: ResourceArgs, ctx: &ProvideContext<'_>) -> Result<Self, ResourceError>;

    fn into_resource(self) -> Resource;

    fn type_identifier() -> TypeIdentifier {
        TypeIdentifier::new(Self::MODULE, Self::CLASS)
    }
}

impl DeclarableResource for ChatSession {
    const KIND: ResourceKind = ResourceKind::ChatModel;
    const MODULE: &'static str = "agentplan_core::chat_model";
    const CLASS: &'static str = "ChatSession";

    fn build(args: ResourceArgs, ctx: &ProvideContext<'_>) -> Result<Self, ResourceError> {
        Ok(ChatSession::new(ctx.parse_args(args)?, ctx.resolver.clone()))
    }

    fn into_resource(self) -> Resource {
        Resource::ChatModel(Arc::new(self))
    }
}

impl DeclarableResource for Prompt {
    const KIND: ResourceKind = ResourceKind::Prompt;
    const MODULE: &'static str = "agentplan_core::prompt";
    const CLASS: &'static str = "Prompt";

    fn build(args: ResourceArgs, ctx: &ProvideContext<'_>) -> Result<Self, ResourceError> {
        ctx.parse_args(args)
    }

    fn into_resource(self) -> Resource {
        Resource::Prompt(Arc::new(self))
    }
}

type Constructor =
    Arc<dyn Fn(ResourceArgs, &ProvideContext<'_>) -> Result<Resource, ResourceError> + Send + Sync>;

/// Maps type identifiers to constructors.
#[derive(Clone, Default)]
pub struct ResourceTypes {
    constructors: HashMap<TypeIdentifier, (ResourceKind, Constructor)>,
}

impl ResourceTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding the built-in types: chat sessions, prompts and
    /// function tools.
    pub fn with_builtins() -> Self {
        let mut types = Self::new();
        types.register::<ChatSession>();
        types.register::<Prompt>();
        types.register::<FunctionTool>();
        types
    }

    pub fn register<T: DeclarableResource + 'static>(&mut self) {
        self.register_fn(T::type_identifier(), T::KIND, |args, ctx| {
            T::build(args, ctx).map(T::into_resource)
        });
    }

    /// Register a constructor closure directly.
    pub fn register_fn<F>(&mut self, id: TypeIdentifier, kind: ResourceKind, constructor: F)
    where
        F: Fn(ResourceArgs, &ProvideContext<'_>) -> Result<Resource, ResourceError>
            + Send
            + Sync
            + 'static,
    {
        self.constructors.insert(id, (kind, Arc::new(constructor)));
    }

    pub fn contains(&self, id: &TypeIdentifier) -> bool {
        self.constructors.contains_key(id)
    }

    pub fn construct(
        &self,
        id: &TypeIdentifier,
        args: ResourceArgs,
        ctx: &ProvideContext<'_>,
    ) -> Result<Resource, ResourceError> {
        let (kind, constructor) = self
            .constructors
            .get(id)
            .ok_or_else(|| ResourceError::UnknownType(id.to_string()))?;
        if *kind != ctx.kind {
            return Err(ResourceError::KindMismatch {
                name: ctx.name.to_string(),
                expected: ctx.kind,
                actual: *kind,
            });
        }
        constructor(args, ctx)
    }

    /// Copy every constructor of `other` into this catalog.
    pub fn merge(&mut self, other: &ResourceTypes) {
        for (id, entry) in &other.constructors {
            self.constructors.insert(id.clone(), entry.clone());
        }
    }
}

impl std::fmt::Debug for ResourceTypes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}
