//! Declaring an agent: actions plus resource declarations.
//!
//! Declarations come from two places, always gathered in this order:
//!
//! 1. An [`AgentDefinition`], the declarative layer: a type lists its actions
//!    and resources once, in order.
//! 2. Explicit registrations on the [`Agent`] builder.
//!
//! The plan compiler appends the built-in actions after both.

use std::sync::Arc;

use agentplan_core::{ChatModelSettings, ChatSession, EventType, Prompt, ResourceKind, ToolMetadata};
use serde::Serialize;
use serde_json::Value;

use crate::action::Action;
use crate::capture::to_document_value;
use crate::error::PlanError;
use crate::function::{ActionHandler, FunctionRef, NativeFunction, ToolFunction};
use crate::instance::Bindings;
use crate::provider::{ResourceDescriptor, ResourceProvider, SerializedResource};
use crate::tools::{FunctionTool, FunctionToolSpec};
use crate::types::{DeclarableResource, ResourceArgs, ResourceTypes, TypeIdentifier};

/// An action as declared, before compilation.
#[derive(Clone)]
pub struct ActionDeclaration {
    pub name: String,
    pub listen_event_types: Vec<EventType>,
    pub exec: FunctionRef,
    handler: Option<Arc<dyn ActionHandler>>,
}

impl ActionDeclaration {
    /// An action backed by a native function.
    pub fn new<F>(
        name: impl Into<String>,
        events: impl IntoIterator<Item = EventType>,
        func: NativeFunction<F>,
    ) -> Self
    where
        NativeFunction<F>: ActionHandler + 'static,
    {
        let exec = func.reference().clone();
        Self::handler(name, events, exec, Arc::new(func))
    }

    /// An action backed by an arbitrary handler, known by `exec`.
    pub fn handler(
        name: impl Into<String>,
        events: impl IntoIterator<Item = EventType>,
        exec: FunctionRef,
        handler: Arc<dyn ActionHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            listen_event_types: events.into_iter().collect(),
            exec,
            handler: Some(handler),
        }
    }

    /// An action whose code the executing host binds, e.g. a function of
    /// another host language.
    pub fn foreign(
        name: impl Into<String>,
        events: impl IntoIterator<Item = EventType>,
        exec: FunctionRef,
    ) -> Self {
        Self {
            name: name.into(),
            listen_event_types: events.into_iter().collect(),
            exec,
            handler: None,
        }
    }

    pub fn to_action(&self) -> Action {
        Action::new(&self.name, self.exec.clone(), self.listen_event_types.clone())
    }
}

impl std::fmt::Debug for ActionDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDeclaration")
            .field("name", &self.name)
            .field("listen_event_types", &self.listen_event_types)
            .field("exec", &self.exec)
            .field("bound", &self.handler.is_some())
            .finish()
    }
}

#[derive(Clone)]
enum Source {
    /// Built from a type identifier and captured constructor arguments.
    Typed {
        type_id: TypeIdentifier,
        args: Result<ResourceArgs, String>,
        register: fn(&mut ResourceTypes),
    },
    /// Built from a prebuilt snapshot.
    Snapshot {
        type_id: TypeIdentifier,
        snapshot: Result<Value, String>,
        tool: Option<(FunctionRef, Arc<dyn ToolFunction>)>,
    },
    Provider(ResourceProvider),
}

/// A resource as declared, before compilation.
///
/// Constructor arguments are serialized when the declaration is made. A
/// failure is kept and reported by the compiler, so an unserializable
/// argument fails compilation rather than the declaration call.
#[derive(Clone)]
pub struct ResourceDeclaration {
    name: String,
    kind: ResourceKind,
    source: Source,
}

fn capture_args<A: Serialize + ?Sized>(name: &str, args: &A) -> Result<ResourceArgs, String> {
    let mut map = match to_document_value(args)? {
        Value::Object(map) => map,
        Value::Null => ResourceArgs::new(),
        other => {
            return Err(format!(
                "constructor arguments must be a map of named values, got {other}"
            ));
        }
    };
    map.entry("name")
        .or_insert_with(|| Value::String(name.to_string()));
    Ok(map)
}

impl ResourceDeclaration {
    /// A resource of type `T`, built from `args` when first resolved.
    ///
    /// `args` must serialize to a map; `name` is added to it when absent.
    pub fn typed<T, A>(name: impl Into<String>, args: &A) -> Self
    where
        T: DeclarableResource + 'static,
        A: Serialize + ?Sized,
    {
        let name = name.into();
        let args = capture_args(&name, args);
        Self {
            kind: T::KIND,
            source: Source::Typed {
                type_id: T::type_identifier(),
                args,
                register: ResourceTypes::register::<T>,
            },
            name,
        }
    }

    /// A chat model session of the built-in [`ChatSession`] type. The
    /// declared name replaces `settings.name`.
    pub fn chat_model(name: impl Into<String>, mut settings: ChatModelSettings) -> Self {
        settings.name = name.into();
        Self::typed::<ChatSession, _>(settings.name.clone(), &settings)
    }

    /// A prompt, stored as a snapshot.
    pub fn prompt(name: impl Into<String>, prompt: &Prompt) -> Self {
        Self {
            name: name.into(),
            kind: ResourceKind::Prompt,
            source: Source::Snapshot {
                type_id: <Prompt as DeclarableResource>::type_identifier(),
                snapshot: to_document_value(prompt),
                tool: None,
            },
        }
    }

    /// A tool wrapping a native function. The tool is named after the
    /// resource.
    pub fn tool<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        func: NativeFunction<F>,
    ) -> Self
    where
        NativeFunction<F>: ToolFunction + 'static,
    {
        let name = name.into();
        let spec = FunctionToolSpec {
            metadata: ToolMetadata {
                name: name.clone(),
                description: description.into(),
                parameters,
            },
            func: func.reference().clone(),
        };
        Self {
            kind: ResourceKind::Tool,
            source: Source::Snapshot {
                type_id: FunctionTool::type_identifier(),
                snapshot: to_document_value(&spec),
                tool: Some((spec.func, Arc::new(func))),
            },
            name,
        }
    }

    /// A ready-made provider, e.g. a foreign one.
    pub fn provider(provider: ResourceProvider) -> Self {
        Self {
            name: provider.name().to_string(),
            kind: provider.kind(),
            source: Source::Provider(provider),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The provider this declaration compiles to.
    pub fn to_provider(&self) -> Result<ResourceProvider, PlanError> {
        let failed = |reason: &String| PlanError::Serialization {
            kind: self.kind,
            name: self.name.clone(),
            reason: reason.clone(),
        };
        match &self.source {
            Source::Typed { type_id, args, .. } => {
                Ok(ResourceProvider::Native(ResourceDescriptor {
                    name: self.name.clone(),
                    kind: self.kind,
                    module: type_id.module.clone(),
                    clazz: type_id.clazz.clone(),
                    kwargs: args.as_ref().map_err(failed)?.clone(),
                }))
            }
            Source::Snapshot {
                type_id, snapshot, ..
            } => Ok(ResourceProvider::NativeSerializable(SerializedResource {
                name: self.name.clone(),
                kind: self.kind,
                module: type_id.module.clone(),
                clazz: type_id.clazz.clone(),
                serialized: snapshot.as_ref().map_err(failed)?.clone(),
            })),
            Source::Provider(provider) => Ok(provider.clone()),
        }
    }

    fn bind(&self, bindings: &mut Bindings) {
        match &self.source {
            Source::Typed { register, .. } => register(&mut bindings.types),
            Source::Snapshot {
                tool: Some((reference, func)),
                ..
            } => bindings.functions.register_tool(reference.clone(), func.clone()),
            Source::Snapshot { tool: None, .. } | Source::Provider(_) => {}
        }
    }
}

impl std::fmt::Debug for ResourceDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.source {
            Source::Typed { type_id, .. } => format!("typed {type_id}"),
            Source::Snapshot { type_id, .. } => format!("snapshot {type_id}"),
            Source::Provider(p) => format!("provider {}", p.tag()),
        };
        f.debug_struct("ResourceDeclaration")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("source", &source)
            .finish()
    }
}

/// The declarative layer: a type that lists its actions and resources.
///
/// Both lists are read once, in the order returned.
pub trait AgentDefinition {
    fn actions(&self) -> Vec<ActionDeclaration> {
        Vec::new()
    }

    fn resources(&self) -> Vec<ResourceDeclaration> {
        Vec::new()
    }
}

/// A declared agent, ready to be compiled into a plan.
///
/// Builder methods do not check names; duplicates are reported by
/// [`AgentPlan::compile`](crate::AgentPlan::compile).
#[derive(Debug, Clone, Default)]
pub struct Agent {
    actions: Vec<ActionDeclaration>,
    resources: Vec<ResourceDeclaration>,
}

impl Agent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a definition's declarations. Explicit registrations made
    /// afterwards follow them.
    pub fn from_definition<D: AgentDefinition + ?Sized>(definition: &D) -> Self {
        Self {
            actions: definition.actions(),
            resources: definition.resources(),
        }
    }

    pub fn add_action<F>(
        &mut self,
        name: &str,
        events: impl IntoIterator<Item = EventType>,
        func: NativeFunction<F>,
    ) -> &mut Self
    where
        NativeFunction<F>: ActionHandler + 'static,
    {
        self.declare_action(ActionDeclaration::new(name, events, func))
    }

    pub fn add_action_handler(
        &mut self,
        name: &str,
        events: impl IntoIterator<Item = EventType>,
        exec: FunctionRef,
        handler: Arc<dyn ActionHandler>,
    ) -> &mut Self {
        self.declare_action(ActionDeclaration::handler(name, events, exec, handler))
    }

    pub fn declare_action(&mut self, action: ActionDeclaration) -> &mut Self {
        self.actions.push(action);
        self
    }

    pub fn add_prompt(&mut self, name: &str, prompt: &Prompt) -> &mut Self {
        self.declare_resource(ResourceDeclaration::prompt(name, prompt))
    }

    pub fn add_tool<F>(
        &mut self,
        name: &str,
        description: &str,
        parameters: Value,
        func: NativeFunction<F>,
    ) -> &mut Self
    where
        NativeFunction<F>: ToolFunction + 'static,
    {
        self.declare_resource(ResourceDeclaration::tool(name, description, parameters, func))
    }

    /// Declare a connection of type `T`, e.g. a model backend client.
    pub fn add_chat_model_connection<T, A>(&mut self, name: &str, args: &A) -> &mut Self
    where
        T: DeclarableResource + 'static,
        A: Serialize + ?Sized,
    {
        self.declare_resource(ResourceDeclaration::typed::<T, A>(name, args))
    }

    /// Declare a chat model session of the built-in type.
    pub fn add_chat_model(&mut self, name: &str, settings: ChatModelSettings) -> &mut Self {
        self.declare_resource(ResourceDeclaration::chat_model(name, settings))
    }

    /// Declare a chat model of a custom type `T`.
    pub fn add_chat_model_with<T, A>(&mut self, name: &str, args: &A) -> &mut Self
    where
        T: DeclarableResource + 'static,
        A: Serialize + ?Sized,
    {
        self.declare_resource(ResourceDeclaration::typed::<T, A>(name, args))
    }

    /// Declare a resource by its provider, e.g. one built by a foreign
    /// runtime.
    pub fn add_resource(&mut self, provider: ResourceProvider) -> &mut Self {
        self.declare_resource(ResourceDeclaration::provider(provider))
    }

    pub fn declare_resource(&mut self, resource: ResourceDeclaration) -> &mut Self {
        self.resources.push(resource);
        self
    }

    /// Declared actions, in declaration order.
    pub fn actions(&self) -> &[ActionDeclaration] {
        &self.actions
    }

    /// Declared resources, in declaration order.
    pub fn resources(&self) -> &[ResourceDeclaration] {
        &self.resources
    }

    /// Built-in bindings plus the code behind every declaration of this
    /// agent. Hosts running the plan in this process use these.
    pub fn bindings(&self) -> Bindings {
        let mut bindings = Bindings::new();
        for action in &self.actions {
            if let Some(handler) = &action.handler {
                bindings
                    .functions
                    .register_action(action.exec.clone(), handler.clone());
            }
        }
        for resource in &self.resources {
            resource.bind(&mut bindings);
        }
        bindings
    }
}
