//! Function references and the catalog that binds them to code.
//!
//! A plan cannot carry code across a process boundary, so actions and
//! function tools serialize a [`FunctionRef`] instead. The host that runs the
//! plan supplies a [`FunctionCatalog`] mapping each reference back to a
//! callable.

use std::collections::HashMap;
use std::sync::Arc;

use agentplan_core::{ActionError, Event, ExecutionContext, ToolError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A serializable reference to a function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "func_type")]
pub enum FunctionRef {
    /// A function compiled into this host.
    #[serde(rename = "NativeFunction")]
    Native { module: String, qualname: String },

    /// A function living in another host language's runtime.
    #[serde(rename = "ForeignFunction")]
    Foreign { module: String, qualname: String },
}

impl FunctionRef {
    pub fn native(module: impl Into<String>, qualname: impl Into<String>) -> Self {
        FunctionRef::Native {
            module: module.into(),
            qualname: qualname.into(),
        }
    }

    pub fn foreign(module: impl Into<String>, qualname: impl Into<String>) -> Self {
        FunctionRef::Foreign {
            module: module.into(),
            qualname: qualname.into(),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, FunctionRef::Native { .. })
    }
}

impl std::fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionRef::Native { module, qualname } => write!(f, "{module}::{qualname}"),
            FunctionRef::Foreign { module, qualname } => write!(f, "foreign:{module}.{qualname}"),
        }
    }
}

/// Code run when an action's event arrives.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, event: &Event, ctx: &dyn ExecutionContext) -> Result<(), ActionError>;
}

/// Code behind a function tool.
pub trait ToolFunction: Send + Sync {
    fn call(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError>;
}

/// A native function paired with the reference it is known by.
///
/// Usually built with the [`function!`](crate::function!) macro, which takes
/// the reference from the function's module path and name.
pub struct NativeFunction<F> {
    reference: FunctionRef,
    func: F,
}

impl<F> NativeFunction<F> {
    pub fn new(module: &str, qualname: &str, func: F) -> Self {
        Self {
            reference: FunctionRef::native(module, qualname.replace(' ', "")),
            func,
        }
    }

    pub fn reference(&self) -> &FunctionRef {
        &self.reference
    }
}

impl<F> NativeFunction<F>
where
    F: Fn(&Event, &dyn ExecutionContext) -> Result<(), ActionError> + Send + Sync,
{
    /// Wrap a closure as an action. Spelling out the bound here lets closure
    /// arguments infer their lifetimes.
    pub fn action(module: &str, qualname: &str, func: F) -> Self {
        Self::new(module, qualname, func)
    }
}

#[async_trait]
impl<F> ActionHandler for NativeFunction<F>
where
    F: Fn(&Event, &dyn ExecutionContext) -> Result<(), ActionError> + Send + Sync,
{
    async fn handle(&self, event: &Event, ctx: &dyn ExecutionContext) -> Result<(), ActionError> {
        (self.func)(event, ctx)
    }
}

impl<F> ToolFunction for NativeFunction<F>
where
    F: Fn(serde_json::Value) -> Result<serde_json::Value, ToolError> + Send + Sync,
{
    fn call(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        (self.func)(arguments)
    }
}

/// Build a [`NativeFunction`] from a function path, recording the caller's
/// module path and the function name as its reference.
#[macro_export]
macro_rules! function {
    ($func:path) => {
        $crate::function::NativeFunction::new(module_path!(), stringify!($func), $func)
    };
}

/// Maps function references to the code that implements them.
#[derive(Clone, Default)]
pub struct FunctionCatalog {
    actions: HashMap<FunctionRef, Arc<dyn ActionHandler>>,
    tools: HashMap<FunctionRef, Arc<dyn ToolFunction>>,
}

impl FunctionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding the built-in action handlers.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        crate::actions::register_builtins(&mut catalog);
        catalog
    }

    /// Bind an action handler. Replaces any existing binding.
    pub fn register_action(&mut self, reference: FunctionRef, handler: Arc<dyn ActionHandler>) {
        self.actions.insert(reference, handler);
    }

    /// Bind a tool function. Replaces any existing binding.
    pub fn register_tool(&mut self, reference: FunctionRef, func: Arc<dyn ToolFunction>) {
        self.tools.insert(reference, func);
    }

    pub fn action(&self, reference: &FunctionRef) -> Option<Arc<dyn ActionHandler>> {
        self.actions.get(reference).cloned()
    }

    pub fn tool(&self, reference: &FunctionRef) -> Option<Arc<dyn ToolFunction>> {
        self.tools.get(reference).cloned()
    }

    /// Copy every binding of `other` into this catalog.
    pub fn merge(&mut self, other: &FunctionCatalog) {
        for (reference, handler) in &other.actions {
            self.actions.insert(reference.clone(), handler.clone());
        }
        for (reference, func) in &other.tools {
            self.tools.insert(reference.clone(), func.clone());
        }
    }
}

impl std::fmt::Debug for FunctionCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionCatalog")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}
