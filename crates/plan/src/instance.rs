//! Plan instances: a compiled plan bound to the code that runs it.

use std::sync::Arc;

use agentplan_core::{ActionError, Resource, ResourceError, ResourceKind};

use crate::action::Action;
use crate::function::{ActionHandler, FunctionCatalog};
use crate::plan::AgentPlan;
use crate::provider::ForeignRuntime;
use crate::resolver::ResourceCache;
use crate::types::ResourceTypes;

/// What a host supplies to run a plan: the code behind function references,
/// the constructors behind type identifiers, and optionally a runtime for
/// foreign providers.
#[derive(Clone)]
pub struct Bindings {
    pub functions: FunctionCatalog,
    pub types: ResourceTypes,
    pub foreign: Option<Arc<dyn ForeignRuntime>>,
}

impl Bindings {
    /// Bindings holding the built-in actions and resource types.
    pub fn new() -> Self {
        Self {
            functions: FunctionCatalog::with_builtins(),
            types: ResourceTypes::with_builtins(),
            foreign: None,
        }
    }

    pub fn with_foreign_runtime(mut self, runtime: Arc<dyn ForeignRuntime>) -> Self {
        self.foreign = Some(runtime);
        self
    }

    /// Add every binding of `other`. A foreign runtime in `other` replaces
    /// this one.
    pub fn merge(mut self, other: &Bindings) -> Self {
        self.functions.merge(&other.functions);
        self.types.merge(&other.types);
        if let Some(runtime) = &other.foreign {
            self.foreign = Some(runtime.clone());
        }
        self
    }
}

impl Default for Bindings {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bindings")
            .field("functions", &self.functions)
            .field("types", &self.types)
            .field("foreign", &self.foreign.is_some())
            .finish()
    }
}

/// One running copy of a plan. Owns its own resource cache, so resources are
/// never shared between instances of the same plan.
#[derive(Clone, Debug)]
pub struct PlanInstance {
    plan: Arc<AgentPlan>,
    bindings: Arc<Bindings>,
    resources: ResourceCache,
}

impl PlanInstance {
    pub fn new(plan: Arc<AgentPlan>, bindings: Arc<Bindings>) -> Self {
        let resources = ResourceCache::new(Arc::new(plan.resource_providers().clone()), bindings.clone());
        Self {
            plan,
            bindings,
            resources,
        }
    }

    pub fn plan(&self) -> &AgentPlan {
        &self.plan
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn resources(&self) -> &ResourceCache {
        &self.resources
    }

    /// Resolve a resource through this instance's cache.
    pub fn get_resource(&self, name: &str, kind: ResourceKind) -> Result<Resource, ResourceError> {
        self.resources.resolve(kind, name)
    }

    /// The handler bound to an action's function reference.
    pub fn action_handler(&self, action: &Action) -> Result<Arc<dyn ActionHandler>, ActionError> {
        self.bindings
            .functions
            .action(&action.exec)
            .ok_or_else(|| ActionError::UnboundFunction(action.exec.to_string()))
    }
}
