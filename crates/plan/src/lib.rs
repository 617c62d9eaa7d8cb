//! # agentplan plan
//!
//! Compiles a declared [`Agent`] into an [`AgentPlan`]: the event dispatch
//! table plus a registry of resource providers. Plans are encoded to a
//! host-agnostic JSON document, decoded on the executing side, and
//! instantiated into a [`PlanInstance`] whose [`ResourceCache`] builds
//! resources lazily, once each, and fails on dependency cycles.
//!
//! ```text
//! Agent ──compile──▶ AgentPlan ──encode──▶ document ──decode──▶ AgentPlan
//!                                                                  │
//!                                             instantiate(Bindings)▼
//!                                         PlanInstance ──resolve──▶ Resource
//! ```

pub mod action;
pub mod actions;
pub mod agent;
mod capture;
pub mod codec;
pub mod dispatch;
pub mod error;
pub mod function;
pub mod instance;
pub mod plan;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod tools;
pub mod types;

pub use action::Action;
pub use agent::{ActionDeclaration, Agent, AgentDefinition, ResourceDeclaration};
pub use dispatch::DispatchTable;
pub use error::PlanError;
pub use function::{ActionHandler, FunctionCatalog, FunctionRef, NativeFunction, ToolFunction};
pub use instance::{Bindings, PlanInstance};
pub use plan::AgentPlan;
pub use provider::{
    ForeignRuntime, ResourceDescriptor, ResourceProvider, SerializedResource, PROVIDER_TAG_KEY,
};
pub use registry::ResourceRegistry;
pub use resolver::ResourceCache;
pub use tools::{FunctionTool, FunctionToolSpec};
pub use types::{DeclarableResource, ProvideContext, ResourceArgs, ResourceTypes, TypeIdentifier};
