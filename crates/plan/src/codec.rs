//! The plan document: encoding and decoding an [`AgentPlan`].
//!
//! ```text
//! {
//!   "actions":            { <name>: { "name", "exec", "listen_event_types" } },
//!   "actions_by_event":   { <event type>: [<action name>, ...] },
//!   "resource_providers": { <kind>: { <name>: { "__resource_provider_type__": <tag>, ... } } }
//! }
//! ```
//!
//! Every map is ordered, so encoding the same plan twice yields the same
//! bytes. The resource cache is runtime state and is never encoded.

use std::collections::BTreeMap;

use agentplan_core::ResourceKind;
use serde_json::{Map, Value};
use tracing::debug;

use crate::action::Action;
use crate::dispatch::DispatchTable;
use crate::error::PlanError;
use crate::plan::AgentPlan;
use crate::provider::ResourceProvider;
use crate::registry::ResourceRegistry;

pub fn encode(plan: &AgentPlan) -> Result<Value, PlanError> {
    let mut providers = Map::new();
    for kind in plan.resource_providers().kinds() {
        let mut by_name = Map::new();
        for provider in plan.resource_providers().of_kind(kind) {
            by_name.insert(provider.name().to_string(), provider.to_value()?);
        }
        providers.insert(kind.as_str().to_string(), Value::Object(by_name));
    }

    let mut doc = Map::new();
    doc.insert("actions".into(), serde_json::to_value(plan.actions())?);
    doc.insert("actions_by_event".into(), serde_json::to_value(plan.actions_by_event())?);
    doc.insert("resource_providers".into(), Value::Object(providers));
    Ok(Value::Object(doc))
}

pub fn decode(doc: Value) -> Result<AgentPlan, PlanError> {
    let Value::Object(mut doc) = doc else {
        return Err(PlanError::MalformedDocument("plan must be an object".into()));
    };
    let actions: BTreeMap<String, Action> = match doc.remove("actions") {
        Some(value) => serde_json::from_value(value)?,
        None => return Err(PlanError::MalformedDocument("missing 'actions'".into())),
    };
    let actions_by_event: DispatchTable = match doc.remove("actions_by_event") {
        Some(value) => serde_json::from_value(value)?,
        None => {
            return Err(PlanError::MalformedDocument("missing 'actions_by_event'".into()));
        }
    };

    for (name, action) in &actions {
        if *name != action.name {
            return Err(PlanError::MalformedDocument(format!(
                "action filed under '{name}' is named '{}'",
                action.name
            )));
        }
    }

    let mut registry = ResourceRegistry::new();
    match doc.remove("resource_providers") {
        None | Some(Value::Null) => {}
        Some(Value::Object(kinds)) => {
            for (kind_str, by_name) in kinds {
                let kind = ResourceKind::parse(&kind_str).ok_or_else(|| {
                    PlanError::MalformedDocument(format!("unknown resource kind '{kind_str}'"))
                })?;
                let Value::Object(by_name) = by_name else {
                    return Err(PlanError::MalformedDocument(format!(
                        "providers of kind '{kind_str}' must be an object"
                    )));
                };
                for (name, value) in by_name {
                    let provider = ResourceProvider::from_value(value)?;
                    if provider.kind() != kind || provider.name() != name {
                        return Err(PlanError::MalformedDocument(format!(
                            "provider filed under {kind_str}/{name} describes {}/{}",
                            provider.kind(),
                            provider.name()
                        )));
                    }
                    registry.insert(provider)?;
                }
            }
        }
        Some(_) => {
            return Err(PlanError::MalformedDocument(
                "'resource_providers' must be an object".into(),
            ));
        }
    }

    let plan = AgentPlan::from_parts(actions, actions_by_event, registry)?;
    debug!(
        actions = plan.actions().len(),
        resources = plan.resource_providers().len(),
        "Decoded agent plan"
    );
    Ok(plan)
}

pub fn to_string(plan: &AgentPlan, pretty: bool) -> Result<String, PlanError> {
    let doc = encode(plan)?;
    let json = if pretty {
        serde_json::to_string_pretty(&doc)?
    } else {
        serde_json::to_string(&doc)?
    };
    Ok(json)
}

pub fn from_str(json: &str) -> Result<AgentPlan, PlanError> {
    decode(serde_json::from_str(json)?)
}
