//! The agent plan and its compiler.

use std::collections::BTreeMap;
use std::sync::Arc;

use agentplan_core::{EventType, ResourceKind};
use tracing::{debug, info};

use crate::action::Action;
use crate::actions::builtin_actions;
use crate::agent::Agent;
use crate::dispatch::DispatchTable;
use crate::error::PlanError;
use crate::instance::{Bindings, PlanInstance};
use crate::provider::ResourceProvider;
use crate::registry::ResourceRegistry;

/// A compiled agent: actions, the dispatch table and the resource registry.
///
/// Immutable once built. Run it by [instantiating](AgentPlan::instantiate)
/// it; every instance resolves resources into its own cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentPlan {
    actions: BTreeMap<String, Action>,
    actions_by_event: DispatchTable,
    resource_providers: ResourceRegistry,
}

impl AgentPlan {
    /// Compile a declared agent.
    ///
    /// Actions are taken in declaration order followed by the built-in
    /// actions; that order decides the order of names in each dispatch entry.
    pub fn compile(agent: &Agent) -> Result<Self, PlanError> {
        let mut plan = AgentPlan::default();

        let declared = agent.actions().iter().map(|a| a.to_action());
        for action in declared.chain(builtin_actions()) {
            plan.add_action(action)?;
        }
        for resource in agent.resources() {
            plan.resource_providers.insert(resource.to_provider()?)?;
        }

        info!(
            actions = plan.actions.len(),
            event_types = plan.actions_by_event.len(),
            resources = plan.resource_providers.len(),
            "Compiled agent plan"
        );
        Ok(plan)
    }

    fn add_action(&mut self, action: Action) -> Result<(), PlanError> {
        if action.listen_event_types.is_empty() {
            return Err(PlanError::NoListenedEvents(action.name));
        }
        if self.actions.contains_key(&action.name) {
            return Err(PlanError::DuplicateAction(action.name));
        }
        let mut seen: Vec<&EventType> = Vec::new();
        for event_type in &action.listen_event_types {
            if !seen.contains(&event_type) {
                self.actions_by_event.bind(event_type.clone(), &action.name);
                seen.push(event_type);
            }
        }
        debug!(action = %action.name, exec = %action.exec, "Added action");
        self.actions.insert(action.name.clone(), action);
        Ok(())
    }

    /// Assemble a plan from already-compiled parts, checking that they agree.
    pub fn from_parts(
        actions: BTreeMap<String, Action>,
        actions_by_event: DispatchTable,
        resource_providers: ResourceRegistry,
    ) -> Result<Self, PlanError> {
        let plan = Self {
            actions,
            actions_by_event,
            resource_providers,
        };
        plan.validate()?;
        Ok(plan)
    }

    pub fn actions(&self) -> &BTreeMap<String, Action> {
        &self.actions
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn actions_by_event(&self) -> &DispatchTable {
        &self.actions_by_event
    }

    pub fn resource_providers(&self) -> &ResourceRegistry {
        &self.resource_providers
    }

    /// Names of the actions listening to `event_type`, in dispatch order.
    pub fn route(&self, event_type: &EventType) -> &[String] {
        self.actions_by_event.route(event_type)
    }

    /// The actions listening to `event_type`, in dispatch order.
    pub fn get_actions(&self, event_type: &EventType) -> Vec<&Action> {
        self.route(event_type)
            .iter()
            .filter_map(|name| self.actions.get(name))
            .collect()
    }

    pub fn get_resource_provider(&self, kind: ResourceKind, name: &str) -> Option<&ResourceProvider> {
        self.resource_providers.get(kind, name)
    }

    /// Check that the dispatch table and the actions agree: every routed
    /// name is a declared action listening to that event type and appears
    /// once per route, and every listened event type routes to its action.
    pub fn validate(&self) -> Result<(), PlanError> {
        for (event_type, names) in self.actions_by_event.iter() {
            for (i, name) in names.iter().enumerate() {
                if names[..i].contains(name) {
                    return Err(PlanError::MalformedDocument(format!(
                        "action '{name}' is routed from '{event_type}' more than once"
                    )));
                }
                let listens = self
                    .actions
                    .get(name)
                    .is_some_and(|a| a.listens_to(event_type));
                if !listens {
                    return Err(PlanError::DanglingRoute {
                        event_type: event_type.clone(),
                        action: name.clone(),
                    });
                }
            }
        }
        for action in self.actions.values() {
            if action.listen_event_types.is_empty() {
                return Err(PlanError::NoListenedEvents(action.name.clone()));
            }
            for event_type in &action.listen_event_types {
                if !self.route(event_type).contains(&action.name) {
                    return Err(PlanError::MalformedDocument(format!(
                        "action '{}' listens to '{event_type}' but is not routed from it",
                        action.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Bind this plan to code and start a fresh resource cache.
    pub fn instantiate(self: &Arc<Self>, bindings: Arc<Bindings>) -> PlanInstance {
        PlanInstance::new(self.clone(), bindings)
    }

    pub fn to_json(&self) -> Result<String, PlanError> {
        crate::codec::to_string(self, false)
    }

    pub fn to_json_pretty(&self) -> Result<String, PlanError> {
        crate::codec::to_string(self, true)
    }

    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        crate::codec::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentplan_core::{
        ActionError, ChatRequestEvent, Event, ExecutionContext, InputEvent, Prompt, TypedEvent,
    };

    use crate::actions::{CHAT_MODEL_ACTION, TOOL_CALL_ACTION};
    use crate::agent::{ActionDeclaration, AgentDefinition};
    use crate::function;

    fn first(_event: &Event, _ctx: &dyn ExecutionContext) -> Result<(), ActionError> {
        Ok(())
    }

    fn second(_event: &Event, _ctx: &dyn ExecutionContext) -> Result<(), ActionError> {
        Ok(())
    }

    fn two_listeners() -> Agent {
        let mut agent = Agent::new();
        agent
            .add_action("first", [InputEvent::event_type()], function!(first))
            .add_action("second", [InputEvent::event_type()], function!(second));
        agent
    }

    #[test]
    fn listeners_of_one_event_keep_declaration_order() {
        let plan = AgentPlan::compile(&two_listeners()).unwrap();
        assert_eq!(plan.route(&InputEvent::event_type()), ["first", "second"]);

        // Same declaration, same table.
        let again = AgentPlan::compile(&two_listeners()).unwrap();
        assert_eq!(plan.actions_by_event(), again.actions_by_event());
    }

    #[test]
    fn builtin_actions_come_last() {
        let mut agent = two_listeners();
        agent.add_action("also_chat", [ChatRequestEvent::event_type()], function!(first));
        let plan = AgentPlan::compile(&agent).unwrap();

        assert_eq!(
            plan.route(&ChatRequestEvent::event_type()),
            ["also_chat", CHAT_MODEL_ACTION]
        );
        assert!(plan.action(TOOL_CALL_ACTION).is_some());
    }

    #[test]
    fn get_actions_follows_route() {
        let plan = AgentPlan::compile(&two_listeners()).unwrap();
        let names: Vec<_> = plan
            .get_actions(&InputEvent::event_type())
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, ["first", "second"]);
        assert!(plan.get_actions(&EventType::new("nobody.Listens")).is_empty());
    }

    #[test]
    fn duplicate_action_names_fail() {
        let mut agent = two_listeners();
        agent.add_action("first", [InputEvent::event_type()], function!(second));
        assert!(matches!(
            AgentPlan::compile(&agent),
            Err(PlanError::DuplicateAction(name)) if name == "first"
        ));
    }

    #[test]
    fn user_action_may_not_take_a_builtin_name() {
        let mut agent = Agent::new();
        agent.add_action(CHAT_MODEL_ACTION, [InputEvent::event_type()], function!(first));
        assert!(matches!(
            AgentPlan::compile(&agent),
            Err(PlanError::DuplicateAction(_))
        ));
    }

    #[test]
    fn duplicate_resource_names_fail_per_kind() {
        let mut agent = Agent::new();
        agent
            .add_prompt("greeting", &Prompt::from_text("Hello"))
            .add_prompt("greeting", &Prompt::from_text("Hi"));
        assert!(matches!(
            AgentPlan::compile(&agent),
            Err(PlanError::DuplicateResource { kind: ResourceKind::Prompt, .. })
        ));
    }

    #[test]
    fn action_without_events_fails() {
        let mut agent = Agent::new();
        agent.add_action("idle", Vec::<EventType>::new(), function!(first));
        assert!(matches!(
            AgentPlan::compile(&agent),
            Err(PlanError::NoListenedEvents(name)) if name == "idle"
        ));
    }

    #[test]
    fn repeated_event_type_routes_once() {
        let mut agent = Agent::new();
        agent.add_action(
            "twice",
            [InputEvent::event_type(), InputEvent::event_type()],
            function!(first),
        );
        let plan = AgentPlan::compile(&agent).unwrap();
        assert_eq!(plan.route(&InputEvent::event_type()), ["twice"]);
    }

    #[test]
    fn non_finite_constructor_args_fail_compilation() {
        #[derive(serde::Serialize)]
        struct SessionArgs {
            connection: &'static str,
            temperature: f64,
        }

        let mut agent = Agent::new();
        agent.add_chat_model_with::<agentplan_core::ChatSession, _>(
            "chat",
            &SessionArgs {
                connection: "conn",
                temperature: f64::NAN,
            },
        );
        match AgentPlan::compile(&agent) {
            Err(PlanError::Serialization { kind, name, reason }) => {
                assert_eq!(kind, ResourceKind::ChatModel);
                assert_eq!(name, "chat");
                assert!(reason.contains("temperature"), "{reason}");
            }
            other => panic!("expected a serialization error, got {other:?}"),
        }
    }

    struct Reviewer;

    impl AgentDefinition for Reviewer {
        fn actions(&self) -> Vec<ActionDeclaration> {
            vec![ActionDeclaration::new(
                "declared",
                [InputEvent::event_type()],
                function!(second),
            )]
        }
    }

    #[test]
    fn definition_actions_precede_explicit_ones() {
        let mut agent = Agent::from_definition(&Reviewer);
        agent.add_action("explicit", [InputEvent::event_type()], function!(first));
        let plan = AgentPlan::compile(&agent).unwrap();
        assert_eq!(plan.route(&InputEvent::event_type()), ["declared", "explicit"]);
    }

    #[test]
    fn compiled_plans_validate() {
        AgentPlan::compile(&two_listeners()).unwrap().validate().unwrap();
    }

    #[test]
    fn route_to_undeclared_action_is_rejected() {
        let plan = AgentPlan::compile(&two_listeners()).unwrap();
        let mut actions = plan.actions().clone();
        actions.remove("second");
        let err = AgentPlan::from_parts(
            actions,
            plan.actions_by_event().clone(),
            plan.resource_providers().clone(),
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::DanglingRoute { action, .. } if action == "second"));
    }
}
