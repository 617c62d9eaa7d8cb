pub mod inspect;
pub mod route;
pub mod validate;

use std::path::Path;

use agentplan_plan::AgentPlan;
use anyhow::Context;

/// Read and decode a plan document.
pub fn load_plan(path: &Path) -> anyhow::Result<AgentPlan> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan at {}", path.display()))?;
    let plan = AgentPlan::from_json(&json)
        .with_context(|| format!("Failed to decode plan at {}", path.display()))?;
    tracing::debug!(path = %path.display(), actions = plan.actions().len(), "Loaded plan");
    Ok(plan)
}

#[cfg(test)]
pub(crate) mod test_support {
    use agentplan_core::{
        ActionError, ChatModelSettings, Event, ExecutionContext, InputEvent, Prompt, TypedEvent,
    };
    use agentplan_plan::{function, Agent, AgentPlan};
    use std::io::Write;

    fn on_input(_event: &Event, _ctx: &dyn ExecutionContext) -> Result<(), ActionError> {
        Ok(())
    }

    pub fn plan() -> AgentPlan {
        let mut agent = Agent::new();
        agent
            .add_action("on_input", [InputEvent::event_type()], function!(on_input))
            .add_prompt("greeting", &Prompt::from_text("Hello {name}"))
            .add_chat_model(
                "chat",
                ChatModelSettings {
                    name: "chat".into(),
                    connection: "ollama".into(),
                    prompt: None,
                    tools: vec![],
                    options: Default::default(),
                },
            );
        AgentPlan::compile(&agent).unwrap()
    }

    pub fn plan_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", plan().to_json().unwrap()).unwrap();
        file
    }
}
