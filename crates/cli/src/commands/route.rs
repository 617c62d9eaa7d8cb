//! `agentplan route`: Show where an event type is dispatched.

use std::path::Path;

use agentplan_core::EventType;
use agentplan_plan::AgentPlan;

/// The ordered action names, one per line.
pub fn render(plan: &AgentPlan, event_type: &EventType) -> String {
    let names = plan.route(event_type);
    if names.is_empty() {
        return format!("No action listens to {event_type}\n");
    }
    names.iter().map(|name| format!("{name}\n")).collect()
}

pub fn run(path: &Path, event_type: &str) -> anyhow::Result<()> {
    let plan = super::load_plan(path)?;
    print!("{}", render(&plan, &EventType::new(event_type)));
    Ok(())
}
