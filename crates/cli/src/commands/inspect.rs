//! `agentplan inspect`: Summarize a plan document.

use std::fmt::Write;
use std::path::Path;

use agentplan_config::AppConfig;
use agentplan_plan::AgentPlan;

pub fn render(plan: &AgentPlan) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Actions ({})", plan.actions().len());
    for action in plan.actions().values() {
        let events: Vec<_> = action.listen_event_types.iter().map(|e| e.as_str()).collect();
        let _ = writeln!(out, "  {:<24} {} <- {}", action.name, action.exec, events.join(", "));
    }

    let _ = writeln!(out, "\nRoutes ({})", plan.actions_by_event().len());
    for (event_type, names) in plan.actions_by_event().iter() {
        let _ = writeln!(out, "  {event_type} -> {}", names.join(", "));
    }

    let _ = writeln!(out, "\nResources ({})", plan.resource_providers().len());
    for provider in plan.resource_providers().iter() {
        let _ = writeln!(
            out,
            "  {:<22} {:<16} {} ({})",
            provider.kind(),
            provider.name(),
            provider.type_identifier(),
            provider.tag()
        );
    }

    out
}

pub fn run(path: &Path, json: bool, config: &AppConfig) -> anyhow::Result<()> {
    let plan = super::load_plan(path)?;
    if json {
        let doc = if config.plan.pretty {
            plan.to_json_pretty()?
        } else {
            plan.to_json()?
        };
        println!("{doc}");
    } else {
        print!("{}", render(&plan));
    }
    Ok(())
}
