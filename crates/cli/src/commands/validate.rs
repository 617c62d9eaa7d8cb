//! `agentplan validate`: Decode and check a plan document.

use std::path::Path;

pub fn run(path: &Path) -> anyhow::Result<()> {
    println!("🔍 Validating {}...", path.display());

    match super::load_plan(path) {
        Ok(plan) => {
            println!("   ✅ Plan is valid");
            println!(
                "   {} actions, {} event types, {} resources",
                plan.actions().len(),
                plan.actions_by_event().len(),
                plan.resource_providers().len()
            );
            Ok(())
        }
        Err(e) => {
            println!("   ❌ {e:#}");
            Err(e)
        }
    }
}
