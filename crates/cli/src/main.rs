//! agentplan CLI: the main entry point.
//!
//! Commands:
//! - `inspect`  Summarize a plan document
//! - `route`    Show which actions an event type dispatches to
//! - `validate` Decode and check a plan document

use std::path::PathBuf;

use agentplan_config::AppConfig;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "agentplan",
    about = "agentplan: inspect compiled agent plans",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.agentplan/config.toml)
    #[arg(short, long, global = true, env = "AGENTPLAN_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the actions, routes and resources of a plan
    Inspect {
        /// Path to the plan document
        plan: PathBuf,

        /// Print the normalized plan document instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// List the actions an event type is dispatched to, in order
    Route {
        /// Path to the plan document
        plan: PathBuf,

        /// Qualified event type
        event_type: String,
    },

    /// Check that a plan document decodes and is consistent
    Validate {
        /// Path to the plan document
        plan: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_with_env(path)?,
        None => AppConfig::load()?,
    };

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { config.logging.level.as_str() };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Inspect { plan, json } => commands::inspect::run(&plan, json, &config)?,
        Commands::Route { plan, event_type } => commands::route::run(&plan, &event_type)?,
        Commands::Validate { plan } => commands::validate::run(&plan)?,
    }

    Ok(())
}
