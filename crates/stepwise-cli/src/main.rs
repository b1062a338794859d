//! Stepwise command line.
//!
//! Drives the progression engine against a local database, generating steps
//! from built-in templates.

mod args;
mod cli;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use jiff::tz::TimeZone;
use log::info;
use renderer::TerminalRenderer;
use stepwise_core::{params::ListGoals, EngineConfig, TrackerBuilder};
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        time_zone,
        command,
    } = Args::parse();

    let mut config = EngineConfig::default();
    if let Some(name) = time_zone {
        let zone =
            TimeZone::get(&name).with_context(|| format!("Unknown time zone '{name}'"))?;
        config = config.with_time_zone(zone);
    }

    let mut builder = TrackerBuilder::new().with_config(config);
    if let Some(path) = database_file {
        builder = builder.with_database_path(path);
    }
    let tracker = builder
        .build()
        .await
        .context("Failed to initialize tracker")?;

    info!("Stepwise started with {}", tracker.database_path().display());
    let cli = Cli::new(tracker, TerminalRenderer::new(!no_color));

    match command {
        Some(Goal { command }) => cli.handle_goal_command(command).await,
        Some(Step { command }) => cli.handle_step_command(command).await,
        Some(Substep { command }) => cli.handle_substep_command(command).await,
        Some(Schedule(args)) => cli.preview_schedule(args),
        None => cli.list_goals(&ListGoals { archived: false }).await,
    }
}
