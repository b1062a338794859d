use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::{GoalCommands, ScheduleArgs, StepCommands, SubstepCommands};

/// Break goals into small, gated steps and track progress
///
/// Stepwise schedules habit goals into occurrences, generates a short chain
/// of steps for each occurrence, and shows which steps are actionable next.
/// Without a command it lists active goals.
#[derive(Parser)]
#[command(version, about, name = "sw")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/stepwise/stepwise.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    /// IANA time zone for occurrence times (defaults to the system zone)
    #[arg(long, global = true, value_name = "ZONE")]
    pub time_zone: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage goals and their step generation
    #[command(alias = "g")]
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// Work through the steps of a goal
    #[command(alias = "s")]
    Step {
        #[command(subcommand)]
        command: StepCommands,
    },
    /// Break a step into smaller pieces
    #[command(alias = "ss")]
    Substep {
        #[command(subcommand)]
        command: SubstepCommands,
    },
    /// Preview the occurrences a goal would get, without saving anything
    Schedule(ScheduleArgs),
}
