//! Core library for Stepwise, which breaks goals into small, gated steps.
//!
//! The crate covers the whole progression engine:
//!
//! - [`schedule`]: turns a habit goal's timing into occurrence timestamps
//! - [`generation`]: drives an external step generator per occurrence, with
//!   retries, throttling, a run timeout and idempotent persistence
//! - [`monitor`]: notices generation runs that were abandoned
//! - [`gating`]: decides which steps are actionable and which are blocked
//! - [`tracker`]: the async facade over the SQLite store
//!
//! # Display Architecture
//!
//! Domain models implement [`std::fmt::Display`] and the [`display`] module
//! wraps collections and operation results, all as markdown. The CLI renders
//! that markdown in the terminal.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use stepwise_core::{generation::TemplateGenerator, params::{CreateGoal, Id}, TrackerBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tracker = TrackerBuilder::new()
//!     .with_database_path("goals.db")
//!     .build()
//!     .await?;
//!
//! let goal = tracker
//!     .create_goal(&CreateGoal {
//!         title: "Evening walk".to_string(),
//!         selected_days: Some("mon,wed,fri".to_string()),
//!         duration_weeks: Some(4),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! let run = tracker.orchestrator(TemplateGenerator).start(goal.id).await?;
//! println!("{run}");
//!
//! let view = tracker.view_goal(&Id { id: goal.id }).await?;
//! for gated in view.upcoming(4).shown {
//!     println!("{} blocked={}", gated.step.title, gated.blocked);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod display;
pub mod error;
pub mod events;
pub mod gating;
pub mod generation;
pub mod handlers;
pub mod models;
pub mod monitor;
pub mod params;
pub mod schedule;
pub mod tracker;

// Re-export commonly used types
pub use config::{EngineConfig, RetryPolicy};
pub use db::Database;
pub use display::{
    CreateResult, GoalOverview, GoalSummaries, LocalDateTime, OperationStatus, SchedulePreview,
    Steps, UpdateResult,
};
pub use error::{ProgressError, Result};
pub use generation::{
    AdvanceOutcome, GenerationOrchestrator, RunResult, StepGenerator, TemplateGenerator,
};
pub use models::{Goal, GoalStatus, GoalSummary, Step, StepStatus, Substep};
pub use params::{AddSubstep, CreateGoal, Id, ListGoals, UpdateStep};
pub use tracker::{GoalView, Tracker, TrackerBuilder};
