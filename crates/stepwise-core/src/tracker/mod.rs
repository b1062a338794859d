//! High-level tracker API for goals, steps and substeps.
//!
//! This module provides the main [`Tracker`] interface. The tracker owns the
//! database location, the [`EngineConfig`] and the step change channel, and is
//! what the command line and the [`GenerationOrchestrator`] talk to.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Orchestrator,  │    │     Tracker     │    │    Database     │
//! │  CLI commands   │───▶│ (goal_ops,      │───▶│   (via db/)     │
//! │                 │    │  step_ops)      │    │                 │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! Every operation opens its own connection on a blocking thread, so a
//! `Tracker` is cheap to clone and safe to share between tasks.
//!
//! ## Submodules
//!
//! - [`builder`]: Factory for creating [`Tracker`] instances with configuration
//! - [`goal_ops`]: Goal operations, including the monitored goal view
//! - [`step_ops`]: Step and substep operations
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use stepwise_core::{
//!     generation::TemplateGenerator,
//!     params::{CreateGoal, Id},
//!     TrackerBuilder,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tracker = TrackerBuilder::new().build().await?;
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
//! println!("{} occurrence(s) generated", run.successful_count);
//!
//! let view = tracker.view_goal(&Id { id: goal.id }).await?;
//! for next in view.upcoming(4).shown {
//!     println!("{} (blocked: {})", next.step.title, next.blocked);
//! }
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use tokio::task;

use crate::{
    config::EngineConfig,
    db::Database,
    error::{ProgressError, Result},
    events::{GoalSubscription, StepEvents},
    gating::{self, StepGate, SubstepIndex, Upcoming},
    generation::{GenerationOrchestrator, StepGenerator},
    models::{Goal, Step},
    monitor::RecoveryAction,
};

pub mod builder;
pub mod goal_ops;
pub mod step_ops;

#[cfg(test)]
mod tests;

pub use builder::TrackerBuilder;

/// Main tracker interface for managing goals and their steps.
#[derive(Debug, Clone)]
pub struct Tracker {
    pub(crate) db_path: PathBuf,
    pub(crate) config: EngineConfig,
    pub(crate) events: StepEvents,
}

impl Tracker {
    /// Creates a new tracker with the specified database path.
    pub(crate) fn new(db_path: PathBuf, config: EngineConfig) -> Self {
        Self {
            db_path,
            config,
            events: StepEvents::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    /// Subscribe to step changes of one goal.
    pub fn subscribe(&self, goal_id: u64) -> GoalSubscription {
        self.events.subscribe(goal_id)
    }

    /// An orchestrator generating this tracker's steps with `generator`.
    pub fn orchestrator<G>(&self, generator: G) -> GenerationOrchestrator
    where
        G: StepGenerator + 'static,
    {
        GenerationOrchestrator::new(self.clone(), generator)
    }

    /// Runs `operation` against a fresh connection on a blocking thread.
    pub(crate) async fn with_database<T, F>(&self, operation: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            operation(&mut db)
        })
        .await
        .map_err(ProgressError::join)?
    }
}

/// A goal with everything needed to render it, as returned by
/// [`Tracker::view_goal`].
#[derive(Debug, Clone)]
pub struct GoalView {
    pub goal: Goal,
    pub steps: Vec<Step>,
    pub substeps: SubstepIndex,
    /// Set when the monitor found an abandoned run; the caller should retry
    /// generation
    pub recovery: Option<RecoveryAction>,
}

impl GoalView {
    /// Next actionable steps with their gating verdicts.
    pub fn upcoming(&self, limit: usize) -> Upcoming<'_> {
        gating::upcoming(&self.steps, &self.substeps, limit)
    }

    pub fn gate(&self) -> StepGate<'_> {
        StepGate::new(&self.steps, &self.substeps)
    }

    /// Steps that are done, skipped or have all substeps completed.
    pub fn completed_count(&self) -> usize {
        let gate = self.gate();
        self.steps.iter().filter(|s| gate.is_complete(s)).count()
    }
}
