//! Goal operations for the Tracker.

use jiff::Timestamp;
use log::info;

use super::{GoalView, Tracker};
use crate::{
    error::{ProgressError, Result},
    models::{
        GenerationState, Goal, GoalMetadata, GoalStatus, GoalSummary, TransitionCause,
    },
    monitor,
    params::{CreateGoal, Id, ListGoals},
};

impl Tracker {
    /// Creates a new goal. The start date defaults to today in the
    /// configured time zone.
    pub async fn create_goal(&self, params: &CreateGoal) -> Result<Goal> {
        let today = Timestamp::now().to_zoned(self.config.time_zone.clone()).date();
        let new_goal = params.validate(today)?;

        let goal = self.with_database(move |db| db.create_goal(&new_goal)).await?;
        info!("Created goal {} '{}'", goal.id, goal.title);
        Ok(goal)
    }

    /// Retrieves a goal by its ID.
    pub async fn get_goal(&self, params: &Id) -> Result<Option<Goal>> {
        let goal_id = params.id;
        self.with_database(move |db| db.get_goal(goal_id)).await
    }

    /// Retrieves a goal, failing with `GoalNotFound` when it does not exist.
    pub(crate) async fn load_goal(&self, goal_id: u64) -> Result<Goal> {
        self.with_database(move |db| db.require_goal(goal_id)).await
    }

    /// Lists goals with their step counts, newest first.
    pub async fn list_goals(&self, params: &ListGoals) -> Result<Vec<GoalSummary>> {
        let include_archived = params.archived;
        self.with_database(move |db| db.list_goals(include_archived))
            .await
    }

    /// Archives a goal, hiding it from the default listing.
    pub async fn archive_goal(&self, params: &Id) -> Result<Goal> {
        self.set_goal_status(params.id, GoalStatus::Archived).await
    }

    /// Sets the lifecycle status of a goal.
    pub async fn set_goal_status(&self, goal_id: u64, status: GoalStatus) -> Result<Goal> {
        self.with_database(move |db| db.set_goal_status(goal_id, status))
            .await
    }

    /// Marks a goal as waiting for a generation run to pick it up.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless generation never started.
    pub async fn queue_generation(&self, params: &Id) -> Result<GoalMetadata> {
        let metadata = self
            .update_metadata(params.id, |metadata| {
                metadata.generation.transition(
                    GenerationState::Queued {
                        queued_at: Timestamp::now(),
                    },
                    TransitionCause::Run,
                )
            })
            .await?;
        info!("Goal {} queued for generation", params.id);
        Ok(metadata)
    }

    /// Read-merge-write of a goal's metadata inside one transaction.
    pub(crate) async fn update_metadata<F>(&self, goal_id: u64, apply: F) -> Result<GoalMetadata>
    where
        F: FnOnce(&mut GoalMetadata) -> Result<()> + Send + 'static,
    {
        self.with_database(move |db| db.update_metadata(goal_id, apply))
            .await
    }

    /// Loads a goal with its steps and substeps.
    ///
    /// Looking at a goal is also when abandoned generation runs are noticed:
    /// a run stuck in `pending` or `queued` without steps past the stale
    /// threshold is marked failed here, and [`GoalView::recovery`] tells the
    /// caller to retry it.
    pub async fn view_goal(&self, params: &Id) -> Result<GoalView> {
        let goal_id = params.id;
        let stale_after = self.config.stale_after;

        let (goal, steps, substeps, recovery) = self
            .with_database(move |db| {
                let mut goal = db.require_goal(goal_id)?;
                let steps = db.get_steps(goal_id)?;
                let substeps = db.get_goal_substeps(goal_id)?;

                let now = Timestamp::now();
                let mut recovery = None;
                if let Some(action) = monitor::check(&goal, steps.len(), now, stale_after) {
                    goal.metadata = db.update_metadata(goal_id, |metadata| {
                        recovery = monitor::settle(metadata, action, now)?;
                        Ok(())
                    })?;
                }
                Ok((goal, steps, substeps, recovery))
            })
            .await?;

        Ok(GoalView {
            goal,
            steps,
            substeps,
            recovery,
        })
    }

    /// Rejects goals that are archived.
    pub(crate) fn ensure_not_archived(goal: &Goal) -> Result<()> {
        if goal.status == GoalStatus::Archived {
            return Err(ProgressError::invalid_input("goal_id")
                .with_reason(format!("Goal {} is archived", goal.id)));
        }
        Ok(())
    }
}
