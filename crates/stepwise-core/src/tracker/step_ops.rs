//! Step and substep operations for the Tracker.

use jiff::Timestamp;
use log::debug;

use super::Tracker;
use crate::{
    error::{ProgressError, Result},
    events::StepEvent,
    gating::SubstepIndex,
    models::{Audience, NewStep, Step, StepStatus, Substep, UpdateStepRequest},
    params::{AddSubstep, Id, UpdateStep},
};

impl Tracker {
    /// Retrieves all steps of a goal in order.
    pub async fn get_steps(&self, params: &Id) -> Result<Vec<Step>> {
        let goal_id = params.id;
        self.with_database(move |db| {
            db.require_goal(goal_id)?;
            db.get_steps(goal_id)
        })
        .await
    }

    /// Retrieves a step by its ID.
    pub async fn get_step(&self, params: &Id) -> Result<Option<Step>> {
        let step_id = params.id;
        self.with_database(move |db| db.get_step(step_id)).await
    }

    /// Updates a step's title, description or status.
    pub async fn update_step(&self, params: &UpdateStep) -> Result<Step> {
        let step_id = params.id;
        let request = UpdateStepRequest::try_from(params.clone())?;
        let status_changed = request.status.is_some();

        let step = self
            .with_database(move |db| db.update_step(step_id, &request))
            .await?;

        if status_changed {
            debug!("Step {} is now {}", step.id, step.status.as_str());
            self.events.publish(StepEvent::StatusChanged {
                goal_id: step.goal_id,
                step_id: step.id,
                status: step.status,
            });
        }
        Ok(step)
    }

    /// Sets only the status of a step.
    pub async fn update_step_status(&self, step_id: u64, status: StepStatus) -> Result<Step> {
        self.update_step(&UpdateStep {
            id: step_id,
            status: Some(status.as_str().to_string()),
            ..Default::default()
        })
        .await
    }

    /// Adds a substep to a step.
    pub async fn add_substep(&self, params: &AddSubstep) -> Result<Substep> {
        params.validate()?;
        let step_id = params.step_id;
        let title = params.title.trim().to_string();

        let (goal_id, substep) = self
            .with_database(move |db| {
                let step = db
                    .get_step(step_id)?
                    .ok_or(ProgressError::StepNotFound { id: step_id })?;
                let substep = db.add_substep(step_id, &title)?;
                Ok((step.goal_id, substep))
            })
            .await?;

        self.publish_substep_change(goal_id, &substep);
        Ok(substep)
    }

    /// Records that work on a substep began.
    pub async fn start_substep(&self, params: &Id) -> Result<Substep> {
        let substep_id = params.id;
        self.touch_substep(move |db, at| db.start_substep(substep_id, at))
            .await
    }

    /// Marks a substep completed.
    pub async fn complete_substep(&self, params: &Id) -> Result<Substep> {
        let substep_id = params.id;
        self.touch_substep(move |db, at| db.complete_substep(substep_id, at))
            .await
    }

    /// Retrieves the substeps of a step.
    pub async fn get_substeps(&self, params: &Id) -> Result<Vec<Substep>> {
        let step_id = params.id;
        self.with_database(move |db| {
            db.get_step(step_id)?
                .ok_or(ProgressError::StepNotFound { id: step_id })?;
            db.get_substeps(step_id)
        })
        .await
    }

    async fn touch_substep<F>(&self, update: F) -> Result<Substep>
    where
        F: FnOnce(&mut crate::db::Database, Timestamp) -> Result<Substep> + Send + 'static,
    {
        let (goal_id, substep) = self
            .with_database(move |db| {
                let substep = update(db, Timestamp::now())?;
                let step = db
                    .get_step(substep.step_id)?
                    .ok_or(ProgressError::StepNotFound { id: substep.step_id })?;
                Ok((step.goal_id, substep))
            })
            .await?;

        self.publish_substep_change(goal_id, &substep);
        Ok(substep)
    }

    fn publish_substep_change(&self, goal_id: u64, substep: &Substep) {
        self.events.publish(StepEvent::SubstepChanged {
            goal_id,
            step_id: substep.step_id,
            substep_id: substep.id,
        });
    }

    /// Persists one occurrence's steps for one audience. `None` when they
    /// already existed.
    pub(crate) async fn insert_occurrence_steps(
        &self,
        goal_id: u64,
        occurrence_index: u32,
        audience: Audience,
        steps: Vec<NewStep>,
    ) -> Result<Option<Vec<Step>>> {
        let inserted = self
            .with_database(move |db| {
                db.insert_occurrence_steps(goal_id, occurrence_index, audience, &steps)
            })
            .await?;

        for step in inserted.iter().flatten() {
            self.events.publish(StepEvent::StepCreated {
                goal_id,
                step_id: step.id,
            });
        }
        Ok(inserted)
    }

    pub(crate) async fn has_occurrence_steps(
        &self,
        goal_id: u64,
        occurrence_index: u32,
        audience: Audience,
    ) -> Result<bool> {
        self.with_database(move |db| db.has_occurrence_steps(goal_id, occurrence_index, audience))
            .await
    }

    pub(crate) async fn occurrence_steps(
        &self,
        goal_id: u64,
        occurrence_index: u32,
    ) -> Result<(Vec<Step>, SubstepIndex)> {
        self.with_database(move |db| {
            let steps = db.get_occurrence_steps(goal_id, occurrence_index)?;
            let substeps = db.get_goal_substeps(goal_id)?;
            Ok((steps, substeps))
        })
        .await
    }
}
