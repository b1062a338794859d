//! Drives step generation for a goal's occurrences.
//!
//! A run moves the goal's generation status through
//! `none|queued -> pending -> completed|failed`. The move to `pending` happens
//! right before the first upstream call, so a goal whose schedule fails
//! validation keeps its prior status. Each occurrence is retried on its own;
//! only a failure of occurrence 0, which every later occurrence waits on,
//! fails the run. Habit goals generate occurrence 0 eagerly and leave the rest
//! to [`GenerationOrchestrator::advance`].

use std::sync::Arc;

use jiff::Timestamp;
use log::{debug, error, info, warn};

use super::{
    client::{validate_response, GenerationError, GenerationRequest, GeneratedStep, StepGenerator},
    throttle::{Throttle, ThrottledGenerator},
    timing,
};
use crate::{
    error::{ProgressError, Result},
    gating::StepGate,
    models::{
        Audience, FailedDay, GenerationState, GenerationStatus, Goal, GoalStatus, NewStep,
        OccurrencePlan, Step, StepType, TransitionCause,
    },
    schedule::{self, ScheduleRequest},
    tracker::Tracker,
};

/// Most steps kept from a single generation call.
pub const MAX_STEPS_PER_OCCURRENCE: usize = 50;

/// `order_index` distance between consecutive occurrences.
const OCCURRENCE_ORDER_STRIDE: u32 = 100;

/// Supporter steps sort after the individual's within an occurrence.
const SUPPORTER_ORDER_OFFSET: u32 = 50;

/// Outcome of a generation run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub goal_id: u64,
    /// Occurrences whose steps were generated by this run
    pub successful_count: usize,
    /// Occurrences that already had steps and were left alone
    pub skipped_count: usize,
    /// Occurrences left for the daily trigger
    pub deferred_count: usize,
    pub failed_days: Vec<FailedDay>,
    /// Steps created by this run, supporter steps included
    pub steps: Vec<Step>,
    /// Generation status after the run
    pub status: GenerationStatus,
}

impl RunResult {
    fn new(goal_id: u64) -> Self {
        Self {
            goal_id,
            successful_count: 0,
            skipped_count: 0,
            deferred_count: 0,
            failed_days: Vec::new(),
            steps: Vec::new(),
            status: GenerationStatus::None,
        }
    }
}

/// What a daily-trigger check did.
#[derive(Debug, Clone)]
pub enum AdvanceOutcome {
    /// The goal does not recur
    NotHabit,
    /// The goal was checked too recently
    NotDueYet { next_check: Timestamp },
    /// The first run has not completed yet
    AwaitingInitialRun,
    /// Steps of the last generated occurrence are still open
    PriorIncomplete { index: usize },
    /// Every planned occurrence has steps
    AllGenerated,
    /// Steps for occurrence `index` were created; empty when they already existed
    Generated { index: usize, steps: Vec<Step> },
    /// Generation for the next occurrence exhausted its retries
    Failed(FailedDay),
}

enum OccurrenceOutcome {
    Generated(Vec<Step>),
    Skipped,
    Failed(FailedDay),
}

/// Moves the goal to `pending` right before the first upstream call of a run.
struct PendingMark {
    cause: Option<TransitionCause>,
}

impl PendingMark {
    fn armed(cause: TransitionCause) -> Self {
        Self { cause: Some(cause) }
    }

    /// Daily-trigger generation leaves the status alone.
    fn disarmed() -> Self {
        Self { cause: None }
    }
}

/// Generates steps for a goal's occurrences through a [`StepGenerator`].
#[derive(Clone)]
pub struct GenerationOrchestrator {
    tracker: Tracker,
    generator: Arc<dyn StepGenerator>,
}

impl std::fmt::Debug for GenerationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationOrchestrator")
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

impl GenerationOrchestrator {
    /// Wraps `generator` in the configured throttle.
    pub fn new<G>(tracker: Tracker, generator: G) -> Self
    where
        G: StepGenerator + 'static,
    {
        let throttle = Throttle::new(tracker.config.throttle_interval);
        Self {
            tracker,
            generator: Arc::new(ThrottledGenerator::new(generator, throttle)),
        }
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// First generation run for a goal.
    ///
    /// # Errors
    ///
    /// Schedule validation errors are returned before any status change.
    /// `Generation` when occurrence 0 could not be generated, `GlobalTimeout`
    /// when the run exceeded its time limit.
    pub async fn start(&self, goal_id: u64) -> Result<RunResult> {
        self.run_for(goal_id, TransitionCause::Run).await
    }

    /// Re-runs generation for a failed goal. The schedule is recomputed and
    /// occurrences that already have steps are skipped.
    pub async fn retry(&self, goal_id: u64) -> Result<RunResult> {
        self.run_for(goal_id, TransitionCause::Retry).await
    }

    async fn run_for(&self, goal_id: u64, cause: TransitionCause) -> Result<RunResult> {
        let goal = self.tracker.load_goal(goal_id).await?;
        Tracker::ensure_not_archived(&goal)?;

        let request = ScheduleRequest::for_goal(&goal, &self.tracker.config.time_zone);
        let schedule = schedule::compute(&request)?;
        if schedule.trimmed > 0 {
            debug!(
                "Goal {goal_id}: {} occurrence(s) fall after the due date",
                schedule.trimmed
            );
        }

        self.run(&goal, &schedule.occurrences, cause).await
    }

    /// Generates steps for `occurrences` of `goal` under the run timeout.
    ///
    /// A run that ends in an error after reaching `pending`, the timeout
    /// included, leaves the goal `failed` with the error message.
    pub async fn run(
        &self,
        goal: &Goal,
        occurrences: &[Timestamp],
        cause: TransitionCause,
    ) -> Result<RunResult> {
        let limit = self.tracker.config.run_timeout;

        let error = match tokio::time::timeout(limit, self.run_occurrences(goal, occurrences, cause))
            .await
        {
            Ok(Ok(result)) => return Ok(result),
            Ok(Err(e)) => e,
            Err(_) => ProgressError::GlobalTimeout { limit },
        };

        error!("Goal {}: generation run failed: {error}", goal.id);
        if let Err(e) = self.fail_if_pending(goal.id, error.to_string(), cause).await {
            error!("Goal {}: could not record the failed run: {e}", goal.id);
        }
        Err(error)
    }

    /// Moves a goal left in `pending` to `failed`; any other status is kept.
    async fn fail_if_pending(
        &self,
        goal_id: u64,
        message: String,
        cause: TransitionCause,
    ) -> Result<()> {
        self.tracker
            .update_metadata(goal_id, move |metadata| {
                if metadata.generation.status() != GenerationStatus::Pending {
                    return Ok(());
                }
                metadata.generation.transition(
                    GenerationState::Failed {
                        failed_at: Timestamp::now(),
                        error: message,
                    },
                    cause,
                )
            })
            .await?;
        Ok(())
    }

    async fn run_occurrences(
        &self,
        goal: &Goal,
        occurrences: &[Timestamp],
        cause: TransitionCause,
    ) -> Result<RunResult> {
        if occurrences.is_empty() {
            return Err(ProgressError::invalid_input("occurrences")
                .with_reason("A run needs at least one occurrence"));
        }

        let mut result = RunResult::new(goal.id);
        let targets = if goal.is_habit() && occurrences.len() > 1 {
            self.ensure_occurrence_plan(goal.id, occurrences).await?;
            result.deferred_count = occurrences.len() - 1;
            vec![0]
        } else {
            (0..occurrences.len()).collect()
        };

        let mut mark = PendingMark::armed(cause);
        let mut generated = Vec::new();

        for index in targets {
            match self
                .generate_occurrence(goal, occurrences, index, &mut mark)
                .await?
            {
                OccurrenceOutcome::Generated(steps) => {
                    result.successful_count += 1;
                    result.steps.extend(steps);
                    generated.push(index);
                }
                OccurrenceOutcome::Skipped => {
                    result.skipped_count += 1;
                    generated.push(index);
                }
                OccurrenceOutcome::Failed(failure) => result.failed_days.push(failure),
            }
        }

        self.finish(goal, result, generated, cause).await
    }

    /// Persists the outcome of a run.
    async fn finish(
        &self,
        goal: &Goal,
        mut result: RunResult,
        generated: Vec<usize>,
        cause: TransitionCause,
    ) -> Result<RunResult> {
        let failures = result.failed_days.clone();

        if let Some(gating) = failures.iter().find(|f| f.index == 0).cloned() {
            let message = gating.error.clone();
            let persisted = message.clone();
            self.tracker
                .update_metadata(goal.id, move |metadata| {
                    for failure in failures {
                        metadata.record_failure(failure);
                    }
                    if metadata.generation.status() == GenerationStatus::Pending {
                        metadata.generation.transition(
                            GenerationState::Failed {
                                failed_at: Timestamp::now(),
                                error: persisted,
                            },
                            cause,
                        )?;
                    }
                    Ok(())
                })
                .await?;

            error!("Goal {}: occurrence 0 failed, run failed: {message}", goal.id);
            return Err(ProgressError::Generation { index: 0, message });
        }

        let metadata = self
            .tracker
            .update_metadata(goal.id, move |metadata| {
                for failure in failures {
                    metadata.record_failure(failure);
                }
                for &index in &generated {
                    metadata.clear_failure(index);
                    if let Some(plan) = metadata.occurrence_plan.as_mut() {
                        plan.mark_generated(index);
                    }
                }

                let now = Timestamp::now();
                match metadata.generation.status() {
                    GenerationStatus::Pending => {}
                    GenerationStatus::Completed => return Ok(()),
                    // Everything already existed, so nothing was called
                    _ => metadata
                        .generation
                        .transition(GenerationState::Pending { started_at: now }, cause)?,
                }
                metadata
                    .generation
                    .transition(GenerationState::Completed { completed_at: now }, cause)
            })
            .await?;

        if goal.status == GoalStatus::Planned {
            self.tracker
                .set_goal_status(goal.id, GoalStatus::Active)
                .await?;
        }

        result.status = metadata.generation.status();
        info!(
            "Goal {} generation {}: {} generated, {} skipped, {} failed, {} deferred",
            goal.id,
            result.status,
            result.successful_count,
            result.skipped_count,
            result.failed_days.len(),
            result.deferred_count
        );
        Ok(result)
    }

    /// The daily trigger for habit goals.
    ///
    /// Generates the next planned occurrence once every individual step of
    /// the last generated one is complete. A goal is looked at no more often
    /// than the configured minimum check interval.
    pub async fn advance(&self, goal_id: u64, now: Timestamp) -> Result<AdvanceOutcome> {
        let goal = self.tracker.load_goal(goal_id).await?;
        if !goal.is_habit() {
            return Ok(AdvanceOutcome::NotHabit);
        }
        Tracker::ensure_not_archived(&goal)?;

        if let Some(last_check) = goal.metadata.last_generation_check {
            let next_check = last_check.checked_add(self.tracker.config.min_check_interval)?;
            if now < next_check {
                return Ok(AdvanceOutcome::NotDueYet { next_check });
            }
        }
        self.tracker
            .update_metadata(goal_id, move |metadata| {
                metadata.last_generation_check = Some(now);
                Ok(())
            })
            .await?;

        if goal.metadata.generation.status() != GenerationStatus::Completed {
            return Ok(AdvanceOutcome::AwaitingInitialRun);
        }
        let Some(plan) = goal.metadata.occurrence_plan.clone() else {
            return Ok(AdvanceOutcome::AllGenerated);
        };
        let Some(next) = plan.next_index() else {
            return Ok(AdvanceOutcome::AllGenerated);
        };

        if let Some(last) = plan.last_generated_occurrence_index {
            let (steps, substeps) = self
                .tracker
                .occurrence_steps(goal_id, occurrence_key(last)?)
                .await?;
            let gate = StepGate::new(&steps, &substeps);
            let done = steps
                .iter()
                .filter(|step| !step.is_supporter_step)
                .all(|step| gate.is_complete(step));
            if !done {
                return Ok(AdvanceOutcome::PriorIncomplete { index: last });
            }
        }

        let limit = self.tracker.config.run_timeout;
        let mut mark = PendingMark::disarmed();
        let outcome = tokio::time::timeout(
            limit,
            self.generate_occurrence(&goal, &plan.planned_occurrences, next, &mut mark),
        )
        .await
        .map_err(|_| ProgressError::GlobalTimeout { limit })??;

        match outcome {
            OccurrenceOutcome::Failed(failure) => {
                let recorded = failure.clone();
                self.tracker
                    .update_metadata(goal_id, move |metadata| {
                        metadata.record_failure(recorded);
                        Ok(())
                    })
                    .await?;
                Ok(AdvanceOutcome::Failed(failure))
            }
            OccurrenceOutcome::Generated(steps) => {
                self.mark_generated(goal_id, next).await?;
                info!("Goal {goal_id}: generated occurrence {next}");
                Ok(AdvanceOutcome::Generated { index: next, steps })
            }
            OccurrenceOutcome::Skipped => {
                self.mark_generated(goal_id, next).await?;
                Ok(AdvanceOutcome::Generated {
                    index: next,
                    steps: Vec::new(),
                })
            }
        }
    }

    async fn mark_generated(&self, goal_id: u64, index: usize) -> Result<()> {
        self.tracker
            .update_metadata(goal_id, move |metadata| {
                metadata.clear_failure(index);
                if let Some(plan) = metadata.occurrence_plan.as_mut() {
                    plan.mark_generated(index);
                }
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Stores the full schedule of a habit goal unless a plan exists.
    async fn ensure_occurrence_plan(&self, goal_id: u64, occurrences: &[Timestamp]) -> Result<()> {
        let planned = occurrences.to_vec();
        self.tracker
            .update_metadata(goal_id, move |metadata| {
                if metadata.occurrence_plan.is_none() {
                    metadata.occurrence_plan = Some(OccurrencePlan::new(planned));
                }
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn mark_pending(&self, goal_id: u64, mark: &mut PendingMark) -> Result<()> {
        let Some(cause) = mark.cause.take() else {
            return Ok(());
        };

        self.tracker
            .update_metadata(goal_id, move |metadata| {
                metadata.generation.transition(
                    GenerationState::Pending {
                        started_at: Timestamp::now(),
                    },
                    cause,
                )
            })
            .await?;
        info!("Goal {goal_id} generation pending");
        Ok(())
    }

    async fn generate_occurrence(
        &self,
        goal: &Goal,
        occurrences: &[Timestamp],
        index: usize,
        mark: &mut PendingMark,
    ) -> Result<OccurrenceOutcome> {
        let key = occurrence_key(index)?;
        if self
            .tracker
            .has_occurrence_steps(goal.id, key, Audience::Individual)
            .await?
        {
            debug!("Goal {}: occurrence {index} already has steps", goal.id);
            return Ok(OccurrenceOutcome::Skipped);
        }

        let time_zone = &self.tracker.config.time_zone;
        let start = occurrences.get(index).copied().ok_or_else(|| {
            ProgressError::invalid_input("occurrence_index")
                .with_reason(format!("Occurrence {index} is outside the schedule"))
        })?;
        let (week, session) = schedule::week_and_session(goal.start_date, occurrences, index, time_zone)?;

        let request = GenerationRequest {
            goal_id: goal.id,
            goal_title: goal.title.clone(),
            category: goal.category.clone(),
            description: goal.description.clone(),
            occurrence_index: index,
            occurrence_start: start,
            total_occurrences: occurrences.len(),
            week_number: week,
            session_number: session,
            frequency_per_week: goal.frequency_per_week,
            duration_weeks: goal.duration_weeks,
            audience: Audience::Individual,
            support_role: goal.support_role,
        };

        self.mark_pending(goal.id, mark).await?;

        let generated = match self.generate_with_retry(&request).await {
            Ok(generated) => generated,
            Err(e) => {
                warn!("Goal {}: occurrence {index} failed: {e}", goal.id);
                return Ok(OccurrenceOutcome::Failed(FailedDay {
                    index,
                    date: start,
                    error: e.to_string(),
                }));
            }
        };

        let new_steps = generated
            .iter()
            .take(MAX_STEPS_PER_OCCURRENCE)
            .enumerate()
            .map(|(position, step)| {
                Ok(NewStep {
                    order_index: occurrence_base(key) + position as u32,
                    due_date: Some(timing::individual_due(
                        start, position, step.phase, time_zone,
                    )?),
                    is_required: true,
                    is_supporter_step: false,
                    depends_on_previous: position > 0,
                    ..new_step(step, week, session)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let Some(mut steps) = self
            .tracker
            .insert_occurrence_steps(goal.id, key, Audience::Individual, new_steps)
            .await?
        else {
            debug!("Goal {}: occurrence {index} was stored concurrently", goal.id);
            return Ok(OccurrenceOutcome::Skipped);
        };
        debug!(
            "Goal {}: stored {} step(s) for occurrence {index}",
            goal.id,
            steps.len()
        );

        if goal.support_role.wants_supporter_steps() {
            steps.extend(self.generate_supporter_steps(request, key).await);
        }

        Ok(OccurrenceOutcome::Generated(steps))
    }

    /// Supporter steps for one occurrence. Failures are logged and dropped so
    /// they never hold up the individual's steps.
    async fn generate_supporter_steps(&self, request: GenerationRequest, key: u32) -> Vec<Step> {
        let goal_id = request.goal_id;
        let index = request.occurrence_index;

        match self.try_supporter_steps(request, key).await {
            Ok(steps) => steps,
            Err(e) => {
                warn!("Goal {goal_id}: supporter steps for occurrence {index} skipped: {e}");
                Vec::new()
            }
        }
    }

    async fn try_supporter_steps(&self, request: GenerationRequest, key: u32) -> Result<Vec<Step>> {
        let goal_id = request.goal_id;
        if self
            .tracker
            .has_occurrence_steps(goal_id, key, Audience::Supporter)
            .await?
        {
            return Ok(Vec::new());
        }

        let request = GenerationRequest {
            audience: Audience::Supporter,
            ..request
        };
        let generated = self
            .generate_with_retry(&request)
            .await
            .map_err(|e| ProgressError::invalid_input("supporter_steps").with_reason(e.to_string()))?;

        let due = timing::supporter_due(request.occurrence_start, &self.tracker.config.time_zone)?;
        let new_steps = generated
            .iter()
            .take(MAX_STEPS_PER_OCCURRENCE)
            .enumerate()
            .map(|(position, step)| NewStep {
                order_index: occurrence_base(key) + SUPPORTER_ORDER_OFFSET + position as u32,
                due_date: Some(due),
                is_required: false,
                is_supporter_step: true,
                depends_on_previous: false,
                ..new_step(step, request.week_number, request.session_number)
            })
            .collect();

        Ok(self
            .tracker
            .insert_occurrence_steps(goal_id, key, Audience::Supporter, new_steps)
            .await?
            .unwrap_or_default())
    }

    /// Calls the generator until it succeeds, fails for good, or runs out of
    /// attempts.
    async fn generate_with_retry(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<Vec<GeneratedStep>, GenerationError> {
        let policy = &self.tracker.config.retry;
        let call_timeout = self.tracker.config.call_timeout;
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let outcome = tokio::time::timeout(call_timeout, self.generator.generate(request))
                .await
                .unwrap_or_else(|_| {
                    Err(GenerationError::timeout(format!(
                        "no answer within {}ms",
                        call_timeout.as_millis()
                    )))
                })
                .and_then(|steps| validate_response(&steps).map(|()| steps));

            match outcome {
                Ok(steps) => return Ok(steps),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let backoff = policy.backoff_for(e.kind);
                    warn!(
                        "Goal {} occurrence {} ({}): attempt {attempt}/{max_attempts} failed: {e}; retrying in {}ms",
                        request.goal_id,
                        request.occurrence_index,
                        request.audience.as_str(),
                        backoff.as_millis()
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Fields shared by individual and supporter steps.
fn new_step(step: &GeneratedStep, week: u32, session: u32) -> NewStep {
    NewStep {
        title: step.title.trim().to_string(),
        description: step.description.clone(),
        order_index: 0,
        due_date: None,
        is_required: true,
        is_supporter_step: false,
        step_type: StepType::Action,
        week_number: Some(week),
        session_number: Some(session),
        estimated_minutes: step.estimated_minutes,
        depends_on_previous: false,
    }
}

fn occurrence_key(index: usize) -> Result<u32> {
    u32::try_from(index).map_err(|_| {
        ProgressError::invalid_input("occurrence_index")
            .with_reason(format!("Occurrence {index} is out of range"))
    })
}

fn occurrence_base(key: u32) -> u32 {
    key.saturating_mul(OCCURRENCE_ORDER_STRIDE)
}
