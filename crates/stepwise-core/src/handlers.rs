//! Workflows that span several tracker and orchestrator calls.
//!
//! Interfaces call these instead of stitching the lower-level operations
//! together themselves:
//!
//! ```text
//! Interface → Handler → Tracker + GenerationOrchestrator → Models
//! ```
//!
//! Handlers return structured data; formatting is left to [`crate::display`].

use jiff::{civil::Date, tz::TimeZone, Timestamp};
use log::{info, warn};

use crate::{
    error::{ProgressError, Result},
    generation::{AdvanceOutcome, GenerationOrchestrator, RunResult},
    models::Goal,
    params::{CreateGoal, Id},
    schedule::{self, Schedule, ScheduleRequest},
    tracker::GoalView,
};

/// A stored goal and how its first generation run went.
#[derive(Debug)]
pub struct CreatedGoal {
    pub goal: Goal,
    /// Generation problems do not undo the goal; they are reported here
    pub run: std::result::Result<RunResult, ProgressError>,
}

/// A goal view, possibly after an abandoned run was retried.
#[derive(Debug)]
pub struct ShownGoal {
    pub view: GoalView,
    /// Set when the monitor asked for a retry
    pub retry: Option<std::result::Result<RunResult, ProgressError>>,
}

/// Create a goal and generate its first steps.
///
/// The goal is queued before the run starts, so an interrupted run is picked
/// up by the stale-run monitor the next time the goal is viewed.
///
/// # Errors
///
/// Only validation and storage errors of the goal itself.
///
/// # Examples
///
/// ```rust,no_run
/// # use stepwise_core::{generation::TemplateGenerator, handlers, params::CreateGoal, TrackerBuilder};
/// # async {
/// let tracker = TrackerBuilder::new().build().await?;
/// let orchestrator = tracker.orchestrator(TemplateGenerator);
/// let created = handlers::handle_create_goal(
///     &orchestrator,
///     &CreateGoal {
///         title: "Evening walk".to_string(),
///         ..Default::default()
///     },
/// )
/// .await?;
/// # stepwise_core::Result::<()>::Ok(())
/// # };
/// ```
pub async fn handle_create_goal(
    orchestrator: &GenerationOrchestrator,
    params: &CreateGoal,
) -> Result<CreatedGoal> {
    let tracker = orchestrator.tracker();
    let goal = tracker.create_goal(params).await?;
    tracker.queue_generation(&Id { id: goal.id }).await?;

    let run = orchestrator.start(goal.id).await;
    if let Err(e) = &run {
        warn!("Goal {} created but generation did not finish: {e}", goal.id);
    }

    // Re-read so the caller sees the status the run left behind
    let goal = tracker.load_goal(goal.id).await?;
    Ok(CreatedGoal { goal, run })
}

/// Show a goal, retrying generation when the monitor found it abandoned.
///
/// # Errors
///
/// `GoalNotFound` and storage errors. A failed retry is reported through
/// [`ShownGoal::retry`].
pub async fn handle_show_goal(
    orchestrator: &GenerationOrchestrator,
    params: &Id,
) -> Result<ShownGoal> {
    let tracker = orchestrator.tracker();
    let view = tracker.view_goal(params).await?;
    let Some(action) = view.recovery else {
        return Ok(ShownGoal { view, retry: None });
    };

    info!(
        "Goal {}: generation {}, retrying",
        action.goal_id(),
        action.reason()
    );
    let run = orchestrator.retry(action.goal_id()).await;
    if let Err(e) = &run {
        warn!("Goal {}: retry failed: {e}", action.goal_id());
    }

    let mut view = tracker.view_goal(params).await?;
    // Keep the original signal so callers can tell a retry happened
    view.recovery = Some(action);
    Ok(ShownGoal {
        view,
        retry: Some(run),
    })
}

/// Run the daily check for one goal at the current instant.
pub async fn handle_advance_goal(
    orchestrator: &GenerationOrchestrator,
    params: &Id,
) -> Result<AdvanceOutcome> {
    orchestrator.advance(params.id, Timestamp::now()).await
}

/// Compute the occurrences a goal would get, without storing anything.
///
/// Returns the validated start date along with the schedule.
pub fn handle_preview_schedule(
    params: &CreateGoal,
    time_zone: &TimeZone,
) -> Result<(Date, Schedule)> {
    let today = Timestamp::now().to_zoned(time_zone.clone()).date();
    let goal = params.validate(today)?;
    let request = ScheduleRequest::for_new_goal(&goal, time_zone);
    Ok((goal.start_date, schedule::compute(&request)?))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jiff::{civil::date, SignedDuration};
    use tempfile::TempDir;

    use super::*;
    use crate::{
        config::EngineConfig,
        generation::TemplateGenerator,
        models::GenerationStatus,
        TrackerBuilder,
    };

    async fn orchestrator(config: EngineConfig) -> (TempDir, GenerationOrchestrator) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let tracker = TrackerBuilder::new()
            .with_database_path(temp_dir.path().join("test.db"))
            .with_config(config)
            .build()
            .await
            .expect("Failed to create tracker");
        (temp_dir, tracker.orchestrator(TemplateGenerator))
    }

    fn test_config() -> EngineConfig {
        EngineConfig::default()
            .with_time_zone(TimeZone::UTC)
            .with_throttle_interval(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_create_goal_generates_steps() {
        let (_temp_dir, orchestrator) = orchestrator(test_config()).await;

        let created = handle_create_goal(
            &orchestrator,
            &CreateGoal {
                title: "Call grandma".to_string(),
                start_date: Some("2024-03-04".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to create goal");

        let run = created.run.expect("Generation should succeed");
        assert_eq!(run.steps.len(), 3);
        assert_eq!(
            created.goal.metadata.generation.status(),
            GenerationStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_create_goal_keeps_goal_when_schedule_is_empty() {
        let (_temp_dir, orchestrator) = orchestrator(test_config()).await;

        // 2024-03-04 is a Monday; no Sunday falls inside the range
        let created = handle_create_goal(
            &orchestrator,
            &CreateGoal {
                title: "Sunday run".to_string(),
                start_date: Some("2024-03-04".to_string()),
                due_date: Some("2024-03-06".to_string()),
                selected_days: Some("sun".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("Goal should still be created");

        assert!(matches!(
            created.run,
            Err(ProgressError::NoOccurrencesFound { .. })
        ));
        assert_eq!(
            created.goal.metadata.generation.status(),
            GenerationStatus::Queued
        );
    }

    #[tokio::test]
    async fn test_show_goal_retries_abandoned_run() {
        let (_temp_dir, orchestrator) =
            orchestrator(test_config().with_stale_after(SignedDuration::ZERO)).await;
        let tracker = orchestrator.tracker();
        let goal = tracker
            .create_goal(&CreateGoal {
                title: "Stretch".to_string(),
                start_date: Some("2024-03-04".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        tracker.queue_generation(&Id { id: goal.id }).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let shown = handle_show_goal(&orchestrator, &Id { id: goal.id })
            .await
            .expect("Failed to show goal");

        assert!(shown.view.recovery.is_some());
        let run = shown.retry.expect("A retry should have run").unwrap();
        assert_eq!(run.status, GenerationStatus::Completed);
        assert_eq!(shown.view.steps.len(), 3);
    }

    #[tokio::test]
    async fn test_show_goal_without_recovery() {
        let (_temp_dir, orchestrator) = orchestrator(test_config()).await;
        let created = handle_create_goal(
            &orchestrator,
            &CreateGoal {
                title: "Water plants".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let shown = handle_show_goal(&orchestrator, &Id { id: created.goal.id })
            .await
            .unwrap();
        assert!(shown.retry.is_none());
        assert!(shown.view.recovery.is_none());
    }

    #[test]
    fn test_preview_schedule() {
        let (start, schedule) = handle_preview_schedule(
            &CreateGoal {
                title: "Evening walk".to_string(),
                start_date: Some("2024-01-01".to_string()),
                selected_days: Some("mon,wed,fri".to_string()),
                duration_weeks: Some(2),
                ..Default::default()
            },
            &TimeZone::UTC,
        )
        .expect("Schedule should compute");

        assert_eq!(start, date(2024, 1, 1));
        assert_eq!(schedule.occurrences.len(), 6);
    }
}
