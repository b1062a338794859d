//! Tests for the tracker module.

use std::time::Duration;

use jiff::{tz::TimeZone, SignedDuration};
use tempfile::TempDir;

use super::*;
use crate::{
    events::StepEvent,
    generation::TemplateGenerator,
    models::{GenerationStatus, GoalStatus, StepStatus},
    monitor::StallReason,
    params::{AddSubstep, CreateGoal, Id, ListGoals, UpdateStep},
    ProgressError,
};

fn test_config() -> EngineConfig {
    EngineConfig::default()
        .with_time_zone(TimeZone::UTC)
        .with_throttle_interval(Duration::ZERO)
}

/// Helper function to create a test tracker
async fn create_test_tracker_with(config: EngineConfig) -> (TempDir, Tracker) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let tracker = TrackerBuilder::new()
        .with_database_path(&db_path)
        .with_config(config)
        .build()
        .await
        .expect("Failed to create tracker");
    (temp_dir, tracker)
}

async fn create_test_tracker() -> (TempDir, Tracker) {
    create_test_tracker_with(test_config()).await
}

fn one_off(title: &str) -> CreateGoal {
    CreateGoal {
        title: title.to_string(),
        start_date: Some("2024-03-04".to_string()),
        ..Default::default()
    }
}

/// A goal with generated steps
async fn generated_goal(tracker: &Tracker) -> Goal {
    let goal = tracker
        .create_goal(&one_off("Call grandma"))
        .await
        .expect("Failed to create goal");
    tracker
        .orchestrator(TemplateGenerator)
        .start(goal.id)
        .await
        .expect("Failed to generate steps");
    goal
}

#[tokio::test]
async fn test_create_and_get_goal() {
    let (_temp_dir, tracker) = create_test_tracker().await;

    let goal = tracker
        .create_goal(&CreateGoal {
            title: "  Evening walk ".to_string(),
            start_date: Some("2024-01-01".to_string()),
            selected_days: Some("mon,wed,fri".to_string()),
            duration_weeks: Some(2),
            ..Default::default()
        })
        .await
        .expect("Failed to create goal");

    assert_eq!(goal.title, "Evening walk");
    assert_eq!(goal.frequency_per_week, Some(3));
    assert_eq!(goal.status, GoalStatus::Planned);
    assert_eq!(goal.metadata.generation.status(), GenerationStatus::None);

    let fetched = tracker
        .get_goal(&Id { id: goal.id })
        .await
        .expect("Failed to get goal")
        .expect("Goal should exist");
    assert_eq!(fetched, goal);

    let missing = tracker.get_goal(&Id { id: 999 }).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_create_goal_rejects_inverted_range() {
    let (_temp_dir, tracker) = create_test_tracker().await;

    let result = tracker
        .create_goal(&CreateGoal {
            title: "Backwards".to_string(),
            start_date: Some("2024-01-10".to_string()),
            due_date: Some("2024-01-01".to_string()),
            ..Default::default()
        })
        .await;

    assert!(matches!(result, Err(ProgressError::InvalidDateRange { .. })));
    let goals = tracker.list_goals(&ListGoals::default()).await.unwrap();
    assert!(goals.is_empty());
}

#[tokio::test]
async fn test_list_goals_counts_steps_and_hides_archived() {
    let (_temp_dir, tracker) = create_test_tracker().await;

    let goal = generated_goal(&tracker).await;
    let archived = tracker.create_goal(&one_off("Old goal")).await.unwrap();
    tracker
        .archive_goal(&Id { id: archived.id })
        .await
        .expect("Failed to archive goal");

    let active = tracker.list_goals(&ListGoals { archived: false }).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, goal.id);
    assert_eq!(active[0].total_steps, 3);
    assert_eq!(active[0].completed_steps, 0);
    assert_eq!(active[0].generation_status, GenerationStatus::Completed);

    let all = tracker.list_goals(&ListGoals { archived: true }).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_queue_generation_only_from_none() {
    let (_temp_dir, tracker) = create_test_tracker().await;
    let goal = tracker.create_goal(&one_off("Queue me")).await.unwrap();

    let metadata = tracker
        .queue_generation(&Id { id: goal.id })
        .await
        .expect("Failed to queue");
    assert_eq!(metadata.generation.status(), GenerationStatus::Queued);

    let again = tracker.queue_generation(&Id { id: goal.id }).await;
    assert!(matches!(again, Err(ProgressError::InvalidTransition { .. })));
}

#[tokio::test]
async fn test_view_goal_marks_stale_queued_run_failed() {
    let (_temp_dir, tracker) =
        create_test_tracker_with(test_config().with_stale_after(SignedDuration::ZERO)).await;
    let goal = tracker.create_goal(&one_off("Abandoned")).await.unwrap();
    tracker.queue_generation(&Id { id: goal.id }).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let view = tracker
        .view_goal(&Id { id: goal.id })
        .await
        .expect("Failed to view goal");

    let action = view.recovery.expect("Expected a recovery signal");
    assert_eq!(action.reason(), StallReason::Queued);
    assert_eq!(
        view.goal.metadata.generation.error(),
        Some("stalled from queued state")
    );

    // The signal is acted on by retrying, which recovers the goal
    let run = tracker
        .orchestrator(TemplateGenerator)
        .retry(goal.id)
        .await
        .expect("Retry should succeed");
    assert_eq!(run.status, GenerationStatus::Completed);

    let view = tracker.view_goal(&Id { id: goal.id }).await.unwrap();
    assert!(view.recovery.is_none());
    assert_eq!(view.steps.len(), 3);
}

#[tokio::test]
async fn test_view_goal_leaves_fresh_runs_alone() {
    let (_temp_dir, tracker) = create_test_tracker().await;
    let goal = tracker.create_goal(&one_off("Fresh")).await.unwrap();
    tracker.queue_generation(&Id { id: goal.id }).await.unwrap();

    let view = tracker.view_goal(&Id { id: goal.id }).await.unwrap();
    assert!(view.recovery.is_none());
    assert_eq!(
        view.goal.metadata.generation.status(),
        GenerationStatus::Queued
    );
}

#[tokio::test]
async fn test_view_goal_gates_generated_chain() {
    let (_temp_dir, tracker) = create_test_tracker().await;
    let goal = generated_goal(&tracker).await;

    let view = tracker.view_goal(&Id { id: goal.id }).await.unwrap();
    let upcoming = view.upcoming(4);
    let blocked: Vec<bool> = upcoming.shown.iter().map(|g| g.blocked).collect();
    assert_eq!(blocked, vec![false, true, true]);
    assert_eq!(upcoming.queued, 0);

    tracker
        .update_step_status(view.steps[0].id, StepStatus::Done)
        .await
        .unwrap();

    let view = tracker.view_goal(&Id { id: goal.id }).await.unwrap();
    assert_eq!(view.completed_count(), 1);
    let upcoming = view.upcoming(4);
    assert_eq!(upcoming.shown.len(), 2);
    assert!(!upcoming.shown[0].blocked);
    assert!(upcoming.shown[1].blocked);
}

#[tokio::test]
async fn test_update_step_publishes_status_change() {
    let (_temp_dir, tracker) = create_test_tracker().await;
    let goal = generated_goal(&tracker).await;
    let steps = tracker.get_steps(&Id { id: goal.id }).await.unwrap();
    let mut subscription = tracker.subscribe(goal.id);

    let step = tracker
        .update_step(&UpdateStep {
            id: steps[0].id,
            status: Some("in_progress".to_string()),
            title: Some("Find the phone".to_string()),
            description: None,
        })
        .await
        .expect("Failed to update step");

    assert_eq!(step.status, StepStatus::InProgress);
    assert_eq!(step.title, "Find the phone");
    assert_eq!(
        subscription.try_recv(),
        Some(StepEvent::StatusChanged {
            goal_id: goal.id,
            step_id: step.id,
            status: StepStatus::InProgress,
        })
    );
}

#[tokio::test]
async fn test_update_missing_step() {
    let (_temp_dir, tracker) = create_test_tracker().await;

    let result = tracker.update_step_status(42, StepStatus::Done).await;
    assert!(matches!(result, Err(ProgressError::StepNotFound { id: 42 })));
}

#[tokio::test]
async fn test_substeps_decide_step_completion() {
    let (_temp_dir, tracker) = create_test_tracker().await;
    let goal = generated_goal(&tracker).await;
    let first = tracker.get_steps(&Id { id: goal.id }).await.unwrap()[0].clone();
    let mut subscription = tracker.subscribe(goal.id);

    let substep = tracker
        .add_substep(&AddSubstep {
            step_id: first.id,
            title: "Charge the phone".to_string(),
        })
        .await
        .expect("Failed to add substep");
    assert_eq!(
        subscription.try_recv(),
        Some(StepEvent::SubstepChanged {
            goal_id: goal.id,
            step_id: first.id,
            substep_id: substep.id,
        })
    );

    let started = tracker.start_substep(&Id { id: substep.id }).await.unwrap();
    assert!(started.initiated_at.is_some());
    assert!(started.completed_at.is_none());

    let view = tracker.view_goal(&Id { id: goal.id }).await.unwrap();
    assert_eq!(view.completed_count(), 0);

    let completed = tracker
        .complete_substep(&Id { id: substep.id })
        .await
        .unwrap();
    assert_eq!(completed.initiated_at, started.initiated_at);
    assert!(completed.completed_at.is_some());

    let view = tracker.view_goal(&Id { id: goal.id }).await.unwrap();
    assert_eq!(view.completed_count(), 1);
    // The next step is chained to this one and waits for its status
    assert!(view.upcoming(4).shown[0].blocked);

    let substeps = tracker.get_substeps(&Id { id: first.id }).await.unwrap();
    assert_eq!(substeps, vec![completed]);
}

#[tokio::test]
async fn test_add_substep_validation() {
    let (_temp_dir, tracker) = create_test_tracker().await;

    let blank = tracker
        .add_substep(&AddSubstep {
            step_id: 1,
            title: "   ".to_string(),
        })
        .await;
    assert!(matches!(blank, Err(ProgressError::InvalidInput { .. })));

    let missing = tracker
        .add_substep(&AddSubstep {
            step_id: 77,
            title: "Orphan".to_string(),
        })
        .await;
    assert!(matches!(missing, Err(ProgressError::StepNotFound { id: 77 })));

    let unknown = tracker.start_substep(&Id { id: 5 }).await;
    assert!(matches!(unknown, Err(ProgressError::SubstepNotFound { id: 5 })));
}

#[tokio::test]
async fn test_get_steps_of_missing_goal() {
    let (_temp_dir, tracker) = create_test_tracker().await;

    let result = tracker.get_steps(&Id { id: 3 }).await;
    assert!(matches!(result, Err(ProgressError::GoalNotFound { id: 3 })));
}
