use async_trait::async_trait;
use jiff::Timestamp;
use stepwise_core::{
    events::StepEvent,
    generation::{GeneratedStep, GenerationError, GenerationRequest, Phase},
    params::{CreateGoal, Id},
    AdvanceOutcome, StepGenerator, StepStatus, TemplateGenerator,
};

mod common;

use common::create_test_tracker;

/// Answers every request with `count` numbered steps
struct Numbered {
    count: usize,
}

#[async_trait]
impl StepGenerator for Numbered {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedStep>, GenerationError> {
        Ok((1..=self.count)
            .map(|n| GeneratedStep::new(format!("{} part {n}", request.goal_title), Phase::Activation))
            .collect())
    }
}

#[tokio::test]
async fn test_habit_progresses_one_occurrence_at_a_time() {
    let (_temp_dir, tracker) = create_test_tracker().await;
    let goal = tracker
        .create_goal(&CreateGoal {
            title: "Evening walk".to_string(),
            start_date: Some("2024-01-01".to_string()),
            selected_days: Some("mon,wed,fri".to_string()),
            duration_weeks: Some(2),
            time_of_day: Some("18:00".to_string()),
            ..Default::default()
        })
        .await
        .expect("Failed to create goal");
    let orchestrator = tracker.orchestrator(TemplateGenerator);

    let run = orchestrator.start(goal.id).await.expect("Failed to start");
    assert_eq!(run.successful_count, 1);
    assert_eq!(run.deferred_count, 5);

    let view = tracker.view_goal(&Id { id: goal.id }).await.unwrap();
    assert_eq!(view.steps.len(), 3);
    for step in &view.steps {
        tracker
            .update_step_status(step.id, StepStatus::Done)
            .await
            .unwrap();
    }

    let mut subscription = tracker.subscribe(goal.id);
    let outcome = orchestrator
        .advance(goal.id, Timestamp::now())
        .await
        .expect("Failed to advance");
    let AdvanceOutcome::Generated { index, steps } = outcome else {
        panic!("Expected a generated occurrence, got {outcome:?}");
    };
    assert_eq!(index, 1);
    assert_eq!(steps.len(), 3);
    assert!(steps.iter().all(|s| s.week_number == Some(1)));
    assert!(steps.iter().all(|s| s.session_number == Some(2)));

    for step in &steps {
        assert_eq!(
            subscription.try_recv(),
            Some(StepEvent::StepCreated {
                goal_id: goal.id,
                step_id: step.id,
            })
        );
    }

    let view = tracker.view_goal(&Id { id: goal.id }).await.unwrap();
    let upcoming = view.upcoming(4);
    assert_eq!(upcoming.shown.len(), 3);
    assert!(!upcoming.shown[0].blocked);
    assert_eq!(upcoming.shown[0].step.id, steps[0].id);

    // A second check right away is rate limited
    let again = orchestrator.advance(goal.id, Timestamp::now()).await.unwrap();
    assert!(matches!(again, AdvanceOutcome::NotDueYet { .. }));
}

#[tokio::test]
async fn test_upcoming_reveals_four_steps() {
    let (_temp_dir, tracker) = create_test_tracker().await;
    let goal = tracker
        .create_goal(&CreateGoal {
            title: "Tidy the flat".to_string(),
            start_date: Some("2024-05-06".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    tracker
        .orchestrator(Numbered { count: 6 })
        .start(goal.id)
        .await
        .expect("Failed to generate");

    let view = tracker.view_goal(&Id { id: goal.id }).await.unwrap();
    let upcoming = view.upcoming(tracker.config().upcoming_limit);
    assert_eq!(upcoming.shown.len(), 4);
    assert_eq!(upcoming.queued, 2);
    let blocked: Vec<bool> = upcoming.shown.iter().map(|g| g.blocked).collect();
    assert_eq!(blocked, vec![false, true, true, true]);
}
