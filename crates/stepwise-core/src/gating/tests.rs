//! Tests for step gating.

use jiff::Timestamp;

use super::*;

fn step(id: u64, order_index: u32) -> Step {
    let now = Timestamp::UNIX_EPOCH;
    Step {
        id,
        goal_id: 1,
        title: format!("Step {id}"),
        description: None,
        order_index,
        status: StepStatus::NotStarted,
        due_date: None,
        is_required: true,
        is_planned: true,
        is_supporter_step: false,
        dependency_step_ids: vec![],
        step_type: StepType::Action,
        week_number: None,
        session_number: None,
        occurrence_index: None,
        estimated_minutes: None,
        created_at: now,
        updated_at: now,
    }
}

fn in_session(id: u64, order_index: u32, week: u32, session: u32) -> Step {
    Step {
        week_number: Some(week),
        session_number: Some(session),
        ..step(id, order_index)
    }
}

fn substep(id: u64, step_id: u64, done: bool) -> Substep {
    Substep {
        id,
        step_id,
        title: format!("Substep {id}"),
        completed_at: done.then_some(Timestamp::UNIX_EPOCH),
        initiated_at: None,
    }
}

fn ids(steps: &[&Step]) -> Vec<u64> {
    steps.iter().map(|s| s.id).collect()
}

#[test]
fn test_earlier_required_step_blocks_later_step() {
    let mut steps = vec![step(1, 0), step(2, 1)];
    let substeps = SubstepIndex::new();

    assert!(!is_blocked(&steps[0], &steps, &substeps));
    assert!(is_blocked(&steps[1], &steps, &substeps));

    steps[0].status = StepStatus::Done;
    assert!(!is_blocked(&steps[1], &steps, &substeps));
}

#[test]
fn test_optional_step_does_not_block() {
    let mut steps = vec![step(1, 0), step(2, 1)];
    steps[0].is_required = false;

    assert!(!is_blocked(&steps[1], &steps, &SubstepIndex::new()));
}

#[test]
fn test_skipped_step_leaves_the_sequence() {
    let mut steps = vec![step(1, 0), step(2, 1)];
    steps[0].status = StepStatus::Skipped;

    let substeps = SubstepIndex::new();
    let gate = StepGate::new(&steps, &substeps);
    assert_eq!(ids(gate.sequence()), vec![2]);
    assert!(!gate.is_blocked(&steps[1]));
}

#[test]
fn test_non_action_steps_do_not_gate() {
    let mut steps = vec![step(1, 0), step(2, 1)];
    steps[0].step_type = StepType::Note;

    assert!(!is_blocked(&steps[1], &steps, &SubstepIndex::new()));
}

#[test]
fn test_substeps_decide_completion() {
    let steps = vec![step(1, 0), step(2, 1)];
    let mut substeps = SubstepIndex::new();
    substeps.insert(1, vec![substep(10, 1, true), substep(11, 1, false)]);

    assert!(is_blocked(&steps[1], &steps, &substeps));

    substeps.insert(1, vec![substep(10, 1, true), substep(11, 1, true)]);
    assert!(!is_blocked(&steps[1], &steps, &substeps));
}

#[test]
fn test_dependency_must_be_closed() {
    let mut steps = vec![step(1, 0), step(2, 1)];
    steps[0].is_required = false;
    steps[1].dependency_step_ids = vec![1];

    assert!(is_blocked(&steps[1], &steps, &SubstepIndex::new()));

    steps[0].status = StepStatus::Skipped;
    assert!(!is_blocked(&steps[1], &steps, &SubstepIndex::new()));
}

#[test]
fn test_unknown_dependency_is_ignored() {
    let mut steps = vec![step(1, 0)];
    steps[0].dependency_step_ids = vec![99];

    assert!(!is_blocked(&steps[0], &steps, &SubstepIndex::new()));
}

#[test]
fn test_supporter_step_only_obeys_dependencies() {
    let mut steps = vec![step(1, 0), step(2, 1), step(3, 2)];
    steps[1].is_supporter_step = true;
    steps[2].is_supporter_step = true;
    steps[2].dependency_step_ids = vec![1];

    let substeps = SubstepIndex::new();
    let gate = StepGate::new(&steps, &substeps);
    assert!(!gate.is_blocked(&steps[1]));
    assert!(gate.is_blocked(&steps[2]));
}

#[test]
fn test_earlier_week_blocks_later_week() {
    let steps = vec![
        in_session(1, 0, 1, 1),
        in_session(2, 100, 1, 2),
        in_session(3, 200, 2, 1),
    ];
    let substeps = SubstepIndex::new();
    let gate = StepGate::new(&steps, &substeps);

    assert!(gate.blocked_by_week_pattern(&steps[1]));
    assert!(gate.blocked_by_week_pattern(&steps[2]));
    assert!(!gate.blocked_by_week_pattern(&steps[0]));
}

#[test]
fn test_week_pattern_falls_back_to_title() {
    let mut legacy = step(1, 0);
    legacy.title = "Week 2, Session 3: Evening walk".to_string();
    let mut week_only = step(2, 1);
    week_only.title = "week 4 recap".to_string();

    assert_eq!(week_session(&legacy), Some((2, 3)));
    assert_eq!(week_session(&week_only), Some((4, 0)));
    assert_eq!(week_session(&step(3, 2)), None);
}

#[test]
fn test_structured_fields_win_over_title() {
    let mut s = in_session(1, 0, 3, 1);
    s.title = "Week 9, Session 9".to_string();

    assert_eq!(week_session(&s), Some((3, 1)));
}

#[test]
fn test_sequence_orders_by_week_then_order_index() {
    // Inserted out of order; week 1 content must come first regardless
    let steps = vec![
        in_session(1, 0, 2, 1),
        in_session(2, 5, 1, 1),
        in_session(3, 1, 1, 2),
    ];

    let sequence = actionable_sequence(&steps);
    assert_eq!(ids(&sequence), vec![2, 3, 1]);
}

#[test]
fn test_patternless_step_joins_nearby_group() {
    // Step 4 sits 3 positions after a week 2 step, so it belongs to week 2
    // even though its raw order_index is smaller than step 2's.
    let steps = vec![
        in_session(1, 20, 1, 1),
        in_session(2, 30, 1, 2),
        in_session(3, 10, 2, 1),
        step(4, 13),
    ];

    let sequence = actionable_sequence(&steps);
    assert_eq!(ids(&sequence), vec![1, 2, 3, 4]);
}

#[test]
fn test_distant_patternless_step_follows_previous_group() {
    let steps = vec![in_session(1, 0, 1, 1), in_session(2, 100, 2, 1), step(3, 50)];

    let sequence = actionable_sequence(&steps);
    assert_eq!(ids(&sequence), vec![1, 3, 2]);
}

#[test]
fn test_completing_steps_never_blocks_another() {
    let mut steps = vec![
        in_session(1, 0, 1, 1),
        in_session(2, 1, 1, 1),
        in_session(3, 100, 1, 2),
        step(4, 101),
        in_session(5, 200, 2, 1),
    ];
    steps[3].dependency_step_ids = vec![2];
    let substeps = SubstepIndex::new();

    let verdicts = |steps: &[Step]| -> Vec<bool> {
        let gate = StepGate::new(steps, &substeps);
        steps.iter().map(|s| gate.is_blocked(s)).collect()
    };

    let mut previous = verdicts(&steps);
    for i in 0..steps.len() {
        steps[i].status = StepStatus::Done;
        let current = verdicts(&steps);
        for (before, after) in previous.iter().zip(&current) {
            assert!(*before || !*after, "completion re-blocked a step");
        }
        previous = current;
    }
    assert!(previous.iter().all(|blocked| !blocked));
}

#[test]
fn test_upcoming_caps_visible_steps() {
    let mut steps: Vec<Step> = (1..=7).map(|id| step(id, id as u32)).collect();
    steps[0].status = StepStatus::Done;
    let substeps = SubstepIndex::new();

    let next = upcoming(&steps, &substeps, 4);

    assert_eq!(
        next.shown.iter().map(|g| g.step.id).collect::<Vec<_>>(),
        vec![2, 3, 4, 5]
    );
    assert!(!next.shown[0].blocked);
    assert!(next.shown[1..].iter().all(|g| g.blocked));
    assert_eq!(next.queued, 2);
}

#[test]
fn test_upcoming_with_fewer_steps_than_limit() {
    let steps = vec![step(1, 0), step(2, 1)];
    let substeps = SubstepIndex::new();

    let next = upcoming(&steps, &substeps, 4);

    assert_eq!(next.shown.len(), 2);
    assert_eq!(next.queued, 0);
}
