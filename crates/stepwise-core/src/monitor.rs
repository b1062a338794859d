//! Detection of abandoned generation runs.
//!
//! Runs are driven by whoever started them, so a run can be left behind in
//! `pending` or `queued` with nothing produced. [`check`] spots those from the
//! persisted state alone; the tracker calls it whenever a goal is viewed and
//! hands the resulting [`RecoveryAction`] back to the caller.

use std::fmt;

use jiff::{SignedDuration, Timestamp};
use log::info;

use crate::{
    error::Result,
    models::{GenerationState, Goal, GoalMetadata, TransitionCause},
};

/// Which state a run was abandoned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallReason {
    Pending,
    Queued,
}

impl StallReason {
    pub fn message(&self) -> &'static str {
        match self {
            StallReason::Pending => "stalled from pending state",
            StallReason::Queued => "stalled from queued state",
        }
    }
}

impl fmt::Display for StallReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// What the monitor wants done about a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Mark the run failed, then retry generation
    RetryGeneration {
        goal_id: u64,
        reason: StallReason,
        since: Timestamp,
    },
}

impl RecoveryAction {
    pub fn goal_id(&self) -> u64 {
        match self {
            RecoveryAction::RetryGeneration { goal_id, .. } => *goal_id,
        }
    }

    pub fn reason(&self) -> StallReason {
        match self {
            RecoveryAction::RetryGeneration { reason, .. } => *reason,
        }
    }
}

/// Decide whether `goal`'s run was abandoned.
///
/// A run counts as abandoned when it sat in `pending` or `queued` for more
/// than `stale_after` without producing a single step.
pub fn check(
    goal: &Goal,
    step_count: usize,
    now: Timestamp,
    stale_after: SignedDuration,
) -> Option<RecoveryAction> {
    if step_count > 0 {
        return None;
    }

    let (reason, since) = match goal.metadata.generation {
        GenerationState::Pending { started_at } => (StallReason::Pending, started_at),
        GenerationState::Queued { queued_at } => (StallReason::Queued, queued_at),
        _ => return None,
    };

    (now.duration_since(since) > stale_after).then_some(RecoveryAction::RetryGeneration {
        goal_id: goal.id,
        reason,
        since,
    })
}

/// Apply `action` to freshly read metadata.
///
/// Re-checks the state the action was derived from, so a run that moved on
/// in the meantime is left alone. Returns whether anything changed.
pub fn apply(metadata: &mut GoalMetadata, action: &RecoveryAction, now: Timestamp) -> Result<bool> {
    let RecoveryAction::RetryGeneration { reason, since, .. } = *action;

    let still_stalled = match (&metadata.generation, reason) {
        (GenerationState::Pending { started_at }, StallReason::Pending) => *started_at == since,
        (GenerationState::Queued { queued_at }, StallReason::Queued) => *queued_at == since,
        _ => false,
    };
    if !still_stalled {
        return Ok(false);
    }

    metadata.generation.transition(
        GenerationState::Failed {
            failed_at: now,
            error: reason.message().to_string(),
        },
        TransitionCause::Monitor,
    )?;
    info!("Goal {} generation {reason}; marked failed", action.goal_id());
    Ok(true)
}

/// Apply `action` and hand it back only when the run was marked failed, so
/// callers never retry a run that completed in the meantime.
pub fn settle(
    metadata: &mut GoalMetadata,
    action: RecoveryAction,
    now: Timestamp,
) -> Result<Option<RecoveryAction>> {
    Ok(apply(metadata, &action, now)?.then_some(action))
}
