//! Step gating: deciding which steps are currently actionable.
//!
//! A step is blocked when any of these rules applies:
//!
//! 1. **Sequential**: an earlier required step in the actionable sequence is
//!    not complete.
//! 2. **Dependencies**: a step listed in `dependency_step_ids` is neither done
//!    nor skipped.
//! 3. **Week/session**: a required step in an earlier week, or in an earlier
//!    session of the same week, is not complete.
//!
//! Supporter steps are only subject to rule 2.
//!
//! The actionable sequence holds every non-skipped action step, ordered by
//! `(week, session)` where known and by `order_index` otherwise. A step
//! without a week/session sits in the group of a patterned step less than
//! [`PROXIMITY_WINDOW`] positions away, which keeps generation-time grouping
//! intact even when only some steps carry the pattern.

use std::{collections::HashMap, sync::LazyLock};

use log::debug;
use regex::Regex;

use crate::models::{Step, StepStatus, StepType, Substep};

/// Substeps of each step, keyed by step id.
pub type SubstepIndex = HashMap<u64, Vec<Substep>>;

/// Patterned and pattern-less steps closer than this share a group.
pub const PROXIMITY_WINDOW: u32 = 10;

static WEEK_SESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bweek\s*(\d+)\b(?:.*?\bsession\s*(\d+)\b)?")
        .expect("week/session pattern compiles")
});

/// Week and session of a step, from its structured fields or, for steps
/// written before those existed, from a `Week N ... Session M` title.
pub fn week_session(step: &Step) -> Option<(u32, u32)> {
    if let Some(week) = step.week_number {
        return Some((week, step.session_number.unwrap_or(0)));
    }

    let captures = WEEK_SESSION.captures(&step.title)?;
    let week = captures.get(1)?.as_str().parse().ok()?;
    let session = captures
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    Some((week, session))
}

/// Whether a step takes part in sequential and week gating at all.
pub fn is_actionable(step: &Step) -> bool {
    step.step_type == StepType::Action && step.status != StepStatus::Skipped
}

/// Actionable steps in gating order.
pub fn actionable_sequence(steps: &[Step]) -> Vec<&Step> {
    let actionable: Vec<&Step> = steps.iter().filter(|s| is_actionable(s)).collect();

    let anchors: Vec<(u32, (u32, u32))> = actionable
        .iter()
        .filter_map(|s| week_session(s).map(|ws| (s.order_index, ws)))
        .collect();

    let mut keyed: Vec<((u32, u32, u32, u64), &Step)> = actionable
        .into_iter()
        .map(|step| {
            let (week, session) =
                week_session(step).unwrap_or_else(|| inherited_group(step.order_index, &anchors));
            ((week, session, step.order_index, step.id), step)
        })
        .collect();

    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, step)| step).collect()
}

/// Group for a pattern-less step: the nearest patterned step when it is close
/// enough, otherwise the last patterned step before it.
fn inherited_group(order_index: u32, anchors: &[(u32, (u32, u32))]) -> (u32, u32) {
    let nearest = anchors
        .iter()
        .min_by_key(|(anchor, _)| (anchor.abs_diff(order_index), *anchor))
        .filter(|(anchor, _)| anchor.abs_diff(order_index) < PROXIMITY_WINDOW);
    if let Some((_, group)) = nearest {
        return *group;
    }

    anchors
        .iter()
        .filter(|(anchor, _)| *anchor < order_index)
        .max_by_key(|(anchor, _)| *anchor)
        .map_or((0, 0), |(_, group)| *group)
}

/// Gating over one snapshot of a goal's steps. Building the gate sorts the
/// actionable sequence once; each verdict is then a linear scan.
pub struct StepGate<'a> {
    steps: &'a [Step],
    substeps: &'a SubstepIndex,
    sequence: Vec<&'a Step>,
}

impl<'a> StepGate<'a> {
    pub fn new(steps: &'a [Step], substeps: &'a SubstepIndex) -> Self {
        Self {
            steps,
            substeps,
            sequence: actionable_sequence(steps),
        }
    }

    /// The actionable steps in gating order.
    pub fn sequence(&self) -> &[&'a Step] {
        &self.sequence
    }

    pub fn is_complete(&self, step: &Step) -> bool {
        let substeps = self.substeps.get(&step.id).map_or(&[][..], Vec::as_slice);
        step.is_complete(substeps)
    }

    pub fn is_blocked(&self, step: &Step) -> bool {
        if self.blocked_by_dependencies(step) {
            return true;
        }
        if step.is_supporter_step {
            return false;
        }
        self.blocked_sequentially(step) || self.blocked_by_week_pattern(step)
    }

    fn blocked_sequentially(&self, step: &Step) -> bool {
        let Some(position) = self.sequence.iter().position(|s| s.id == step.id) else {
            return false;
        };
        self.sequence[..position]
            .iter()
            .any(|earlier| earlier.is_required && !self.is_complete(earlier))
    }

    fn blocked_by_dependencies(&self, step: &Step) -> bool {
        step.dependency_step_ids.iter().any(|dependency_id| {
            match self.steps.iter().find(|s| s.id == *dependency_id) {
                Some(dependency) => !dependency.status.is_closed(),
                None => {
                    debug!(
                        "Step {} depends on unknown step {dependency_id}; ignoring",
                        step.id
                    );
                    false
                }
            }
        })
    }

    fn blocked_by_week_pattern(&self, step: &Step) -> bool {
        if !is_actionable(step) {
            return false;
        }
        let Some((week, session)) = week_session(step) else {
            return false;
        };

        self.sequence.iter().any(|other| {
            if other.id == step.id || !other.is_required || self.is_complete(other) {
                return false;
            }
            match week_session(other) {
                Some((other_week, other_session)) => {
                    other_week < week || (other_week == week && other_session < session)
                }
                None => false,
            }
        })
    }
}

/// Whether `step` is currently blocked. Recomputes the actionable sequence on
/// every call; use [`StepGate`] when judging many steps of the same goal.
pub fn is_blocked(step: &Step, all_steps: &[Step], substeps: &SubstepIndex) -> bool {
    StepGate::new(all_steps, substeps).is_blocked(step)
}

/// A step together with its gating verdict.
#[derive(Debug, Clone, Copy)]
pub struct GatedStep<'a> {
    pub step: &'a Step,
    pub blocked: bool,
}

/// The next incomplete actionable steps, capped for display.
#[derive(Debug, Clone)]
pub struct Upcoming<'a> {
    /// Steps shown straight away
    pub shown: Vec<GatedStep<'a>>,
    /// Steps held back behind a reveal action
    pub queued: usize,
}

/// The first `limit` incomplete actionable steps in gating order, each with
/// its verdict, and how many more are waiting behind them.
pub fn upcoming<'a>(steps: &'a [Step], substeps: &'a SubstepIndex, limit: usize) -> Upcoming<'a> {
    let gate = StepGate::new(steps, substeps);
    let pending: Vec<&Step> = gate
        .sequence()
        .iter()
        .copied()
        .filter(|step| !gate.is_complete(step))
        .collect();

    let queued = pending.len().saturating_sub(limit);
    let shown = pending
        .into_iter()
        .take(limit)
        .map(|step| GatedStep {
            step,
            blocked: gate.is_blocked(step),
        })
        .collect();

    Upcoming { shown, queued }
}

#[cfg(test)]
mod tests;
