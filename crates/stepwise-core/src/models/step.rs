//! Step and substep model definitions.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{Audience, StepStatus, StepType};

/// Represents an individual step within a goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    /// Unique identifier for the step
    pub id: u64,

    /// ID of the parent goal
    pub goal_id: u64,

    /// Brief title/summary of the step
    pub title: String,

    /// Detailed multi-line description of the step
    pub description: Option<String>,

    /// Position of the step within the goal
    pub order_index: u32,

    /// Current status of the step
    pub status: StepStatus,

    /// When the step should be done by
    pub due_date: Option<Timestamp>,

    /// Whether later steps wait for this one
    pub is_required: bool,

    /// Whether the step came from a generated plan rather than a manual edit
    pub is_planned: bool,

    /// Addressed to the supporter; exempt from sequential and week gating
    pub is_supporter_step: bool,

    /// Steps of the same goal that must be closed out before this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependency_step_ids: Vec<u64>,

    /// Kind of step
    #[serde(default)]
    pub step_type: StepType,

    /// Week of the habit this step belongs to (1-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_number: Option<u32>,

    /// Session within the week (1-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_number: Option<u32>,

    /// Occurrence this step was generated for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrence_index: Option<u32>,

    /// Rough effort estimate from the generator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,

    /// Timestamp when the step was created (UTC)
    pub created_at: Timestamp,

    /// Timestamp when the step was last updated (UTC)
    pub updated_at: Timestamp,
}

impl Step {
    pub fn audience(&self) -> Audience {
        if self.is_supporter_step {
            Audience::Supporter
        } else {
            Audience::Individual
        }
    }

    /// A step is complete when all of its substeps are, or, without substeps,
    /// when its status is done or skipped.
    pub fn is_complete(&self, substeps: &[Substep]) -> bool {
        if substeps.is_empty() {
            self.status.is_closed()
        } else {
            substeps.iter().all(Substep::is_completed)
        }
    }
}

/// A finer-grained scaffolding unit of a step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Substep {
    pub id: u64,
    pub step_id: u64,
    pub title: String,
    pub completed_at: Option<Timestamp>,
    pub initiated_at: Option<Timestamp>,
}

impl Substep {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// A step about to be persisted by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStep {
    pub title: String,
    pub description: Option<String>,
    pub order_index: u32,
    pub due_date: Option<Timestamp>,
    pub is_required: bool,
    pub is_supporter_step: bool,
    pub step_type: StepType,
    pub week_number: Option<u32>,
    pub session_number: Option<u32>,
    pub estimated_minutes: Option<u32>,
    /// Chain this step to the previously inserted step of the same batch
    pub depends_on_previous: bool,
}
