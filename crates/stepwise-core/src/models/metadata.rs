//! Generation bookkeeping stored alongside each goal.
//!
//! The metadata is persisted as a JSON document. The generation lifecycle is a
//! tagged union keyed by `status`, so each state carries exactly the fields it
//! needs. Keys this version does not know about are kept in [`GoalMetadata::extra`]
//! and written back untouched, which lets every writer read-merge-write without
//! clobbering data owned by someone else.

use std::{collections::BTreeMap, fmt};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProgressError, Result};

/// Version written into every metadata document produced by this crate.
pub const METADATA_SCHEMA_VERSION: u32 = 1;

fn current_schema_version() -> u32 {
    METADATA_SCHEMA_VERSION
}

/// Per-goal generation bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalMetadata {
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,

    /// Where the step-generation run currently stands
    #[serde(default)]
    pub generation: GenerationState,

    /// Full occurrence schedule of a multi-occurrence habit goal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence_plan: Option<OccurrencePlan>,

    /// Last time the daily trigger looked at this goal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_generation_check: Option<Timestamp>,

    /// Occurrences whose generation exhausted its retries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_days: Vec<FailedDay>,

    /// Keys owned by other writers
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for GoalMetadata {
    fn default() -> Self {
        Self {
            schema_version: METADATA_SCHEMA_VERSION,
            generation: GenerationState::None,
            occurrence_plan: None,
            last_generation_check: None,
            failed_days: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl GoalMetadata {
    /// Parse a stored document. An empty string is treated as fresh metadata.
    pub fn from_json(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Record a failed occurrence, replacing any earlier entry for the same index.
    pub fn record_failure(&mut self, failure: FailedDay) {
        self.failed_days.retain(|f| f.index != failure.index);
        self.failed_days.push(failure);
        self.failed_days.sort_by_key(|f| f.index);
    }

    /// Forget a failure once its occurrence has been generated.
    pub fn clear_failure(&mut self, index: usize) {
        self.failed_days.retain(|f| f.index != index);
    }
}

/// Coarse generation status, without the per-state payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    None,
    Queued,
    Pending,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::None => "none",
            GenerationStatus::Queued => "queued",
            GenerationStatus::Pending => "pending",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a goal's step-generation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GenerationState {
    #[default]
    None,
    #[serde(rename_all = "camelCase")]
    Queued { queued_at: Timestamp },
    #[serde(rename_all = "camelCase")]
    Pending { started_at: Timestamp },
    #[serde(rename_all = "camelCase")]
    Completed { completed_at: Timestamp },
    #[serde(rename_all = "camelCase")]
    Failed { failed_at: Timestamp, error: String },
}

/// Who is asking for a status change. Some edges are reserved to one caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCause {
    /// A first generation run
    Run,
    /// An explicit retry of a failed run
    Retry,
    /// The stale-run monitor
    Monitor,
}

impl GenerationState {
    pub fn status(&self) -> GenerationStatus {
        match self {
            GenerationState::None => GenerationStatus::None,
            GenerationState::Queued { .. } => GenerationStatus::Queued,
            GenerationState::Pending { .. } => GenerationStatus::Pending,
            GenerationState::Completed { .. } => GenerationStatus::Completed,
            GenerationState::Failed { .. } => GenerationStatus::Failed,
        }
    }

    /// Whether `cause` may move a goal from `from` to `to`.
    pub fn allows(from: GenerationStatus, to: GenerationStatus, cause: TransitionCause) -> bool {
        use GenerationStatus as S;
        use TransitionCause as C;

        match (from, to) {
            (S::None, S::Queued) => true,
            (S::None | S::Queued, S::Pending) => matches!(cause, C::Run | C::Retry),
            (S::Pending, S::Completed) => matches!(cause, C::Run | C::Retry),
            (S::Pending, S::Failed) => true,
            (S::Queued, S::Failed) => cause == C::Monitor,
            (S::Failed, S::Pending) => cause == C::Retry,
            (S::Completed, S::Completed) => true,
            _ => false,
        }
    }

    /// Move to `next`, refusing edges the state machine does not allow.
    pub fn transition(&mut self, next: GenerationState, cause: TransitionCause) -> Result<()> {
        let (from, to) = (self.status(), next.status());
        if !Self::allows(from, to, cause) {
            return Err(ProgressError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        *self = next;
        Ok(())
    }

    /// Failure message, when failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            GenerationState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// The full schedule of a habit goal, persisted once before the first
/// generation call so later triggers can resume without recomputing it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OccurrencePlan {
    pub planned_occurrences: Vec<Timestamp>,
    pub total_planned_occurrences: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_generated_occurrence_index: Option<usize>,
}

impl OccurrencePlan {
    pub fn new(occurrences: Vec<Timestamp>) -> Self {
        let total = occurrences.len();
        Self {
            planned_occurrences: occurrences,
            total_planned_occurrences: total,
            last_generated_occurrence_index: None,
        }
    }

    /// Index of the first occurrence that has not been generated yet.
    pub fn next_index(&self) -> Option<usize> {
        let next = self
            .last_generated_occurrence_index
            .map_or(0, |index| index + 1);
        (next < self.total_planned_occurrences).then_some(next)
    }

    /// Note that `index` has been generated. Never moves backwards.
    pub fn mark_generated(&mut self, index: usize) {
        let advanced = self
            .last_generated_occurrence_index
            .map_or(index, |last| last.max(index));
        self.last_generated_occurrence_index = Some(advanced);
    }
}

/// An occurrence whose steps could not be generated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailedDay {
    pub index: usize,
    pub date: Timestamp,
    pub error: String,
}
