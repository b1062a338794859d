//! Goal summary model for list views.

use jiff::civil::Date;

use super::{GenerationStatus, GoalStatus};

/// A goal with step counts, without the goal's full metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalSummary {
    pub id: u64,
    pub title: String,
    pub status: GoalStatus,
    pub generation_status: GenerationStatus,
    pub start_date: Date,
    pub due_date: Option<Date>,
    pub frequency_per_week: Option<u32>,
    pub total_steps: u32,
    /// Steps that are done or skipped
    pub completed_steps: u32,
}

impl GoalSummary {
    pub fn is_habit(&self) -> bool {
        self.frequency_per_week.is_some_and(|f| f > 0)
    }
}
