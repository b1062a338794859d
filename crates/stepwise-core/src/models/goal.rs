//! Goal model definition and related functionality.

use jiff::{
    civil::{Date, Time},
    Timestamp,
};
use serde::{Deserialize, Serialize};

use super::{Day, GoalMetadata, GoalStatus, SupportRole};

/// Represents a goal with its timing parameters and generation bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    /// Unique identifier for the goal
    pub id: u64,

    /// What the person wants to achieve
    pub title: String,

    /// Longer free-form context supplied when the goal was created
    pub description: Option<String>,

    /// Domain of the goal (exercise, cooking, social, ...)
    pub category: Option<String>,

    /// First day the goal is worked on
    pub start_date: Date,

    /// Last day the goal may be worked on
    pub due_date: Option<Date>,

    /// Sessions per week; any value above zero makes this a habit goal
    pub frequency_per_week: Option<u32>,

    /// Weekdays the habit is practised on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_days: Vec<Day>,

    /// How many weeks a habit runs for
    pub duration_weeks: u32,

    /// Local time each occurrence starts at
    pub time_of_day: Time,

    /// How the supporter is involved
    #[serde(default)]
    pub support_role: SupportRole,

    /// Lifecycle status of the goal itself
    #[serde(default)]
    pub status: GoalStatus,

    /// Generation bookkeeping
    #[serde(default)]
    pub metadata: GoalMetadata,

    /// Timestamp when the goal was created (UTC)
    pub created_at: Timestamp,

    /// Timestamp when the goal was last modified (UTC)
    pub updated_at: Timestamp,
}

impl Goal {
    /// A habit goal recurs `frequency_per_week` times over its duration.
    pub fn is_habit(&self) -> bool {
        self.frequency_per_week.is_some_and(|f| f > 0)
    }
}

/// A validated goal about to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub start_date: Date,
    pub due_date: Option<Date>,
    pub frequency_per_week: Option<u32>,
    pub selected_days: Vec<Day>,
    pub duration_weeks: u32,
    pub time_of_day: Time,
    pub support_role: SupportRole,
}

impl NewGoal {
    pub fn is_habit(&self) -> bool {
        self.frequency_per_week.is_some_and(|f| f > 0)
    }
}
