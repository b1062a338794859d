//! Status enumerations for goals and steps.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type-safe enumeration of goal statuses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    /// Goal exists but has not started yet
    #[default]
    Planned,

    /// Goal is being worked on
    Active,

    /// Every step of the goal is complete
    Completed,

    /// Goal is archived and hidden from normal views
    Archived,
}

impl FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "planned" => Ok(GoalStatus::Planned),
            "active" => Ok(GoalStatus::Active),
            "completed" => Ok(GoalStatus::Completed),
            "archived" => Ok(GoalStatus::Archived),
            _ => Err(format!("Invalid goal status: {s}")),
        }
    }
}

impl GoalStatus {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Planned => "planned",
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Archived => "archived",
        }
    }
}

/// Type-safe enumeration of step statuses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step has not been touched yet
    #[default]
    NotStarted,

    /// Step is being worked on
    InProgress,

    /// Step has been completed
    Done,

    /// Step was deliberately passed over
    Skipped,
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "not_started" | "notstarted" | "todo" => Ok(StepStatus::NotStarted),
            "in_progress" | "inprogress" => Ok(StepStatus::InProgress),
            "done" => Ok(StepStatus::Done),
            "skipped" => Ok(StepStatus::Skipped),
            _ => Err(format!("Invalid step status: {s}")),
        }
    }
}

impl StepStatus {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::NotStarted => "not_started",
            StepStatus::InProgress => "in_progress",
            StepStatus::Done => "done",
            StepStatus::Skipped => "skipped",
        }
    }

    /// Whether this status closes the step out (done or skipped).
    pub fn is_closed(&self) -> bool {
        matches!(self, StepStatus::Done | StepStatus::Skipped)
    }

    /// Get status with consistent icon formatting for display.
    ///
    /// ```rust
    /// use stepwise_core::models::StepStatus;
    ///
    /// assert_eq!(StepStatus::Done.with_icon(), "✓ Done");
    /// assert_eq!(StepStatus::NotStarted.with_icon(), "○ Not started");
    /// ```
    pub fn with_icon(&self) -> &'static str {
        match self {
            StepStatus::Done => "✓ Done",
            StepStatus::InProgress => "➤ In progress",
            StepStatus::NotStarted => "○ Not started",
            StepStatus::Skipped => "– Skipped",
        }
    }
}

/// What kind of step this is. Only action steps take part in gating.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    /// Something the person does
    #[default]
    Action,

    /// A checkpoint marking progress, nothing to do
    Milestone,

    /// Informational text shown alongside the plan
    Note,
}

impl FromStr for StepType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "action" => Ok(StepType::Action),
            "milestone" => Ok(StepType::Milestone),
            "note" => Ok(StepType::Note),
            _ => Err(format!("Invalid step type: {s}")),
        }
    }
}

impl StepType {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Action => "action",
            StepType::Milestone => "milestone",
            StepType::Note => "note",
        }
    }
}

/// Who a generated step is addressed to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    /// The person who owns the goal
    #[default]
    Individual,

    /// The person supporting them
    Supporter,
}

impl FromStr for Audience {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "individual" => Ok(Audience::Individual),
            "supporter" => Ok(Audience::Supporter),
            _ => Err(format!("Invalid audience: {s}")),
        }
    }
}

impl Audience {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Individual => "individual",
            Audience::Supporter => "supporter",
        }
    }
}

/// How the supporter is involved with the goal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SupportRole {
    /// No supporter attached
    #[default]
    None,

    /// Supporter follows along and checks in
    Remote,

    /// Supporter is physically present and helps with the activity
    HandsOn,
}

impl FromStr for SupportRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "none" => Ok(SupportRole::None),
            "remote" => Ok(SupportRole::Remote),
            "hands_on" | "handson" => Ok(SupportRole::HandsOn),
            _ => Err(format!("Invalid support role: {s}")),
        }
    }
}

impl SupportRole {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportRole::None => "none",
            SupportRole::Remote => "remote",
            SupportRole::HandsOn => "hands_on",
        }
    }

    /// Whether supporter-facing steps are generated alongside the individual's.
    pub fn wants_supporter_steps(&self) -> bool {
        matches!(self, SupportRole::HandsOn)
    }
}
