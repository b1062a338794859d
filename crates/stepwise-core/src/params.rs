//! Parameter structures for Stepwise operations
//!
//! This module contains shared parameter structures that interface layers
//! (currently the CLI) fill in from user input. They carry raw values, mostly
//! strings, without framework-specific derives; each structure validates
//! itself into the typed form the [`Tracker`](crate::Tracker) works with.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   CLI Args      │    │  Core Params    │    │  Typed models   │
//! │  (clap derives) │───▶│ (raw values)    │───▶│  (validated)    │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```

use std::str::FromStr;

use jiff::civil::{time, Date, Time};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ProgressError, Result},
    models::{Day, NewGoal, StepStatus, SupportRole},
};

/// Longest habit the engine schedules, in weeks.
pub const MAX_DURATION_WEEKS: u32 = 52;

/// Generic parameters for operations requiring just an ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Id {
    /// The ID of the resource to operate on
    pub id: u64,
}

/// Parameters for creating a goal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateGoal {
    /// What the person wants to achieve (required)
    pub title: String,
    pub description: Option<String>,
    /// Domain such as "exercise" or "cooking"
    pub category: Option<String>,
    /// First day, `YYYY-MM-DD`; defaults to today
    pub start_date: Option<String>,
    /// Last day, `YYYY-MM-DD`
    pub due_date: Option<String>,
    /// Sessions per week; makes the goal a habit when above zero
    pub frequency_per_week: Option<u32>,
    /// Comma separated weekdays, e.g. `mon,wed,fri`
    pub selected_days: Option<String>,
    /// Weeks a habit runs for; defaults to 1
    pub duration_weeks: Option<u32>,
    /// Start time of each occurrence, `HH:MM`; defaults to 09:00
    pub time_of_day: Option<String>,
    /// `none`, `remote` or `hands_on`
    pub support_role: Option<String>,
}

impl CreateGoal {
    /// Validate the raw values into a [`NewGoal`].
    ///
    /// Choosing weekdays without a frequency makes the goal a habit with one
    /// session per chosen day.
    ///
    /// ```rust
    /// use jiff::civil::date;
    /// use stepwise_core::params::CreateGoal;
    ///
    /// let params = CreateGoal {
    ///     title: "Evening walk".to_string(),
    ///     start_date: Some("2024-01-01".to_string()),
    ///     selected_days: Some("mon,wed,fri".to_string()),
    ///     duration_weeks: Some(4),
    ///     ..Default::default()
    /// };
    /// let goal = params.validate(date(2024, 1, 1))?;
    /// assert_eq!(goal.frequency_per_week, Some(3));
    /// assert!(goal.is_habit());
    /// # stepwise_core::Result::<()>::Ok(())
    /// ```
    ///
    /// # Errors
    ///
    /// * `ProgressError::InvalidInput` - a field is missing, malformed or out of range
    /// * `ProgressError::InvalidDateRange` - the start date is after the due date
    pub fn validate(&self, today: Date) -> Result<NewGoal> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ProgressError::invalid_input("title").with_reason("Title cannot be empty"));
        }

        let start_date = match &self.start_date {
            Some(raw) => parse_field::<Date>("start_date", raw, "YYYY-MM-DD")?,
            None => today,
        };
        let due_date = self
            .due_date
            .as_deref()
            .map(|raw| parse_field::<Date>("due_date", raw, "YYYY-MM-DD"))
            .transpose()?;
        if let Some(due) = due_date {
            if start_date > due {
                return Err(ProgressError::InvalidDateRange {
                    start: start_date,
                    due,
                });
            }
        }

        let selected_days = match &self.selected_days {
            Some(raw) => Day::parse_list(raw)
                .map_err(|e| ProgressError::invalid_input("selected_days").with_reason(e))?,
            None => Vec::new(),
        };

        let frequency_per_week = match self.frequency_per_week {
            Some(0) => None,
            Some(f) if f > 7 => {
                return Err(ProgressError::invalid_input("frequency_per_week")
                    .with_reason(format!("{f} sessions per week is more than one a day")));
            }
            Some(f) => Some(f),
            None if !selected_days.is_empty() => Some(selected_days.len() as u32),
            None => None,
        };

        let duration_weeks = self.duration_weeks.unwrap_or(1);
        if !(1..=MAX_DURATION_WEEKS).contains(&duration_weeks) {
            return Err(ProgressError::invalid_input("duration_weeks").with_reason(format!(
                "Duration must be between 1 and {MAX_DURATION_WEEKS} weeks"
            )));
        }

        let time_of_day = match &self.time_of_day {
            Some(raw) => parse_field::<Time>("time_of_day", raw, "HH:MM")?,
            None => time(9, 0, 0, 0),
        };

        let support_role = match &self.support_role {
            Some(raw) => SupportRole::from_str(raw)
                .map_err(|e| ProgressError::invalid_input("support_role").with_reason(e))?,
            None => SupportRole::None,
        };

        Ok(NewGoal {
            title: title.to_string(),
            description: non_blank(self.description.as_deref()),
            category: non_blank(self.category.as_deref()),
            start_date,
            due_date,
            frequency_per_week,
            selected_days,
            duration_weeks,
            time_of_day,
            support_role,
        })
    }
}

/// Parameters for listing goals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListGoals {
    /// Whether archived goals are listed too
    #[serde(default)]
    pub archived: bool,
}

/// Parameters for updating an existing step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStep {
    /// Step ID to update (required)
    pub id: u64,
    /// New status: 'not_started', 'in_progress', 'done' or 'skipped'
    pub status: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl UpdateStep {
    /// Validate step update parameters and return the parsed status.
    ///
    /// ```rust
    /// use stepwise_core::{models::StepStatus, params::UpdateStep};
    ///
    /// let params = UpdateStep {
    ///     id: 1,
    ///     status: Some("skipped".to_string()),
    ///     ..Default::default()
    /// };
    /// assert_eq!(params.validate()?, Some(StepStatus::Skipped));
    /// # stepwise_core::Result::<()>::Ok(())
    /// ```
    pub fn validate(&self) -> Result<Option<StepStatus>> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ProgressError::invalid_input("title").with_reason("Title cannot be empty"));
        }

        self.status
            .as_deref()
            .map(|raw| {
                StepStatus::from_str(raw).map_err(|_| {
                    ProgressError::invalid_input("status").with_reason(format!(
                        "Invalid status: {raw}. Must be 'not_started', 'in_progress', 'done' or 'skipped'"
                    ))
                })
            })
            .transpose()
    }
}

/// Parameters for adding a substep to a step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddSubstep {
    pub step_id: u64,
    pub title: String,
}

impl AddSubstep {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(ProgressError::invalid_input("title").with_reason("Title cannot be empty"));
        }
        Ok(())
    }
}

fn parse_field<T: FromStr>(field: &str, raw: &str, expected: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        ProgressError::invalid_input(field).with_reason(format!("'{raw}' is not a valid {expected} value"))
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
