//! Result wrapper types for displaying operation outcomes.
//!
//! This module provides wrapper types that format the results of create and
//! update operations, plus the reports of generation runs and daily checks.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::{
    generation::{AdvanceOutcome, RunResult},
    models::{Goal, Step, Substep},
};

/// Wrapper type for displaying the result of create operations.
///
/// # Examples
///
/// ```rust
/// use stepwise_core::{display::CreateResult, models::Substep};
///
/// let substep = Substep {
///     id: 3,
///     step_id: 1,
///     title: "Find shoes".to_string(),
///     completed_at: None,
///     initiated_at: None,
/// };
///
/// let output = CreateResult::new(substep).to_string();
/// assert!(output.starts_with("Created substep with ID: 3"));
/// ```
pub struct CreateResult<T> {
    pub resource: T,
}

impl<T> CreateResult<T> {
    /// Create a new CreateResult wrapper.
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for CreateResult<Goal> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created goal with ID: {}", self.resource.id)?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

impl fmt::Display for CreateResult<Substep> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created substep with ID: {}", self.resource.id)?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Wrapper type for displaying the result of update operations.
///
/// The wrapper can track and display specific changes made during the update.
pub struct UpdateResult<T> {
    pub resource: T,
    pub changes: Vec<String>,
}

impl<T> UpdateResult<T> {
    /// Create a new UpdateResult wrapper.
    pub fn new(resource: T) -> Self {
        Self {
            resource,
            changes: Vec::new(),
        }
    }

    /// Create an UpdateResult with a list of changes made.
    pub fn with_changes(resource: T, changes: Vec<String>) -> Self {
        Self { resource, changes }
    }

    fn fmt_changes(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.changes.is_empty() {
            writeln!(f)?;
            writeln!(f, "Changes made:")?;
            for change in &self.changes {
                writeln!(f, "- {change}")?;
            }
        }
        writeln!(f)
    }
}

impl fmt::Display for UpdateResult<Goal> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Updated goal with ID: {}", self.resource.id)?;
        self.fmt_changes(f)?;
        write!(f, "{}", self.resource)
    }
}

impl fmt::Display for UpdateResult<Step> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Updated step with ID: {}", self.resource.id)?;
        self.fmt_changes(f)?;
        write!(f, "{}", self.resource)
    }
}

impl fmt::Display for UpdateResult<Substep> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Updated substep with ID: {}", self.resource.id)?;
        self.fmt_changes(f)?;
        write!(f, "{}", self.resource)
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Generation {} for goal {}", self.status, self.goal_id)?;
        writeln!(f)?;
        writeln!(f, "- Generated: {} occurrence(s)", self.successful_count)?;
        if self.skipped_count > 0 {
            writeln!(f, "- Already had steps: {}", self.skipped_count)?;
        }
        if self.deferred_count > 0 {
            writeln!(f, "- Left for later: {}", self.deferred_count)?;
        }
        writeln!(f, "- New steps: {}", self.steps.len())?;

        if !self.failed_days.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failed:")?;
            for failure in &self.failed_days {
                writeln!(f, "- {failure}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for AdvanceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdvanceOutcome::NotHabit => writeln!(f, "Goal does not recur; nothing to advance."),
            AdvanceOutcome::NotDueYet { next_check } => writeln!(
                f,
                "Checked recently; next check after {}.",
                LocalDateTime::system(next_check)
            ),
            AdvanceOutcome::AwaitingInitialRun => {
                writeln!(f, "The first generation run has not completed yet.")
            }
            AdvanceOutcome::PriorIncomplete { index } => writeln!(
                f,
                "Finish the steps of occurrence {} first.",
                index + 1
            ),
            AdvanceOutcome::AllGenerated => writeln!(f, "Every occurrence already has steps."),
            AdvanceOutcome::Generated { index, steps } if steps.is_empty() => {
                writeln!(f, "Occurrence {} already had steps.", index + 1)
            }
            AdvanceOutcome::Generated { index, steps } => {
                writeln!(
                    f,
                    "Generated {} step(s) for occurrence {}:",
                    steps.len(),
                    index + 1
                )?;
                writeln!(f)?;
                for step in steps {
                    writeln!(f, "- {}. {}", step.id, step.title)?;
                }
                Ok(())
            }
            AdvanceOutcome::Failed(failure) => writeln!(f, "Generation failed for {failure}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FailedDay, GenerationStatus};

    #[test]
    fn test_run_result_lists_failures() {
        let run = RunResult {
            goal_id: 7,
            successful_count: 2,
            skipped_count: 1,
            deferred_count: 0,
            failed_days: vec![FailedDay {
                index: 3,
                date: jiff::Timestamp::UNIX_EPOCH,
                error: "rate limited: slow down".to_string(),
            }],
            steps: vec![],
            status: GenerationStatus::Completed,
        };

        let output = run.to_string();
        assert!(output.starts_with("Generation completed for goal 7"));
        assert!(output.contains("- Already had steps: 1"));
        assert!(!output.contains("Left for later"));
        assert!(output.contains("occurrence 4"));
    }

    #[test]
    fn test_advance_outcome_messages() {
        assert_eq!(
            AdvanceOutcome::PriorIncomplete { index: 0 }.to_string(),
            "Finish the steps of occurrence 1 first.\n"
        );
        assert_eq!(
            AdvanceOutcome::Generated {
                index: 2,
                steps: vec![]
            }
            .to_string(),
            "Occurrence 3 already had steps.\n"
        );
    }
}
