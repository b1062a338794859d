//! Display implementations for domain models.
//!
//! Everything renders as markdown so the command line can hand it straight to
//! the terminal renderer.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::models::{
    Day, FailedDay, GenerationState, Goal, GoalStatus, GoalSummary, Step, StepStatus, StepType,
    Substep, SupportRole,
};

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SupportRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationState::None => write!(f, "not started"),
            GenerationState::Queued { queued_at } => {
                write!(f, "queued since {}", LocalDateTime::system(queued_at))
            }
            GenerationState::Pending { started_at } => {
                write!(f, "running since {}", LocalDateTime::system(started_at))
            }
            GenerationState::Completed { completed_at } => {
                write!(f, "completed {}", LocalDateTime::system(completed_at))
            }
            GenerationState::Failed { failed_at, error } => write!(
                f,
                "failed {}: {error}",
                LocalDateTime::system(failed_at)
            ),
        }
    }
}

impl fmt::Display for FailedDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "occurrence {} ({}): {}",
            self.index + 1,
            LocalDateTime::system(&self.date),
            self.error
        )
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}. {}", self.id, self.title)?;
        writeln!(f)?;

        writeln!(f, "- Status: {}", self.status)?;
        match self.due_date {
            Some(due) => writeln!(f, "- Dates: {} to {due}", self.start_date)?,
            None => writeln!(f, "- Starts: {}", self.start_date)?,
        }
        if self.is_habit() {
            let days = if self.selected_days.is_empty() {
                "every day".to_string()
            } else {
                Day::join_abbrev(&self.selected_days)
            };
            writeln!(
                f,
                "- Habit: {}x per week ({days}) for {} week(s) at {}",
                self.frequency_per_week.unwrap_or_default(),
                self.duration_weeks,
                self.time_of_day.strftime("%H:%M")
            )?;
        } else {
            writeln!(f, "- At: {}", self.time_of_day.strftime("%H:%M"))?;
        }
        if let Some(category) = &self.category {
            writeln!(f, "- Category: {category}")?;
        }
        if self.support_role != SupportRole::None {
            writeln!(f, "- Supporter: {}", self.support_role)?;
        }
        writeln!(f, "- Generation: {}", self.metadata.generation)?;
        if let Some(plan) = &self.metadata.occurrence_plan {
            let generated = plan
                .last_generated_occurrence_index
                .map_or(0, |index| index + 1);
            writeln!(
                f,
                "- Occurrences: {generated}/{} generated",
                plan.total_planned_occurrences
            )?;
        }

        if let Some(desc) = &self.description {
            writeln!(f)?;
            writeln!(f, "{desc}")?;
        }

        if !self.metadata.failed_days.is_empty() {
            writeln!(f, "\n## Failed occurrences")?;
            writeln!(f)?;
            for failure in &self.metadata.failed_days {
                writeln!(f, "- {failure}")?;
            }
        }

        Ok(())
    }
}

impl Step {
    /// Heading line shared by the standalone and the listed form.
    pub(crate) fn fmt_heading(&self, f: &mut fmt::Formatter<'_>, level: &str) -> fmt::Result {
        let marker = match (self.step_type, self.is_supporter_step) {
            (StepType::Note, _) => " [note]",
            (StepType::Milestone, _) => " [milestone]",
            (StepType::Action, true) => " [supporter]",
            (StepType::Action, false) => "",
        };
        writeln!(
            f,
            "{level} {}. {}{marker} ({})",
            self.id,
            self.title,
            self.status.with_icon()
        )
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_heading(f, "###")?;
        writeln!(f)?;

        if let Some(due) = &self.due_date {
            writeln!(f, "- Due: {}", LocalDateTime::system(due))?;
        }
        if let (Some(week), Some(session)) = (self.week_number, self.session_number) {
            writeln!(f, "- Week {week}, session {session}")?;
        }
        if let Some(minutes) = self.estimated_minutes {
            writeln!(f, "- About {minutes} min")?;
        }
        if !self.is_required {
            writeln!(f, "- Optional")?;
        }
        if !self.dependency_step_ids.is_empty() {
            let ids: Vec<String> = self
                .dependency_step_ids
                .iter()
                .map(u64::to_string)
                .collect();
            writeln!(f, "- After: {}", ids.join(", "))?;
        }

        if let Some(desc) = &self.description {
            writeln!(f)?;
            writeln!(f, "{desc}")?;
        }
        writeln!(f)
    }
}

impl fmt::Display for Substep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match (self.completed_at, self.initiated_at) {
            (Some(_), _) => "x",
            (None, Some(_)) => "~",
            (None, None) => " ",
        };
        writeln!(f, "- [{mark}] {}. {}", self.id, self.title)
    }
}

impl fmt::Display for GoalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let progress = if self.total_steps > 0 {
            format!(" ({}/{})", self.completed_steps, self.total_steps)
        } else {
            String::new()
        };

        writeln!(f, "## {} (ID: {}){progress}", self.title, self.id)?;
        writeln!(f)?;
        writeln!(f, "- **Status**: {}", self.status)?;
        writeln!(f, "- **Generation**: {}", self.generation_status)?;
        match self.due_date {
            Some(due) => writeln!(f, "- **Dates**: {} to {due}", self.start_date)?,
            None => writeln!(f, "- **Starts**: {}", self.start_date)?,
        }
        if let Some(frequency) = self.frequency_per_week.filter(|n| *n > 0) {
            writeln!(f, "- **Habit**: {frequency}x per week")?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use jiff::{
        civil::{date, time},
        Timestamp,
    };

    use super::*;
    use crate::models::{GenerationStatus, GoalMetadata};

    fn step() -> Step {
        Step {
            id: 4,
            goal_id: 1,
            title: "Lace up".to_string(),
            description: Some("Double knot.".to_string()),
            order_index: 1,
            status: StepStatus::NotStarted,
            due_date: None,
            is_required: true,
            is_planned: true,
            is_supporter_step: false,
            dependency_step_ids: vec![3],
            step_type: StepType::Action,
            week_number: Some(1),
            session_number: Some(2),
            occurrence_index: Some(1),
            estimated_minutes: Some(5),
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_step_display() {
        let output = step().to_string();
        assert!(output.starts_with("### 4. Lace up (○ Not started)"));
        assert!(output.contains("- Week 1, session 2"));
        assert!(output.contains("- After: 3"));
        assert!(output.contains("Double knot."));
    }

    #[test]
    fn test_supporter_step_is_marked() {
        let step = Step {
            is_supporter_step: true,
            is_required: false,
            ..step()
        };
        let output = step.to_string();
        assert!(output.contains("Lace up [supporter]"));
        assert!(output.contains("- Optional"));
    }

    #[test]
    fn test_goal_display_lists_failures() {
        let goal = Goal {
            id: 2,
            title: "Evening walk".to_string(),
            description: None,
            category: None,
            start_date: date(2024, 1, 1),
            due_date: Some(date(2024, 1, 14)),
            frequency_per_week: Some(3),
            selected_days: vec![Day::Mon, Day::Wed, Day::Fri],
            duration_weeks: 2,
            time_of_day: time(18, 0, 0, 0),
            support_role: SupportRole::None,
            status: GoalStatus::Active,
            metadata: GoalMetadata {
                failed_days: vec![FailedDay {
                    index: 2,
                    date: Timestamp::UNIX_EPOCH,
                    error: "unavailable: down".to_string(),
                }],
                ..GoalMetadata::default()
            },
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        };

        let output = goal.to_string();
        assert!(output.contains("# 2. Evening walk"));
        assert!(output.contains("3x per week (MON, WED, FRI) for 2 week(s) at 18:00"));
        assert!(output.contains("## Failed occurrences"));
        assert!(output.contains("occurrence 3"));
        assert!(output.contains("unavailable: down"));
    }

    #[test]
    fn test_summary_progress() {
        let summary = GoalSummary {
            id: 9,
            title: "Read".to_string(),
            status: GoalStatus::Active,
            generation_status: GenerationStatus::Completed,
            start_date: date(2024, 2, 1),
            due_date: None,
            frequency_per_week: None,
            total_steps: 3,
            completed_steps: 1,
        };
        let output = summary.to_string();
        assert!(output.contains("## Read (ID: 9) (1/3)"));
        assert!(output.contains("**Generation**: completed"));
    }

    #[test]
    fn test_substep_marks() {
        let substep = Substep {
            id: 1,
            step_id: 4,
            title: "Find shoes".to_string(),
            completed_at: None,
            initiated_at: Some(Timestamp::UNIX_EPOCH),
        };
        assert_eq!(substep.to_string(), "- [~] 1. Find shoes\n");
    }
}
