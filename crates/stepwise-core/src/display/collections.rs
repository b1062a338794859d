//! Collection wrapper types for displaying groups of domain objects.

use std::{fmt, ops::Index};

use jiff::{tz::TimeZone, Timestamp};

use super::datetime::LocalDateTime;
use crate::{
    gating::Upcoming,
    models::{GoalSummary, Step, Substep},
    schedule::{self, Schedule},
    tracker::GoalView,
};

/// Newtype wrapper for displaying a list of goal summaries.
///
/// ```rust
/// use jiff::civil::date;
/// use stepwise_core::{
///     display::GoalSummaries,
///     models::{GenerationStatus, GoalStatus, GoalSummary},
/// };
///
/// let goals = GoalSummaries(vec![GoalSummary {
///     id: 1,
///     title: "Evening walk".to_string(),
///     status: GoalStatus::Active,
///     generation_status: GenerationStatus::Completed,
///     start_date: date(2024, 1, 1),
///     due_date: None,
///     frequency_per_week: Some(3),
///     total_steps: 6,
///     completed_steps: 2,
/// }]);
/// assert!(goals.to_string().contains("Evening walk (ID: 1) (2/6)"));
/// ```
pub struct GoalSummaries(pub Vec<GoalSummary>);

impl GoalSummaries {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GoalSummary> {
        self.0.iter()
    }
}

impl Index<usize> for GoalSummaries {
    type Output = GoalSummary;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a GoalSummaries {
    type Item = &'a GoalSummary;
    type IntoIter = std::slice::Iter<'a, GoalSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for GoalSummaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No goals found.");
        }
        for goal in &self.0 {
            write!(f, "{goal}")?;
        }
        Ok(())
    }
}

/// Newtype wrapper for displaying the steps of a goal.
pub struct Steps(pub Vec<Step>);

impl fmt::Display for Steps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No steps yet.");
        }
        for step in &self.0 {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

/// Newtype wrapper for displaying the substeps of a step.
pub struct Substeps(pub Vec<Substep>);

impl fmt::Display for Substeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No substeps.");
        }
        for substep in &self.0 {
            write!(f, "{substep}")?;
        }
        Ok(())
    }
}

/// The next actionable steps with their gating verdicts.
pub struct UpcomingSteps<'a>(pub &'a Upcoming<'a>);

impl fmt::Display for UpcomingSteps<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let upcoming = self.0;
        if upcoming.shown.is_empty() {
            return writeln!(f, "Nothing left to do.");
        }

        for gated in &upcoming.shown {
            let lock = if gated.blocked { "🔒 " } else { "" };
            write!(f, "- {lock}{}. {}", gated.step.id, gated.step.title)?;
            if let Some(due) = &gated.step.due_date {
                write!(f, " (due {})", LocalDateTime::system(due))?;
            }
            writeln!(f)?;
        }
        if upcoming.queued > 0 {
            writeln!(f)?;
            writeln!(f, "_{} more step(s) waiting_", upcoming.queued)?;
        }
        Ok(())
    }
}

/// A goal with its upcoming steps and every step below.
pub struct GoalOverview<'a> {
    pub view: &'a GoalView,
    pub upcoming_limit: usize,
}

impl<'a> GoalOverview<'a> {
    pub fn new(view: &'a GoalView, upcoming_limit: usize) -> Self {
        Self {
            view,
            upcoming_limit,
        }
    }
}

impl fmt::Display for GoalOverview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.view;
        write!(f, "{}", view.goal)?;

        if let Some(action) = &view.recovery {
            writeln!(f)?;
            writeln!(
                f,
                "> Generation {}; a retry is needed.",
                action.reason()
            )?;
        }

        if view.steps.is_empty() {
            writeln!(f, "\nNo steps in this goal yet.")?;
            return Ok(());
        }

        writeln!(
            f,
            "\n## Up next ({}/{} complete)",
            view.completed_count(),
            view.steps.len()
        )?;
        writeln!(f)?;
        write!(f, "{}", UpcomingSteps(&view.upcoming(self.upcoming_limit)))?;

        writeln!(f, "\n## All steps")?;
        writeln!(f)?;
        for step in &view.steps {
            step.fmt_heading(f, "###")?;
            if let Some(substeps) = view.substeps.get(&step.id) {
                writeln!(f)?;
                for substep in substeps {
                    write!(f, "{substep}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A computed schedule, listed occurrence by occurrence.
pub struct SchedulePreview<'a> {
    pub start_date: jiff::civil::Date,
    pub schedule: &'a Schedule,
    pub time_zone: TimeZone,
}

impl fmt::Display for SchedulePreview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let occurrences: &[Timestamp] = &self.schedule.occurrences;
        writeln!(f, "# {} occurrence(s)", occurrences.len())?;
        writeln!(f)?;

        for (index, occurrence) in occurrences.iter().enumerate() {
            write!(
                f,
                "{}. {}",
                index + 1,
                LocalDateTime::new(occurrence, &self.time_zone)
            )?;
            if let Ok((week, session)) =
                schedule::week_and_session(self.start_date, occurrences, index, &self.time_zone)
            {
                write!(f, " (week {week}, session {session})")?;
            }
            writeln!(f)?;
        }

        if self.schedule.trimmed > 0 {
            writeln!(f)?;
            writeln!(
                f,
                "_{} occurrence(s) fell after the due date and were dropped_",
                self.schedule.trimmed
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::{date, time};

    use super::*;
    use crate::schedule::ScheduleRequest;

    #[test]
    fn test_empty_collections() {
        assert_eq!(GoalSummaries(vec![]).to_string(), "No goals found.\n");
        assert_eq!(Steps(vec![]).to_string(), "No steps yet.\n");
        assert_eq!(Substeps(vec![]).to_string(), "No substeps.\n");
    }

    #[test]
    fn test_schedule_preview() {
        let request = ScheduleRequest {
            start_date: date(2024, 1, 1),
            due_date: Some(date(2024, 1, 2)),
            frequency_per_week: 3,
            selected_days: vec![],
            duration_weeks: 1,
            time_of_day: time(9, 0, 0, 0),
            time_zone: TimeZone::UTC,
        };
        let schedule = schedule::compute(&request).unwrap();

        let output = SchedulePreview {
            start_date: request.start_date,
            schedule: &schedule,
            time_zone: TimeZone::UTC,
        }
        .to_string();

        assert!(output.starts_with("# 2 occurrence(s)"));
        assert!(output.contains("1. Mon 2024-01-01 09:00 UTC (week 1, session 1)"));
        assert!(output.contains("2. Tue 2024-01-02 09:00 UTC (week 1, session 2)"));
        assert!(output.contains("1 occurrence(s) fell after the due date"));
    }
}
