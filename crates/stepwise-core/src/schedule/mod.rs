//! Occurrence scheduling for habit goals.
//!
//! [`compute`] turns a goal's timing parameters into the ordered list of
//! timestamps at which the habit is practised. It is pure and deterministic:
//! the same [`ScheduleRequest`] always yields the same [`Schedule`], which is
//! what makes recomputing the schedule on retry safe.
//!
//! Two strategies exist:
//!
//! - **Selected weekdays**: walk the calendar day by day from the start date,
//!   keeping every day whose weekday was selected, until the due date (or the
//!   goal's duration when open-ended) is passed.
//! - **Fallback**: without selected weekdays, `frequency_per_week *
//!   duration_weeks` consecutive daily occurrences from the start date.
//!
//! Occurrences past the end of the due date are trimmed. Trimming everything
//! away is an error; trimming some is reported through [`Schedule::trimmed`].
//!
//! ```rust
//! use jiff::{civil::{date, time}, tz::TimeZone};
//! use stepwise_core::{models::Day, schedule::{self, ScheduleRequest}};
//!
//! let request = ScheduleRequest {
//!     start_date: date(2024, 1, 1),
//!     due_date: Some(date(2024, 1, 10)),
//!     frequency_per_week: 3,
//!     selected_days: vec![Day::Mon, Day::Wed, Day::Fri],
//!     duration_weeks: 2,
//!     time_of_day: time(9, 0, 0, 0),
//!     time_zone: TimeZone::UTC,
//! };
//! let schedule = schedule::compute(&request)?;
//! assert_eq!(schedule.occurrences.len(), 5);
//! # stepwise_core::Result::<()>::Ok(())
//! ```

use jiff::{
    civil::{Date, Time},
    tz::TimeZone,
    Timestamp, Unit,
};
use log::{debug, info};

use crate::{
    error::{ProgressError, Result},
    models::{Day, Goal, NewGoal},
};

/// Upper bound on how many calendar days a schedule may span.
pub const MAX_SCHEDULE_DAYS: i32 = 365;

/// Extra days the weekday walk may take beyond the date range.
const WALK_SLACK_DAYS: i32 = 7;

/// Timing parameters of a goal.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub start_date: Date,
    pub due_date: Option<Date>,
    pub frequency_per_week: u32,
    pub selected_days: Vec<Day>,
    pub duration_weeks: u32,
    pub time_of_day: Time,
    pub time_zone: TimeZone,
}

impl ScheduleRequest {
    /// Build the request for a goal. Goals that are not habits get exactly one
    /// occurrence, on the start date.
    pub fn for_goal(goal: &Goal, time_zone: &TimeZone) -> Self {
        Self::from_timing(
            goal.start_date,
            goal.due_date,
            goal.frequency_per_week,
            &goal.selected_days,
            goal.duration_weeks,
            goal.time_of_day,
            time_zone,
        )
    }

    /// Same as [`ScheduleRequest::for_goal`] for a goal that is not stored yet.
    pub fn for_new_goal(goal: &NewGoal, time_zone: &TimeZone) -> Self {
        Self::from_timing(
            goal.start_date,
            goal.due_date,
            goal.frequency_per_week,
            &goal.selected_days,
            goal.duration_weeks,
            goal.time_of_day,
            time_zone,
        )
    }

    fn from_timing(
        start_date: Date,
        due_date: Option<Date>,
        frequency_per_week: Option<u32>,
        selected_days: &[Day],
        duration_weeks: u32,
        time_of_day: Time,
        time_zone: &TimeZone,
    ) -> Self {
        let (frequency_per_week, selected_days, duration_weeks) =
            match frequency_per_week.filter(|f| *f > 0) {
                Some(frequency) => (frequency, selected_days.to_vec(), duration_weeks),
                None => (1, Vec::new(), 1),
            };

        Self {
            start_date,
            due_date,
            frequency_per_week,
            selected_days,
            duration_weeks,
            time_of_day,
            time_zone: time_zone.clone(),
        }
    }
}

/// Ordered occurrence timestamps plus the number trimmed past the due date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub occurrences: Vec<Timestamp>,
    pub trimmed: usize,
}

/// Compute the occurrence timestamps for `request`.
///
/// # Errors
///
/// - `InvalidDateRange` when the start date is after the due date
/// - `NoOccurrencesFound` when no occurrence survives trimming
/// - `ScheduleOverflow` when the calendar walk exceeds its safety bound
pub fn compute(request: &ScheduleRequest) -> Result<Schedule> {
    if let Some(due) = request.due_date {
        if request.start_date > due {
            return Err(ProgressError::InvalidDateRange {
                start: request.start_date,
                due,
            });
        }
    }

    let dates = if request.selected_days.is_empty() {
        consecutive_days(request)?
    } else {
        walk_selected_days(request)?
    };

    let mut occurrences = dates
        .into_iter()
        .map(|date| occurrence_at(date, request.time_of_day, &request.time_zone))
        .collect::<Result<Vec<_>>>()?;

    let mut trimmed = 0;
    if let Some(due) = request.due_date {
        let boundary = end_of_day(due, &request.time_zone)?;
        let before = occurrences.len();
        occurrences.retain(|occurrence| *occurrence <= boundary);
        trimmed = before - occurrences.len();
    }

    if occurrences.is_empty() {
        return Err(no_occurrences(request));
    }

    if trimmed > 0 {
        info!(
            "Trimmed {trimmed} occurrence(s) past due date; {} remain",
            occurrences.len()
        );
    }
    debug!("Computed {} occurrence(s) from {}", occurrences.len(), request.start_date);

    Ok(Schedule {
        occurrences,
        trimmed,
    })
}

fn walk_selected_days(request: &ScheduleRequest) -> Result<Vec<Date>> {
    let (last_day, bound) = match request.due_date {
        Some(due) => {
            let span = days_between(request.start_date, due)?;
            (due, (span + WALK_SLACK_DAYS).min(MAX_SCHEDULE_DAYS))
        }
        None => {
            let days = i64::from(request.duration_weeks) * 7 - 1;
            let last = request
                .start_date
                .checked_add(jiff::Span::new().days(days.max(0)))?;
            (last, MAX_SCHEDULE_DAYS)
        }
    };

    let mut dates = Vec::new();
    let mut day = request.start_date;
    for _ in 0..bound {
        if day > last_day {
            return Ok(dates);
        }
        if request
            .selected_days
            .contains(&Day::from_weekday(day.weekday()))
        {
            dates.push(day);
        }
        if day == last_day {
            return Ok(dates);
        }
        day = day.tomorrow()?;
    }

    Err(ProgressError::ScheduleOverflow {
        iterations: bound.unsigned_abs(),
    })
}

fn consecutive_days(request: &ScheduleRequest) -> Result<Vec<Date>> {
    let count = request
        .frequency_per_week
        .saturating_mul(request.duration_weeks);
    if count > MAX_SCHEDULE_DAYS.unsigned_abs() {
        return Err(ProgressError::ScheduleOverflow {
            iterations: MAX_SCHEDULE_DAYS.unsigned_abs(),
        });
    }

    let mut dates = Vec::with_capacity(count as usize);
    let mut day = request.start_date;
    for _ in 0..count {
        dates.push(day);
        day = day.tomorrow()?;
    }
    Ok(dates)
}

fn no_occurrences(request: &ScheduleRequest) -> ProgressError {
    let days = if request.selected_days.is_empty() {
        "EVERY DAY".to_string()
    } else {
        Day::join_abbrev(&request.selected_days)
    };
    ProgressError::NoOccurrencesFound {
        days,
        start: request.start_date,
        due: request
            .due_date
            .map_or_else(|| "open end".to_string(), |due| due.to_string()),
    }
}

/// Whole days from `start` to `end`.
pub fn days_between(start: Date, end: Date) -> Result<i32> {
    Ok(start.until((Unit::Day, end))?.get_days())
}

/// The instant an occurrence on `date` starts.
pub fn occurrence_at(date: Date, time_of_day: Time, time_zone: &TimeZone) -> Result<Timestamp> {
    Ok(date
        .to_datetime(time_of_day)
        .to_zoned(time_zone.clone())?
        .timestamp())
}

/// Last representable instant of `date` in `time_zone`.
pub fn end_of_day(date: Date, time_zone: &TimeZone) -> Result<Timestamp> {
    Ok(date
        .at(23, 59, 59, 999_999_999)
        .to_zoned(time_zone.clone())?
        .timestamp())
}

/// Calendar date of an occurrence in `time_zone`.
pub fn occurrence_date(occurrence: Timestamp, time_zone: &TimeZone) -> Date {
    occurrence.to_zoned(time_zone.clone()).date()
}

/// Week (1-based, counted from the start date) and session within that week
/// (1-based) of the occurrence at `index`.
pub fn week_and_session(
    start_date: Date,
    occurrences: &[Timestamp],
    index: usize,
    time_zone: &TimeZone,
) -> Result<(u32, u32)> {
    let week_of = |occurrence: Timestamp| -> Result<u32> {
        let offset = days_between(start_date, occurrence_date(occurrence, time_zone))?;
        Ok(offset.max(0).unsigned_abs() / 7 + 1)
    };

    let Some(&occurrence) = occurrences.get(index) else {
        return Err(ProgressError::invalid_input("occurrence_index")
            .with_reason(format!("Occurrence {index} is outside the schedule")));
    };

    let week = week_of(occurrence)?;
    let mut session = 1;
    for earlier in &occurrences[..index] {
        if week_of(*earlier)? == week {
            session += 1;
        }
    }
    Ok((week, session))
}
