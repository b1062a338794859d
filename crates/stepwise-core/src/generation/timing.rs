//! Due dates of generated steps within an occurrence.

use jiff::{civil::time, tz::TimeZone, SignedDuration, Timestamp};

use super::client::Phase;
use crate::{error::Result, schedule};

/// Hour of the evening before an occurrence that preparation steps are due.
pub const PREPARATION_HOUR: i8 = 20;

/// How far ahead of the individual supporter steps are scheduled.
pub const SUPPORTER_LEAD: SignedDuration = SignedDuration::from_hours(2);

/// Supporter steps are never scheduled before this hour.
pub const SUPPORTER_EARLIEST_HOUR: i8 = 8;

/// Due date of the individual step at `position` in an occurrence starting at
/// `start`.
///
/// A leading preparation step is due the evening before, the activation step
/// at the start itself, and everything after it an hour later.
pub fn individual_due(
    start: Timestamp,
    position: usize,
    phase: Phase,
    time_zone: &TimeZone,
) -> Result<Timestamp> {
    match position {
        0 if phase == Phase::Preparation => {
            let day_before = schedule::occurrence_date(start, time_zone).yesterday()?;
            schedule::occurrence_at(day_before, time(PREPARATION_HOUR, 0, 0, 0), time_zone)
        }
        0 | 1 => Ok(start),
        _ => Ok(start.checked_add(SignedDuration::from_hours(1))?),
    }
}

/// When supporter steps of an occurrence starting at `start` are due.
pub fn supporter_due(start: Timestamp, time_zone: &TimeZone) -> Result<Timestamp> {
    let lead = start.checked_sub(SUPPORTER_LEAD)?;
    let earliest = schedule::occurrence_at(
        schedule::occurrence_date(start, time_zone),
        time(SUPPORTER_EARLIEST_HOUR, 0, 0, 0),
        time_zone,
    )?;
    Ok(lead.max(earliest))
}
