//! Date/time display utilities.

use std::fmt;

use jiff::{tz::TimeZone, Timestamp};

/// Formats a timestamp in a given time zone as `Mon 2024-01-01 09:00 UTC`.
///
/// ```rust
/// use jiff::{tz::TimeZone, Timestamp};
/// use stepwise_core::display::LocalDateTime;
///
/// let ts: Timestamp = "2024-01-01T09:00:00Z".parse().unwrap();
/// let shown = LocalDateTime::new(&ts, &TimeZone::UTC).to_string();
/// assert_eq!(shown, "Mon 2024-01-01 09:00 UTC");
/// ```
pub struct LocalDateTime<'a> {
    timestamp: &'a Timestamp,
    time_zone: TimeZone,
}

impl<'a> LocalDateTime<'a> {
    pub fn new(timestamp: &'a Timestamp, time_zone: &TimeZone) -> Self {
        Self {
            timestamp,
            time_zone: time_zone.clone(),
        }
    }

    /// Formats in the system time zone.
    pub fn system(timestamp: &'a Timestamp) -> Self {
        Self::new(timestamp, &TimeZone::system())
    }
}

impl fmt::Display for LocalDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.timestamp
                .to_zoned(self.time_zone.clone())
                .strftime("%a %Y-%m-%d %H:%M %Z")
        )
    }
}
