//! Weekday selection for habit goals.

use std::{fmt, str::FromStr};

use jiff::civil::Weekday;
use serde::{Deserialize, Serialize};

/// A day of the week a habit goal is practised on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Mon,
        Day::Tue,
        Day::Wed,
        Day::Thu,
        Day::Fri,
        Day::Sat,
        Day::Sun,
    ];

    /// Upper-case three letter abbreviation, e.g. `MON`.
    pub fn abbrev(&self) -> &'static str {
        match self {
            Day::Mon => "MON",
            Day::Tue => "TUE",
            Day::Wed => "WED",
            Day::Thu => "THU",
            Day::Fri => "FRI",
            Day::Sat => "SAT",
            Day::Sun => "SUN",
        }
    }

    /// Lower-case storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Mon => "mon",
            Day::Tue => "tue",
            Day::Wed => "wed",
            Day::Thu => "thu",
            Day::Fri => "fri",
            Day::Sat => "sat",
            Day::Sun => "sun",
        }
    }

    pub fn to_weekday(self) -> Weekday {
        match self {
            Day::Mon => Weekday::Monday,
            Day::Tue => Weekday::Tuesday,
            Day::Wed => Weekday::Wednesday,
            Day::Thu => Weekday::Thursday,
            Day::Fri => Weekday::Friday,
            Day::Sat => Weekday::Saturday,
            Day::Sun => Weekday::Sunday,
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Monday => Day::Mon,
            Weekday::Tuesday => Day::Tue,
            Weekday::Wednesday => Day::Wed,
            Weekday::Thursday => Day::Thu,
            Weekday::Friday => Day::Fri,
            Weekday::Saturday => Day::Sat,
            Weekday::Sunday => Day::Sun,
        }
    }

    /// Parse a comma separated list such as `mon,wed,fri`. Blank input is an
    /// empty selection; duplicates are collapsed and the result is sorted.
    pub fn parse_list(s: &str) -> Result<Vec<Day>, String> {
        let mut days = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Day::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        days.sort();
        days.dedup();
        Ok(days)
    }

    /// Storage form of a selection: `mon,wed,fri`.
    pub fn join(days: &[Day]) -> String {
        days.iter().map(Day::as_str).collect::<Vec<_>>().join(",")
    }

    /// Display form of a selection: `MON, WED, FRI`.
    pub fn join_abbrev(days: &[Day]) -> String {
        days.iter().map(Day::abbrev).collect::<Vec<_>>().join(", ")
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mon" | "monday" => Ok(Day::Mon),
            "tue" | "tues" | "tuesday" => Ok(Day::Tue),
            "wed" | "wednesday" => Ok(Day::Wed),
            "thu" | "thur" | "thurs" | "thursday" => Ok(Day::Thu),
            "fri" | "friday" => Ok(Day::Fri),
            "sat" | "saturday" => Ok(Day::Sat),
            "sun" | "sunday" => Ok(Day::Sun),
            _ => Err(format!("Invalid weekday: {s}")),
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}
