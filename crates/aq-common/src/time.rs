//! Calendar handling for dated imagery.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{AqError, AqResult};

/// Date format accepted on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A half-open date window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Create a window, rejecting empty or inverted ranges.
    pub fn new(start: NaiveDate, end: NaiveDate) -> AqResult<Self> {
        if start >= end {
            return Err(AqError::invalid(
                "end_date",
                format!("end date {} must be after start date {}", end, start),
            ));
        }
        Ok(Self { start, end })
    }

    /// Parse a window from two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> AqResult<Self> {
        let start = parse_date("start_date", start)?;
        let end = parse_date("end_date", end)?;
        Self::new(start, end)
    }

    /// The whole calendar year.
    pub fn year(year: i32) -> AqResult<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| AqError::invalid("year", format!("{} is not a valid year", year)))?;
        let end = NaiveDate::from_ymd_opt(year + 1, 1, 1)
            .ok_or_else(|| AqError::invalid("year", format!("{} is not a valid year", year)))?;
        Ok(Self { start, end })
    }

    /// Check whether a date falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// Number of days covered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Iterate every date of the window.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.days()).map(move |offset| start + Duration::days(offset))
    }
}

/// Parse a `YYYY-MM-DD` date, naming the offending parameter on failure.
pub fn parse_date(param: &str, value: &str) -> AqResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        AqError::invalid(param, format!("'{}' is not a YYYY-MM-DD date: {}", value, e))
    })
}

/// Day, week and month properties attached to an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarTags {
    /// Day of month (1-31)
    pub day: u32,
    /// ISO week number (1-53)
    pub week: u32,
    /// Year the ISO week belongs to
    pub week_year: i32,
    /// Month (1-12)
    pub month: u32,
}

impl CalendarTags {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day: date.day(),
            week: date.iso_week().week(),
            week_year: date.iso_week().year(),
            month: date.month(),
        }
    }
}
