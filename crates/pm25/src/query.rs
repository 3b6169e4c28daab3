//! Validated query parameters.

use aq_common::{AqError, AqResult, DateWindow};
use region::Coordinate;

/// Parameters of a period-averages computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AveragesQuery {
    pub point: Option<Coordinate>,
    /// ISO week, 1-53
    pub week: i32,
    /// Month, 1-12
    pub month: i32,
    pub year: i32,
}

impl AveragesQuery {
    /// Check ranges and return the window of the requested year.
    pub fn validate(&self) -> AqResult<DateWindow> {
        if !(1..=53).contains(&self.week) {
            return Err(AqError::invalid(
                "week_number",
                "Week number must be between 1 and 53.",
            ));
        }
        if !(1..=12).contains(&self.month) {
            return Err(AqError::invalid(
                "month_number",
                "Month number must be between 1 and 12.",
            ));
        }
        DateWindow::year(self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(week: i32, month: i32, year: i32) -> AveragesQuery {
        AveragesQuery { point: None, week, month, year }
    }

    #[test]
    fn test_ranges() {
        assert!(query(1, 1, 2025).validate().is_ok());
        assert!(query(53, 12, 2025).validate().is_ok());
        assert!(query(0, 1, 2025).validate().is_err());
        assert!(query(54, 1, 2025).validate().is_err());
        assert!(query(1, 0, 2025).validate().is_err());
        assert!(query(1, 13, 2025).validate().is_err());
    }

    #[test]
    fn test_unrepresentable_year() {
        let err = query(1, 1, i32::MAX).validate().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_window_is_calendar_year() {
        let window = query(1, 1, 2025).validate().unwrap();
        assert_eq!(window.days(), 365);
    }
}
