//! Synthetic calendar: maps a row position to a placeholder date.
//!
//! Row `i` is stamped `epoch + i days`. The input carries no real
//! timestamp, so every calendar column derived here (date, quarter,
//! year, month name, ISO week) is demo data, not transaction history.

use crate::{
    error::{PipelineError, PipelineResult},
    types::RowNumber,
};
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_EPOCH_YMD: (i32, u32, u32) = (2024, 1, 1);

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Monday = 0 .. Sunday = 6, matching the input's `day_of_week` column.
pub const DAY_NAMES: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyntheticCalendar {
    pub epoch: NaiveDate,
}

impl SyntheticCalendar {
    pub fn new(epoch: NaiveDate) -> Self {
        Self { epoch }
    }

    /// Calendar fields for the data row at one-based position `row`.
    pub fn fields_for(&self, row: RowNumber) -> PipelineResult<CalendarFields> {
        let offset = row.saturating_sub(1) as u64;
        let date = self
            .epoch
            .checked_add_days(Days::new(offset))
            .ok_or_else(|| PipelineError::InvalidConfig {
                reason: format!("epoch {} + {offset} days overflows the calendar", self.epoch),
            })?;
        Ok(CalendarFields::from_date(date))
    }
}

impl Default for SyntheticCalendar {
    fn default() -> Self {
        let (y, m, d) = DEFAULT_EPOCH_YMD;
        // 2024-01-01 is always a valid date.
        Self::new(NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFields {
    pub date:         NaiveDate,
    pub year:         i32,
    pub quarter:      u32,
    pub month_name:   &'static str,
    pub week_of_year: u32,
}

impl CalendarFields {
    pub fn from_date(date: NaiveDate) -> Self {
        let month0 = date.month0();
        Self {
            date,
            year:         date.year(),
            quarter:      month0 / 3 + 1,
            month_name:   MONTH_NAMES[month0 as usize],
            week_of_year: date.iso_week().week(),
        }
    }
}

/// Weekday name for a `day_of_week` index, or None outside 0..=6.
pub fn day_name(day_of_week: u32) -> Option<&'static str> {
    DAY_NAMES.get(day_of_week as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn first_row_lands_on_epoch() {
        let cal = SyntheticCalendar::default();
        let f = cal.fields_for(1).unwrap();
        assert_eq!(f.date, ymd(2024, 1, 1));
        assert_eq!(f.quarter, 1);
        assert_eq!(f.month_name, "January");
        assert_eq!(f.week_of_year, 1);
    }

    #[test]
    fn rows_advance_one_day_each() {
        let cal = SyntheticCalendar::default();
        // 2024 is a leap year: row 61 is 2024-03-01.
        let f = cal.fields_for(61).unwrap();
        assert_eq!(f.date, ymd(2024, 3, 1));
        assert_eq!(f.quarter, 1);
        let f = cal.fields_for(92).unwrap();
        assert_eq!(f.date, ymd(2024, 4, 1));
        assert_eq!(f.quarter, 2);
        assert_eq!(f.month_name, "April");
    }

    #[test]
    fn iso_week_wraps_at_year_end() {
        let cal = SyntheticCalendar::new(ymd(2024, 12, 30));
        let f = cal.fields_for(1).unwrap();
        assert_eq!(f.year, 2024);
        assert_eq!(f.week_of_year, 1);
    }

    #[test]
    fn day_names_cover_monday_to_sunday() {
        assert_eq!(day_name(0), Some("Monday"));
        assert_eq!(day_name(6), Some("Sunday"));
        assert_eq!(day_name(7), None);
    }
}
