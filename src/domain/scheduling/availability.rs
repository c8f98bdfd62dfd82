//! Recurring mentor availability and explicit date blocks.
//!
//! Availability is recorded as wall-clock windows in the mentor's declared
//! time zone, keyed by day of week (0 = Sunday, matching the upstream
//! convention). Conversion to concrete UTC intervals happens at slot
//! generation time, never at storage time, so a mentor's windows survive DST
//! shifts unchanged.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{UserId, ValidationError};

/// A recurring weekly availability window for a mentor.
///
/// # Invariants
///
/// - `start < end` within a single day
/// - windows for the same mentor and day must not overlap (checked by
///   [`validate_non_overlapping`])
/// - all windows of one mentor share a single time zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// Mentor this window belongs to.
    pub mentor_id: UserId,

    /// Day of week, 0 = Sunday through 6 = Saturday.
    pub day_of_week: u8,

    /// Local wall-clock start of the window.
    pub start: NaiveTime,

    /// Local wall-clock end of the window.
    pub end: NaiveTime,

    /// IANA time zone the wall-clock times are expressed in.
    pub timezone: Tz,
}

impl AvailabilityWindow {
    /// Creates a window, validating day number and ordering.
    pub fn new(
        mentor_id: UserId,
        day_of_week: u8,
        start: NaiveTime,
        end: NaiveTime,
        timezone: Tz,
    ) -> Result<Self, ValidationError> {
        if day_of_week > 6 {
            return Err(ValidationError::out_of_range(
                "day_of_week",
                0,
                6,
                i64::from(day_of_week),
            ));
        }
        if start >= end {
            return Err(ValidationError::invalid_format(
                "availability_window",
                "start must be before end within the day",
            ));
        }
        Ok(Self {
            mentor_id,
            day_of_week,
            start,
            end,
            timezone,
        })
    }

    /// The chrono weekday this window recurs on.
    pub fn weekday(&self) -> Weekday {
        match self.day_of_week {
            0 => Weekday::Sun,
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            _ => Weekday::Sat,
        }
    }

    /// Whether this window recurs on the given calendar date.
    pub fn matches_date(&self, date: NaiveDate) -> bool {
        date.weekday().num_days_from_sunday() as u8 == self.day_of_week
    }

    /// Wall-clock times as minutes from local midnight.
    pub fn minute_bounds(&self) -> (u32, u32) {
        let start = self.start.signed_duration_since(NaiveTime::MIN).num_minutes() as u32;
        let end = self.end.signed_duration_since(NaiveTime::MIN).num_minutes() as u32;
        (start, end)
    }
}

/// Validates that a mentor's windows are internally consistent:
/// no two windows on the same day overlap, and all share one time zone.
pub fn validate_non_overlapping(windows: &[AvailabilityWindow]) -> Result<(), ValidationError> {
    if let Some(first) = windows.first() {
        if windows.iter().any(|w| w.timezone != first.timezone) {
            return Err(ValidationError::invalid_format(
                "availability_windows",
                "all windows for a mentor must share one time zone",
            ));
        }
    }

    for (i, a) in windows.iter().enumerate() {
        for b in windows.iter().skip(i + 1) {
            if a.day_of_week == b.day_of_week && a.start < b.end && a.end > b.start {
                return Err(ValidationError::invalid_format(
                    "availability_windows",
                    format!(
                        "windows {}-{} and {}-{} overlap on day {}",
                        a.start, a.end, b.start, b.end, a.day_of_week
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// A calendar date (in the mentor's zone) the mentor has explicitly closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedDate {
    pub mentor_id: UserId,
    pub date: NaiveDate,
}
