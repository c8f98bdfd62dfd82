//! Concrete UTC intervals and overlap arithmetic.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CallId, GroupSessionId, Timestamp, ValidationError};

/// Half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtcInterval {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl UtcInterval {
    /// Creates an interval, validating that start precedes end.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, ValidationError> {
        if !start.is_before(&end) {
            return Err(ValidationError::invalid_format(
                "interval",
                "start must be before end",
            ));
        }
        Ok(Self { start, end })
    }

    /// Creates an interval from a start instant and a duration in minutes.
    pub fn from_start_and_minutes(start: Timestamp, minutes: u32) -> Self {
        Self {
            start,
            end: start.plus_minutes(i64::from(minutes)),
        }
    }

    /// Half-open overlap test: `a.start < b.end && a.end > b.start`.
    ///
    /// Back-to-back intervals (one ending exactly when the other starts) do
    /// not overlap.
    pub fn overlaps(&self, other: &UtcInterval) -> bool {
        self.start.is_before(&other.end) && self.end.is_after(&other.start)
    }

    /// Returns this interval expanded by `buffer` on both sides.
    pub fn expanded(&self, buffer: Duration) -> UtcInterval {
        UtcInterval {
            start: Timestamp::from_datetime(*self.start.as_datetime() - buffer),
            end: Timestamp::from_datetime(*self.end.as_datetime() + buffer),
        }
    }

    /// Returns the interval length in whole minutes.
    pub fn minutes(&self) -> i64 {
        self.end.duration_since(&self.start).num_minutes()
    }
}

/// Source entity a booked interval was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookingSource {
    Call { id: CallId },
    GroupSession { id: GroupSessionId },
}

/// A realized booking occupying a concrete UTC interval.
///
/// Derived from Call and GroupSession rows; never stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedInterval {
    pub interval: UtcInterval,
    pub source: BookingSource,
}

impl BookedInterval {
    pub fn from_call(id: CallId, interval: UtcInterval) -> Self {
        Self {
            interval,
            source: BookingSource::Call { id },
        }
    }

    pub fn from_group_session(id: GroupSessionId, interval: UtcInterval) -> Self {
        Self {
            interval,
            source: BookingSource::GroupSession { id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(unix: u64) -> Timestamp {
        Timestamp::from_unix_secs(unix)
    }

    fn interval(start_min: i64, end_min: i64) -> UtcInterval {
        let base = 1_700_000_000_u64;
        UtcInterval::new(
            ts(base + (start_min * 60) as u64),
            ts(base + (end_min * 60) as u64),
        )
        .unwrap()
    }

    #[test]
    fn rejects_inverted_interval() {
        let start = ts(1_700_000_000);
        assert!(UtcInterval::new(start.plus_minutes(10), start).is_err());
        assert!(UtcInterval::new(start, start).is_err());
    }

    #[test]
    fn from_start_and_minutes_computes_end() {
        let start = ts(1_700_000_000);
        let iv = UtcInterval::from_start_and_minutes(start, 30);
        assert_eq!(iv.end, start.plus_minutes(30));
        assert_eq!(iv.minutes(), 30);
    }

    #[test]
    fn overlapping_intervals_are_detected() {
        assert!(interval(0, 60).overlaps(&interval(30, 90)));
        assert!(interval(30, 90).overlaps(&interval(0, 60)));
        assert!(interval(0, 60).overlaps(&interval(10, 20)));
        assert!(interval(10, 20).overlaps(&interval(0, 60)));
    }

    #[test]
    fn back_to_back_intervals_do_not_overlap() {
        assert!(!interval(0, 30).overlaps(&interval(30, 60)));
        assert!(!interval(30, 60).overlaps(&interval(0, 30)));
    }

    #[test]
    fn disjoint_intervals_do_not_overlap() {
        assert!(!interval(0, 30).overlaps(&interval(60, 90)));
    }

    #[test]
    fn expanded_adds_buffer_on_both_sides() {
        let iv = interval(120, 180);
        let expanded = iv.expanded(Duration::hours(2));

        assert_eq!(expanded.start, interval(0, 60).start);
        assert_eq!(expanded.end, interval(240, 300).end);
        // A booking two hours before the original start now collides.
        assert!(expanded.overlaps(&interval(30, 60)));
    }

    #[test]
    fn booked_interval_carries_source() {
        let id = CallId::new();
        let booked = BookedInterval::from_call(id, interval(0, 30));
        assert_eq!(booked.source, BookingSource::Call { id });
    }
}
