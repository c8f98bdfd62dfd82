//! Candidate slot generation over a rolling horizon.
//!
//! Pure compute over availability windows, booked intervals, and blocked
//! dates. Never mutates state, so it is safe to call concurrently and
//! repeatedly; correctness under concurrent bookings is the datastore's
//! transactional concern, not this module's.
//!
//! Wall-clock candidates are converted to UTC through the mentor's zone per
//! date. Local times that do not exist (spring-forward gap) or are ambiguous
//! (fall-back repeat) on a given date are skipped rather than guessed.

use chrono::{Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::domain::foundation::Timestamp;

use super::{AvailabilityWindow, UtcInterval};

/// Spacing between candidate slot starts.
pub const SLOT_GRANULARITY_MINUTES: u32 = 15;

/// Rolling horizon over which slots are generated.
pub const SLOT_HORIZON_DAYS: i64 = 14;

/// Minimum advance notice required when placing a new group session.
pub const GROUP_SESSION_LEAD_HOURS: i64 = 24;

/// Generation policy: horizon, granularity, and minimum advance lead.
#[derive(Debug, Clone)]
pub struct SlotPolicy {
    pub horizon_days: i64,
    pub granularity_minutes: u32,
    pub min_lead: Duration,
}

impl SlotPolicy {
    /// Policy for 1:1 call slots: only non-overlap and not-in-the-past.
    pub fn one_on_one_calls() -> Self {
        Self {
            horizon_days: SLOT_HORIZON_DAYS,
            granularity_minutes: SLOT_GRANULARITY_MINUTES,
            min_lead: Duration::zero(),
        }
    }

    /// Policy for placing new group sessions: 24-hour minimum lead.
    pub fn group_sessions() -> Self {
        Self {
            horizon_days: SLOT_HORIZON_DAYS,
            granularity_minutes: SLOT_GRANULARITY_MINUTES,
            min_lead: Duration::hours(GROUP_SESSION_LEAD_HOURS),
        }
    }
}

/// Candidate slots for one calendar date in the mentor's zone.
#[derive(Debug, Clone, Serialize)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub slots: Vec<UtcInterval>,
}

/// Generates bookable slots for a mentor.
///
/// For each horizon date (mentor's zone): skips blocked dates, enumerates
/// candidate starts at the policy granularity inside each matching window
/// such that `start + duration <= window.end`, converts to UTC, and keeps
/// candidates that start at or after `now + min_lead` and overlap no booked
/// interval (half-open test).
///
/// Output is ordered by date, slots within a day ordered by start.
pub fn generate_slots(
    windows: &[AvailabilityWindow],
    booked: &[UtcInterval],
    blocked: &[NaiveDate],
    now: Timestamp,
    duration_minutes: u32,
    policy: &SlotPolicy,
) -> Vec<DaySlots> {
    let Some(first) = windows.first() else {
        return Vec::new();
    };
    let tz = first.timezone;

    let earliest = Timestamp::from_datetime(*now.as_datetime() + policy.min_lead);
    let today_local = now.as_datetime().with_timezone(&tz).date_naive();

    let mut days = Vec::new();
    for day_offset in 0..policy.horizon_days {
        let date = today_local + Duration::days(day_offset);
        if blocked.contains(&date) {
            continue;
        }

        let mut slots: Vec<UtcInterval> = Vec::new();
        for window in windows.iter().filter(|w| w.matches_date(date)) {
            let (start_min, end_min) = window.minute_bounds();

            let mut offset = start_min;
            while offset + duration_minutes <= end_min {
                if let Some(slot) = candidate_at(tz, date, offset, duration_minutes) {
                    let starts_in_past = slot.start.is_before(&earliest);
                    let collides = booked.iter().any(|b| slot.overlaps(b));
                    if !starts_in_past && !collides {
                        slots.push(slot);
                    }
                }
                offset += policy.granularity_minutes;
            }
        }

        if !slots.is_empty() {
            slots.sort_by_key(|s| s.start);
            days.push(DaySlots { date, slots });
        }
    }

    days
}

/// Converts one wall-clock candidate to a concrete UTC slot.
///
/// Returns `None` when the local time does not resolve to a single instant
/// on that date (DST gap or ambiguity).
fn candidate_at(
    tz: chrono_tz::Tz,
    date: NaiveDate,
    minutes_from_midnight: u32,
    duration_minutes: u32,
) -> Option<UtcInterval> {
    let time = NaiveTime::MIN + Duration::minutes(i64::from(minutes_from_midnight));
    let local = date.and_time(time);

    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => {
            let start = Timestamp::from_datetime(dt.with_timezone(&Utc));
            Some(UtcInterval::from_start_and_minutes(start, duration_minutes))
        }
        _ => None,
    }
}
