//! GetAvailableSlotsHandler - booking read API query.
//!
//! Returns generated slots plus the raw booked intervals and blocked dates,
//! so a client can render a calendar without re-deriving the exclusion
//! logic. Pure read: safe to call concurrently and repeatedly.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::booking::CallDuration;
use crate::domain::foundation::{DomainError, UserId};
use crate::domain::scheduling::{
    generate_slots, validate_non_overlapping, BookedInterval, DaySlots, SlotPolicy, UtcInterval,
};
use crate::ports::{AvailabilityRepository, Clock};

/// Query for a mentor's bookable slots.
#[derive(Debug, Clone)]
pub struct GetAvailableSlotsQuery {
    pub mentor_id: UserId,
    pub duration_minutes: u32,
}

/// Slots plus the exclusions they were computed from.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableSlotsView {
    pub mentor_id: UserId,
    pub days: Vec<DaySlots>,
    pub booked: Vec<BookedInterval>,
    pub blocked_dates: Vec<NaiveDate>,
}

/// Handler for the slots query.
pub struct GetAvailableSlotsHandler {
    availability: Arc<dyn AvailabilityRepository>,
    clock: Arc<dyn Clock>,
}

impl GetAvailableSlotsHandler {
    pub fn new(availability: Arc<dyn AvailabilityRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            availability,
            clock,
        }
    }

    pub async fn handle(
        &self,
        query: GetAvailableSlotsQuery,
    ) -> Result<AvailableSlotsView, DomainError> {
        // 1. Validate the requested duration.
        let duration = CallDuration::try_from_minutes(query.duration_minutes)?;

        // 2. Load availability and exclusions.
        let windows = self.availability.windows_for_mentor(&query.mentor_id).await?;
        validate_non_overlapping(&windows)?;
        let blocked = self
            .availability
            .blocked_dates_for_mentor(&query.mentor_id)
            .await?;
        let booked = self
            .availability
            .booked_intervals_for_mentor(&query.mentor_id)
            .await?;

        // 3. Generate.
        let booked_intervals: Vec<UtcInterval> = booked.iter().map(|b| b.interval).collect();
        let days = generate_slots(
            &windows,
            &booked_intervals,
            &blocked,
            self.clock.now(),
            duration.minutes(),
            &SlotPolicy::one_on_one_calls(),
        );

        Ok(AvailableSlotsView {
            mentor_id: query.mentor_id,
            days,
            booked,
            blocked_dates: blocked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::memory::{
        InMemoryAvailabilityRepository, InMemoryCallRepository, InMemoryGroupSessionRepository,
    };
    use crate::domain::booking::Call;
    use crate::domain::foundation::{CallId, Money, Timestamp};
    use crate::domain::scheduling::AvailabilityWindow;
    use crate::ports::CallRepository;
    use chrono::NaiveTime;

    fn now() -> Timestamp {
        Timestamp::from_unix_secs(1_717_581_600) // 2024-06-05T10:00:00Z, a Wednesday
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    struct Fixture {
        calls: Arc<InMemoryCallRepository>,
        availability: Arc<InMemoryAvailabilityRepository>,
        handler: GetAvailableSlotsHandler,
    }

    fn fixture() -> Fixture {
        let calls = Arc::new(InMemoryCallRepository::new());
        let sessions = Arc::new(InMemoryGroupSessionRepository::new());
        let availability = Arc::new(InMemoryAvailabilityRepository::new(
            calls.clone(),
            sessions.clone(),
        ));
        let handler = GetAvailableSlotsHandler::new(
            availability.clone(),
            Arc::new(FixedClock::at(now())),
        );
        Fixture {
            calls,
            availability,
            handler,
        }
    }

    fn monday_window(mentor: UserId) -> AvailabilityWindow {
        AvailabilityWindow::new(mentor, 1, time(9, 0), time(12, 0), chrono_tz::UTC).unwrap()
    }

    #[tokio::test]
    async fn returns_slots_for_the_monday_morning_window() {
        let f = fixture();
        let mentor = UserId::new();
        f.availability.set_windows(mentor, vec![monday_window(mentor)]);

        let view = f
            .handler
            .handle(GetAvailableSlotsQuery {
                mentor_id: mentor,
                duration_minutes: 30,
            })
            .await
            .unwrap();

        let first_day = &view.days[0];
        let first = first_day.slots.first().unwrap();
        let last = first_day.slots.last().unwrap();
        assert_eq!(
            first.start,
            Timestamp::from_unix_secs(1_718_010_000) // Monday 2024-06-10T09:00Z
        );
        assert_eq!(
            last.start,
            Timestamp::from_unix_secs(1_718_019_000) // Monday 2024-06-10T11:30Z
        );
        assert!(view.booked.is_empty());
        assert!(view.blocked_dates.is_empty());
    }

    #[tokio::test]
    async fn surfaces_booked_intervals_and_excludes_them_from_slots() {
        let f = fixture();
        let mentor = UserId::new();
        f.availability.set_windows(mentor, vec![monday_window(mentor)]);

        let call = Call::confirmed(
            CallId::new(),
            UserId::new(),
            mentor,
            Timestamp::from_unix_secs(1_718_011_800), // Monday 09:30Z
            CallDuration::ThirtyMinutes,
            Money::from_cents(5_000),
            None,
            now(),
        );
        f.calls.save(&call).await.unwrap();

        let view = f
            .handler
            .handle(GetAvailableSlotsQuery {
                mentor_id: mentor,
                duration_minutes: 30,
            })
            .await
            .unwrap();

        assert_eq!(view.booked.len(), 1);
        for day in &view.days {
            for slot in &day.slots {
                assert!(!slot.overlaps(&view.booked[0].interval));
            }
        }
    }

    #[tokio::test]
    async fn surfaces_blocked_dates() {
        let f = fixture();
        let mentor = UserId::new();
        f.availability.set_windows(mentor, vec![monday_window(mentor)]);
        let blocked = chrono::NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        f.availability.block_date(mentor, blocked);

        let view = f
            .handler
            .handle(GetAvailableSlotsQuery {
                mentor_id: mentor,
                duration_minutes: 30,
            })
            .await
            .unwrap();

        assert_eq!(view.blocked_dates, vec![blocked]);
        assert!(view.days.iter().all(|d| d.date != blocked));
    }

    #[tokio::test]
    async fn rejects_unsupported_durations() {
        let f = fixture();
        let result = f
            .handler
            .handle(GetAvailableSlotsQuery {
                mentor_id: UserId::new(),
                duration_minutes: 45,
            })
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn mentor_without_windows_gets_an_empty_calendar() {
        let f = fixture();
        let view = f
            .handler
            .handle(GetAvailableSlotsQuery {
                mentor_id: UserId::new(),
                duration_minutes: 30,
            })
            .await
            .unwrap();

        assert!(view.days.is_empty());
    }
}
