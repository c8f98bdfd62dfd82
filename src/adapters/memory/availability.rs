//! In-memory AvailabilityRepository for tests and local development.
//!
//! Booked intervals are derived live from the call and session repositories,
//! mirroring what the SQL implementation does with a union query.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::scheduling::{AvailabilityWindow, BookedInterval, UtcInterval};
use crate::ports::{AvailabilityRepository, CallRepository, GroupSessionRepository};

use super::{InMemoryCallRepository, InMemoryGroupSessionRepository};

/// In-memory availability store composed over the booking repositories.
pub struct InMemoryAvailabilityRepository {
    windows: Mutex<HashMap<UserId, Vec<AvailabilityWindow>>>,
    blocked: Mutex<HashMap<UserId, Vec<NaiveDate>>>,
    calls: Arc<InMemoryCallRepository>,
    sessions: Arc<InMemoryGroupSessionRepository>,
}

impl InMemoryAvailabilityRepository {
    pub fn new(
        calls: Arc<InMemoryCallRepository>,
        sessions: Arc<InMemoryGroupSessionRepository>,
    ) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            blocked: Mutex::new(HashMap::new()),
            calls,
            sessions,
        }
    }

    /// Replaces a mentor's recurring windows.
    pub fn set_windows(&self, mentor_id: UserId, windows: Vec<AvailabilityWindow>) {
        self.windows.lock().unwrap().insert(mentor_id, windows);
    }

    /// Adds a blocked date for a mentor.
    pub fn block_date(&self, mentor_id: UserId, date: NaiveDate) {
        self.blocked
            .lock()
            .unwrap()
            .entry(mentor_id)
            .or_default()
            .push(date);
    }
}

#[async_trait]
impl AvailabilityRepository for InMemoryAvailabilityRepository {
    async fn windows_for_mentor(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<AvailabilityWindow>, DomainError> {
        Ok(self
            .windows
            .lock()
            .unwrap()
            .get(mentor_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn blocked_dates_for_mentor(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<NaiveDate>, DomainError> {
        Ok(self
            .blocked
            .lock()
            .unwrap()
            .get(mentor_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn booked_intervals_for_mentor(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<BookedInterval>, DomainError> {
        // A generous window: everything live on the calendar matters to the
        // generator, which applies its own horizon.
        let span = UtcInterval::new(
            Timestamp::from_unix_secs(0),
            Timestamp::now().plus_days(365),
        )
        .expect("span is well-formed");

        let mut booked = Vec::new();
        for call in self.calls.find_occupying_for_mentor(mentor_id, &span).await? {
            booked.push(BookedInterval::from_call(call.id, call.interval()));
        }
        for session in self
            .sessions
            .find_occupying_for_mentor(mentor_id, &span)
            .await?
        {
            booked.push(BookedInterval::from_group_session(
                session.id,
                session.interval(),
            ));
        }
        booked.sort_by_key(|b| b.interval.start);
        Ok(booked)
    }
}
