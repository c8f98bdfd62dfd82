//! In-memory GroupSessionRepository for tests and local development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, GroupSessionId, Timestamp, UserId};
use crate::domain::scheduling::UtcInterval;
use crate::domain::sessions::{GroupSession, GroupSessionStatus};
use crate::ports::GroupSessionRepository;

/// Mutex-guarded map standing in for the group_sessions table.
#[derive(Default)]
pub struct InMemoryGroupSessionRepository {
    sessions: Mutex<HashMap<GroupSessionId, GroupSession>>,
}

impl InMemoryGroupSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all stored sessions, for assertions.
    pub fn all(&self) -> Vec<GroupSession> {
        self.sessions.lock().unwrap().values().cloned().collect()
    }

    fn filter<F>(&self, predicate: F) -> Vec<GroupSession>
    where
        F: Fn(&GroupSession) -> bool,
    {
        let mut matched: Vec<GroupSession> = self
            .sessions
            .lock()
            .unwrap()
            .values()
            .filter(|s| predicate(s))
            .cloned()
            .collect();
        matched.sort_by_key(|s| s.scheduled_at);
        matched
    }
}

fn starts_in(session: &GroupSession, from: Timestamp, to: Timestamp) -> bool {
    !session.scheduled_at.is_before(&from) && session.scheduled_at.is_before(&to)
}

#[async_trait]
impl GroupSessionRepository for InMemoryGroupSessionRepository {
    async fn save(&self, session: &GroupSession) -> Result<(), DomainError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn update(&self, session: &GroupSession) -> Result<(), DomainError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &GroupSessionId,
    ) -> Result<Option<GroupSession>, DomainError> {
        Ok(self.sessions.lock().unwrap().get(id).cloned())
    }

    async fn find_needing_minimum_check(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<GroupSession>, DomainError> {
        Ok(self.filter(|s| {
            s.status == GroupSessionStatus::Scheduled
                && s.minimum_checked_at.is_none()
                && starts_in(s, from, to)
        }))
    }

    async fn find_needing_day_reminder(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<GroupSession>, DomainError> {
        Ok(self.filter(|s| {
            s.status == GroupSessionStatus::Confirmed
                && s.room_url.is_some()
                && s.day_reminder_sent_at.is_none()
                && starts_in(s, from, to)
        }))
    }

    async fn find_needing_hour_reminder(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<GroupSession>, DomainError> {
        Ok(self.filter(|s| {
            s.status == GroupSessionStatus::Confirmed
                && s.room_url.is_some()
                && s.hour_reminder_sent_at.is_none()
                && starts_in(s, from, to)
        }))
    }

    async fn find_confirmed(&self) -> Result<Vec<GroupSession>, DomainError> {
        Ok(self.filter(|s| s.status == GroupSessionStatus::Confirmed))
    }

    async fn find_occupying_for_mentor(
        &self,
        mentor_id: &UserId,
        interval: &UtcInterval,
    ) -> Result<Vec<GroupSession>, DomainError> {
        Ok(self.filter(|s| {
            s.mentor_id == *mentor_id && s.occupies_calendar() && s.interval().overlaps(interval)
        }))
    }
}
