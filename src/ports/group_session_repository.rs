//! GroupSessionRepository port - persistence interface for group sessions.
//!
//! The lifecycle pass queries select on a time-window predicate AND an unset
//! idempotency marker, so an engine run that arrives late still finds its
//! rows, and a stamped row never comes back.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, GroupSessionId, Timestamp, UserId};
use crate::domain::scheduling::UtcInterval;
use crate::domain::sessions::GroupSession;

/// Port for storing and retrieving group sessions.
#[async_trait]
pub trait GroupSessionRepository: Send + Sync {
    /// Persist a new session.
    async fn save(&self, session: &GroupSession) -> Result<(), DomainError>;

    /// Persist changes to an existing session.
    async fn update(&self, session: &GroupSession) -> Result<(), DomainError>;

    /// Find a session by id.
    async fn find_by_id(&self, id: &GroupSessionId) -> Result<Option<GroupSession>, DomainError>;

    /// Scheduled sessions whose start falls inside `[from, to)` and whose
    /// minimum-check marker is unset.
    async fn find_needing_minimum_check(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<GroupSession>, DomainError>;

    /// Confirmed sessions with a room whose start falls inside `[from, to)`
    /// and whose day-reminder marker is unset.
    async fn find_needing_day_reminder(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<GroupSession>, DomainError>;

    /// Confirmed sessions with a room whose start falls inside `[from, to)`
    /// and whose hour-reminder marker is unset.
    async fn find_needing_hour_reminder(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<GroupSession>, DomainError>;

    /// All Confirmed sessions (the auto-completion pass filters on computed
    /// end time itself).
    async fn find_confirmed(&self) -> Result<Vec<GroupSession>, DomainError>;

    /// Sessions for a mentor that still occupy the calendar (Scheduled or
    /// Confirmed) and overlap the given interval.
    async fn find_occupying_for_mentor(
        &self,
        mentor_id: &UserId,
        interval: &UtcInterval,
    ) -> Result<Vec<GroupSession>, DomainError>;
}
