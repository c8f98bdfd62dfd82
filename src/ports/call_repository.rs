//! CallRepository port - persistence interface for Call aggregates.

use async_trait::async_trait;

use crate::domain::booking::Call;
use crate::domain::foundation::{CallId, DomainError, UserId};
use crate::domain::scheduling::UtcInterval;

/// Port for storing and retrieving calls.
///
/// Booking-interval uniqueness is a transactional invariant of the
/// implementation (unique/exclusion constraint or serialized writes), not an
/// advisory check in the application layer.
#[async_trait]
pub trait CallRepository: Send + Sync {
    /// Persist a new call.
    async fn save(&self, call: &Call) -> Result<(), DomainError>;

    /// Persist changes to an existing call.
    async fn update(&self, call: &Call) -> Result<(), DomainError>;

    /// Find a call by id.
    async fn find_by_id(&self, id: &CallId) -> Result<Option<Call>, DomainError>;

    /// Calls for a mentor that still occupy the calendar (Requested or
    /// Confirmed) and overlap the given interval.
    async fn find_occupying_for_mentor(
        &self,
        mentor_id: &UserId,
        interval: &UtcInterval,
    ) -> Result<Vec<Call>, DomainError>;
}
