//! ParticipantRepository port - persistence for group-session participants.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, GroupSessionId};
use crate::domain::sessions::GroupSessionParticipant;

/// Port for storing and retrieving participant registrations.
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// Persist a new registration.
    async fn save(&self, participant: &GroupSessionParticipant) -> Result<(), DomainError>;

    /// Persist changes to an existing registration.
    async fn update(&self, participant: &GroupSessionParticipant) -> Result<(), DomainError>;

    /// All participant rows for a session, any status.
    async fn find_by_session(
        &self,
        session_id: &GroupSessionId,
    ) -> Result<Vec<GroupSessionParticipant>, DomainError>;

    /// Number of Registered participants for a session.
    async fn count_registered(&self, session_id: &GroupSessionId) -> Result<u32, DomainError>;
}
