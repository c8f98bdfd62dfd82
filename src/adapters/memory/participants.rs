//! In-memory ParticipantRepository for tests and local development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, GroupSessionId, ParticipantId};
use crate::domain::sessions::GroupSessionParticipant;
use crate::ports::ParticipantRepository;

/// Mutex-guarded map standing in for the participants table.
#[derive(Default)]
pub struct InMemoryParticipantRepository {
    participants: Mutex<HashMap<ParticipantId, GroupSessionParticipant>>,
}

impl InMemoryParticipantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all stored rows, for assertions.
    pub fn all(&self) -> Vec<GroupSessionParticipant> {
        self.participants
            .lock()
            .unwrap()
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ParticipantRepository for InMemoryParticipantRepository {
    async fn save(&self, participant: &GroupSessionParticipant) -> Result<(), DomainError> {
        self.participants
            .lock()
            .unwrap()
            .insert(participant.id, participant.clone());
        Ok(())
    }

    async fn update(&self, participant: &GroupSessionParticipant) -> Result<(), DomainError> {
        self.participants
            .lock()
            .unwrap()
            .insert(participant.id, participant.clone());
        Ok(())
    }

    async fn find_by_session(
        &self,
        session_id: &GroupSessionId,
    ) -> Result<Vec<GroupSessionParticipant>, DomainError> {
        let mut matched: Vec<GroupSessionParticipant> = self
            .participants
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.session_id == *session_id)
            .cloned()
            .collect();
        matched.sort_by_key(|p| p.registered_at);
        Ok(matched)
    }

    async fn count_registered(&self, session_id: &GroupSessionId) -> Result<u32, DomainError> {
        Ok(self
            .participants
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.session_id == *session_id && p.counts_toward_minimum())
            .count() as u32)
    }
}
