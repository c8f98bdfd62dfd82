//! In-memory CallRepository for tests and local development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::booking::Call;
use crate::domain::foundation::{CallId, DomainError, UserId};
use crate::domain::scheduling::UtcInterval;
use crate::ports::CallRepository;

/// Mutex-guarded map standing in for the calls table.
#[derive(Default)]
pub struct InMemoryCallRepository {
    calls: Mutex<HashMap<CallId, Call>>,
}

impl InMemoryCallRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all stored calls, for assertions.
    pub fn all(&self) -> Vec<Call> {
        self.calls.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl CallRepository for InMemoryCallRepository {
    async fn save(&self, call: &Call) -> Result<(), DomainError> {
        self.calls.lock().unwrap().insert(call.id, call.clone());
        Ok(())
    }

    async fn update(&self, call: &Call) -> Result<(), DomainError> {
        self.calls.lock().unwrap().insert(call.id, call.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &CallId) -> Result<Option<Call>, DomainError> {
        Ok(self.calls.lock().unwrap().get(id).cloned())
    }

    async fn find_occupying_for_mentor(
        &self,
        mentor_id: &UserId,
        interval: &UtcInterval,
    ) -> Result<Vec<Call>, DomainError> {
        let mut matched: Vec<Call> = self
            .calls
            .lock()
            .unwrap()
            .values()
            .filter(|c| {
                c.mentor_id == *mentor_id
                    && c.occupies_calendar()
                    && c.interval().overlaps(interval)
            })
            .cloned()
            .collect();
        matched.sort_by_key(|c| c.scheduled_at);
        Ok(matched)
    }
}
