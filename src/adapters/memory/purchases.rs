//! In-memory PurchaseRepository for tests and local development.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::payments::{AccessGrant, AccessTarget, PurchaseRecord};
use crate::ports::PurchaseRepository;

/// Mutex-guarded purchase and grant store.
#[derive(Default)]
pub struct InMemoryPurchaseRepository {
    by_event: Mutex<HashMap<String, PurchaseRecord>>,
    grants: Mutex<HashSet<(UserId, AccessTarget)>>,
}

impl InMemoryPurchaseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All purchase records, for assertions.
    pub fn all(&self) -> Vec<PurchaseRecord> {
        self.by_event.lock().unwrap().values().cloned().collect()
    }

    /// Number of stored grants, for assertions.
    pub fn grant_count(&self) -> usize {
        self.grants.lock().unwrap().len()
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryPurchaseRepository {
    async fn save(&self, record: &PurchaseRecord) -> Result<(), DomainError> {
        let mut by_event = self.by_event.lock().unwrap();
        if by_event.contains_key(&record.event_id) {
            return Err(DomainError::new(
                ErrorCode::AlreadyProcessed,
                format!("Purchase for event {} already recorded", record.event_id),
            ));
        }
        by_event.insert(record.event_id.clone(), record.clone());
        Ok(())
    }

    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<PurchaseRecord>, DomainError> {
        Ok(self.by_event.lock().unwrap().get(event_id).cloned())
    }

    async fn grant_access(&self, grant: &AccessGrant) -> Result<(), DomainError> {
        // Upsert semantics: duplicates are silently absorbed.
        self.grants
            .lock()
            .unwrap()
            .insert((grant.user_id, grant.target));
        Ok(())
    }

    async fn has_grant(
        &self,
        user_id: &UserId,
        target: &AccessTarget,
    ) -> Result<bool, DomainError> {
        Ok(self.grants.lock().unwrap().contains(&(*user_id, *target)))
    }
}
