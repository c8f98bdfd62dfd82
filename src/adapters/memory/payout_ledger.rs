//! In-memory PayoutLedger for tests and local development.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::payments::PayoutLedgerEntry;
use crate::ports::PayoutLedger;

/// Mutex-guarded append-only ledger.
#[derive(Default)]
pub struct InMemoryPayoutLedger {
    entries: Mutex<Vec<PayoutLedgerEntry>>,
}

impl InMemoryPayoutLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in insertion order, for assertions.
    pub fn all(&self) -> Vec<PayoutLedgerEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl PayoutLedger for InMemoryPayoutLedger {
    async fn record(&self, entry: &PayoutLedgerEntry) -> Result<(), DomainError> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn find_by_mentor(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<PayoutLedgerEntry>, DomainError> {
        let mut matched: Vec<PayoutLedgerEntry> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.mentor_id == *mentor_id)
            .cloned()
            .collect();
        matched.reverse();
        Ok(matched)
    }
}
