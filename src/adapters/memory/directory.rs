//! In-memory DirectoryReader and CatalogReader for tests and local
//! development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, RecordingId, SeriesId, UserId};
use crate::ports::{CatalogReader, Contact, DirectoryReader, PayoutAccount};

/// Mutex-guarded user directory.
#[derive(Default)]
pub struct InMemoryDirectory {
    contacts: Mutex<HashMap<UserId, Contact>>,
    payout_accounts: Mutex<HashMap<UserId, PayoutAccount>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a contact, generating a deterministic email from the name.
    pub fn add_contact(&self, user_id: UserId, name: &str) {
        let email = format!("{}@example.test", name.to_lowercase().replace(' ', "."));
        self.contacts.lock().unwrap().insert(
            user_id,
            Contact {
                user_id,
                email,
                name: name.to_string(),
            },
        );
    }

    /// Sets a user's payout destination.
    pub fn set_payout_account(&self, user_id: UserId, account: PayoutAccount) {
        self.payout_accounts.lock().unwrap().insert(user_id, account);
    }
}

#[async_trait]
impl DirectoryReader for InMemoryDirectory {
    async fn contact(&self, user_id: &UserId) -> Result<Option<Contact>, DomainError> {
        Ok(self.contacts.lock().unwrap().get(user_id).cloned())
    }

    async fn payout_account(
        &self,
        user_id: &UserId,
    ) -> Result<Option<PayoutAccount>, DomainError> {
        Ok(self.payout_accounts.lock().unwrap().get(user_id).cloned())
    }
}

/// Mutex-guarded recording catalog.
#[derive(Default)]
pub struct InMemoryCatalog {
    series: Mutex<HashMap<SeriesId, Vec<RecordingId>>>,
    recording_sellers: Mutex<HashMap<RecordingId, UserId>>,
    series_sellers: Mutex<HashMap<SeriesId, UserId>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a recording with its seller.
    pub fn add_recording(&self, recording_id: RecordingId, seller: UserId) {
        self.recording_sellers
            .lock()
            .unwrap()
            .insert(recording_id, seller);
    }

    /// Registers a series, its seller, and the recordings it bundles.
    pub fn add_series(&self, series_id: SeriesId, seller: UserId, recordings: Vec<RecordingId>) {
        self.series.lock().unwrap().insert(series_id, recordings);
        self.series_sellers.lock().unwrap().insert(series_id, seller);
    }
}

#[async_trait]
impl CatalogReader for InMemoryCatalog {
    async fn series_recordings(
        &self,
        series_id: &SeriesId,
    ) -> Result<Vec<RecordingId>, DomainError> {
        Ok(self
            .series
            .lock()
            .unwrap()
            .get(series_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn recording_seller(
        &self,
        recording_id: &RecordingId,
    ) -> Result<Option<UserId>, DomainError> {
        Ok(self
            .recording_sellers
            .lock()
            .unwrap()
            .get(recording_id)
            .copied())
    }

    async fn series_seller(&self, series_id: &SeriesId) -> Result<Option<UserId>, DomainError> {
        Ok(self.series_sellers.lock().unwrap().get(series_id).copied())
    }
}
