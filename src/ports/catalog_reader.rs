//! CatalogReader port - read access to the recording catalog.
//!
//! Recordings and series are content-CRUD entities outside this subsystem;
//! the payment router needs their composition (series fan-out) and sellers
//! (payout destination lookup).

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, RecordingId, SeriesId, UserId};

/// Port for recording catalog lookups.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// The recordings a series bundles.
    async fn series_recordings(
        &self,
        series_id: &SeriesId,
    ) -> Result<Vec<RecordingId>, DomainError>;

    /// Seller (owner) of a recording.
    async fn recording_seller(
        &self,
        recording_id: &RecordingId,
    ) -> Result<Option<UserId>, DomainError>;

    /// Seller (owner) of a series.
    async fn series_seller(&self, series_id: &SeriesId) -> Result<Option<UserId>, DomainError>;
}
