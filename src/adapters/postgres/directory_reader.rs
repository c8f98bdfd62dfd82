//! PostgreSQL implementations of DirectoryReader and CatalogReader.
//!
//! Read-only views over the user and content tables owned by the CRUD
//! surfaces outside this subsystem.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, RecordingId, SeriesId, UserId};
use crate::ports::{CatalogReader, Contact, DirectoryReader, PayoutAccount};

/// PostgreSQL implementation of the DirectoryReader port.
pub struct PostgresDirectoryReader {
    pool: PgPool,
}

impl PostgresDirectoryReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    id: Uuid,
    email: String,
    display_name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct PayoutAccountRow {
    payout_account_reference: Option<String>,
    payout_account_verified: bool,
}

fn db_err(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl DirectoryReader for PostgresDirectoryReader {
    async fn contact(&self, user_id: &UserId) -> Result<Option<Contact>, DomainError> {
        let row = sqlx::query_as::<_, ContactRow>(
            "SELECT id, email, display_name FROM users WHERE id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to fetch contact", e))?;

        Ok(row.map(|r| Contact {
            user_id: UserId::from_uuid(r.id),
            email: r.email,
            name: r.display_name,
        }))
    }

    async fn payout_account(
        &self,
        user_id: &UserId,
    ) -> Result<Option<PayoutAccount>, DomainError> {
        let row = sqlx::query_as::<_, PayoutAccountRow>(
            "SELECT payout_account_reference, payout_account_verified \
             FROM users WHERE id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to fetch payout account", e))?;

        Ok(row.and_then(|r| {
            r.payout_account_reference.map(|reference| PayoutAccount {
                account_reference: reference,
                verified: r.payout_account_verified,
            })
        }))
    }
}

/// PostgreSQL implementation of the CatalogReader port.
pub struct PostgresCatalogReader {
    pool: PgPool,
}

impl PostgresCatalogReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogReader for PostgresCatalogReader {
    async fn series_recordings(
        &self,
        series_id: &SeriesId,
    ) -> Result<Vec<RecordingId>, DomainError> {
        let rows = sqlx::query_as::<_, (Uuid,)>(
            "SELECT recording_id FROM series_recordings WHERE series_id = $1 ORDER BY position",
        )
        .bind(series_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to query series recordings", e))?;
        Ok(rows
            .into_iter()
            .map(|r| RecordingId::from_uuid(r.0))
            .collect())
    }

    async fn recording_seller(
        &self,
        recording_id: &RecordingId,
    ) -> Result<Option<UserId>, DomainError> {
        let row = sqlx::query_as::<_, (Uuid,)>(
            "SELECT seller_id FROM recordings WHERE id = $1",
        )
        .bind(recording_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to fetch recording seller", e))?;
        Ok(row.map(|r| UserId::from_uuid(r.0)))
    }

    async fn series_seller(&self, series_id: &SeriesId) -> Result<Option<UserId>, DomainError> {
        let row = sqlx::query_as::<_, (Uuid,)>("SELECT seller_id FROM series WHERE id = $1")
            .bind(series_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("Failed to fetch series seller", e))?;
        Ok(row.map(|r| UserId::from_uuid(r.0)))
    }
}
