//! PostgreSQL implementation of PurchaseRepository.
//!
//! Purchase rows are unique per processor event id; access grants use
//! `ON CONFLICT DO NOTHING` so duplicate grants are silently absorbed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    CallId, DomainError, ErrorCode, GroupSessionId, Money, PurchaseId, RecordingId, SeriesId,
    Timestamp, UserId,
};
use crate::domain::payments::{AccessGrant, AccessTarget, PurchaseRecord, PurchaseTarget};
use crate::ports::PurchaseRepository;

/// PostgreSQL implementation of the PurchaseRepository port.
pub struct PostgresPurchaseRepository {
    pool: PgPool,
}

impl PostgresPurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a purchase.
#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    event_id: String,
    user_id: Uuid,
    target_kind: String,
    target_id: Uuid,
    amount_cents: i64,
    currency: String,
    payment_reference: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for PurchaseRecord {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let target = parse_target(&row.target_kind, row.target_id)?;
        Ok(PurchaseRecord {
            id: PurchaseId::from_uuid(row.id),
            event_id: row.event_id,
            user_id: UserId::from_uuid(row.user_id),
            target,
            amount: Money::from_cents(row.amount_cents),
            currency: row.currency,
            payment_reference: row.payment_reference,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn parse_target(kind: &str, id: Uuid) -> Result<PurchaseTarget, DomainError> {
    match kind {
        "recording" => Ok(PurchaseTarget::Recording {
            id: RecordingId::from_uuid(id),
        }),
        "series" => Ok(PurchaseTarget::Series {
            id: SeriesId::from_uuid(id),
        }),
        "call" => Ok(PurchaseTarget::Call {
            id: CallId::from_uuid(id),
        }),
        "group_session" => Ok(PurchaseTarget::GroupSession {
            id: GroupSessionId::from_uuid(id),
        }),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid purchase target kind: {}", kind),
        )),
    }
}

fn target_parts(target: &PurchaseTarget) -> (&'static str, Uuid) {
    match target {
        PurchaseTarget::Recording { id } => ("recording", *id.as_uuid()),
        PurchaseTarget::Series { id } => ("series", *id.as_uuid()),
        PurchaseTarget::Call { id } => ("call", *id.as_uuid()),
        PurchaseTarget::GroupSession { id } => ("group_session", *id.as_uuid()),
    }
}

fn grant_parts(target: &AccessTarget) -> (&'static str, Uuid) {
    match target {
        AccessTarget::Recording { id } => ("recording", *id.as_uuid()),
        AccessTarget::Series { id } => ("series", *id.as_uuid()),
    }
}

fn db_err(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

#[async_trait]
impl PurchaseRepository for PostgresPurchaseRepository {
    async fn save(&self, record: &PurchaseRecord) -> Result<(), DomainError> {
        let (target_kind, target_id) = target_parts(&record.target);
        let result = sqlx::query(
            r#"
            INSERT INTO purchases (
                id, event_id, user_id, target_kind, target_id,
                amount_cents, currency, payment_reference, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.event_id)
        .bind(record.user_id.as_uuid())
        .bind(target_kind)
        .bind(target_id)
        .bind(record.amount.cents())
        .bind(&record.currency)
        .bind(&record.payment_reference)
        .bind(record.created_at.as_datetime())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(DomainError::new(
                ErrorCode::AlreadyProcessed,
                format!("Purchase for event {} already recorded", record.event_id),
            )),
            Err(e) => Err(db_err("Failed to save purchase", e)),
        }
    }

    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<PurchaseRecord>, DomainError> {
        let row = sqlx::query_as::<_, PurchaseRow>("SELECT * FROM purchases WHERE event_id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("Failed to fetch purchase", e))?;
        row.map(PurchaseRecord::try_from).transpose()
    }

    async fn grant_access(&self, grant: &AccessGrant) -> Result<(), DomainError> {
        let (target_kind, target_id) = grant_parts(&grant.target);
        sqlx::query(
            r#"
            INSERT INTO access_grants (user_id, target_kind, target_id, granted_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, target_kind, target_id) DO NOTHING
            "#,
        )
        .bind(grant.user_id.as_uuid())
        .bind(target_kind)
        .bind(target_id)
        .bind(grant.granted_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to grant access", e))?;
        Ok(())
    }

    async fn has_grant(
        &self,
        user_id: &UserId,
        target: &AccessTarget,
    ) -> Result<bool, DomainError> {
        let (target_kind, target_id) = grant_parts(target);
        let row = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM access_grants \
             WHERE user_id = $1 AND target_kind = $2 AND target_id = $3",
        )
        .bind(user_id.as_uuid())
        .bind(target_kind)
        .bind(target_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("Failed to check access grant", e))?;
        Ok(row.0 > 0)
    }
}
