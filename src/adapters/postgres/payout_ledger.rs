//! PostgreSQL implementation of PayoutLedger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    CallId, DomainError, ErrorCode, GroupSessionId, Money, PayoutId, RecordingId, SeriesId,
    Timestamp, UserId,
};
use crate::domain::payments::{PayoutLedgerEntry, PayoutOutcome, PayoutSource};
use crate::ports::PayoutLedger;

/// PostgreSQL implementation of the PayoutLedger port.
pub struct PostgresPayoutLedger {
    pool: PgPool,
}

impl PostgresPayoutLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a ledger entry.
#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    id: Uuid,
    mentor_id: Uuid,
    source_kind: String,
    source_id: Uuid,
    gross_cents: i64,
    payout_cents: i64,
    transfer_reference: Option<String>,
    transfer_error: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for PayoutLedgerEntry {
    type Error = DomainError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let source = parse_source(&row.source_kind, row.source_id)?;
        let outcome = match (row.transfer_reference, row.transfer_error) {
            (Some(reference), _) => PayoutOutcome::Transferred {
                transfer_reference: reference,
            },
            (None, Some(error)) => PayoutOutcome::TransferFailed { error },
            (None, None) => {
                return Err(DomainError::new(
                    ErrorCode::DatabaseError,
                    "Ledger row has neither transfer reference nor error",
                ))
            }
        };
        Ok(PayoutLedgerEntry {
            id: PayoutId::from_uuid(row.id),
            mentor_id: UserId::from_uuid(row.mentor_id),
            source,
            gross: Money::from_cents(row.gross_cents),
            payout: Money::from_cents(row.payout_cents),
            outcome,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn parse_source(kind: &str, id: Uuid) -> Result<PayoutSource, DomainError> {
    match kind {
        "call" => Ok(PayoutSource::Call {
            id: CallId::from_uuid(id),
        }),
        "group_session" => Ok(PayoutSource::GroupSession {
            id: GroupSessionId::from_uuid(id),
        }),
        "recording" => Ok(PayoutSource::Recording {
            id: RecordingId::from_uuid(id),
        }),
        "series" => Ok(PayoutSource::Series {
            id: SeriesId::from_uuid(id),
        }),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid payout source kind: {}", kind),
        )),
    }
}

fn source_parts(source: &PayoutSource) -> (&'static str, Uuid) {
    match source {
        PayoutSource::Call { id } => ("call", *id.as_uuid()),
        PayoutSource::GroupSession { id } => ("group_session", *id.as_uuid()),
        PayoutSource::Recording { id } => ("recording", *id.as_uuid()),
        PayoutSource::Series { id } => ("series", *id.as_uuid()),
    }
}

fn db_err(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl PayoutLedger for PostgresPayoutLedger {
    async fn record(&self, entry: &PayoutLedgerEntry) -> Result<(), DomainError> {
        let (source_kind, source_id) = source_parts(&entry.source);
        let (reference, error) = match &entry.outcome {
            PayoutOutcome::Transferred { transfer_reference } => {
                (Some(transfer_reference.clone()), None)
            }
            PayoutOutcome::TransferFailed { error } => (None, Some(error.clone())),
        };

        sqlx::query(
            r#"
            INSERT INTO payout_ledger (
                id, mentor_id, source_kind, source_id, gross_cents,
                payout_cents, transfer_reference, transfer_error, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.mentor_id.as_uuid())
        .bind(source_kind)
        .bind(source_id)
        .bind(entry.gross.cents())
        .bind(entry.payout.cents())
        .bind(reference)
        .bind(error)
        .bind(entry.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to record payout ledger entry", e))?;
        Ok(())
    }

    async fn find_by_mentor(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<PayoutLedgerEntry>, DomainError> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            "SELECT * FROM payout_ledger WHERE mentor_id = $1 ORDER BY created_at DESC",
        )
        .bind(mentor_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to query payout ledger", e))?;
        rows.into_iter().map(PayoutLedgerEntry::try_from).collect()
    }
}
