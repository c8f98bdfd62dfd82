//! PostgreSQL implementation of CallRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::booking::{Call, CallDuration, CallStatus};
use crate::domain::foundation::{
    CallId, DomainError, ErrorCode, Money, Timestamp, UserId,
};
use crate::domain::scheduling::UtcInterval;
use crate::ports::CallRepository;

/// PostgreSQL implementation of the CallRepository port.
pub struct PostgresCallRepository {
    pool: PgPool,
}

impl PostgresCallRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a call.
#[derive(Debug, sqlx::FromRow)]
struct CallRow {
    id: Uuid,
    patient_id: Uuid,
    mentor_id: Uuid,
    scheduled_at: DateTime<Utc>,
    duration_minutes: i32,
    price_cents: i64,
    platform_fee_cents: i64,
    mentor_payout_cents: i64,
    status: String,
    room_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CallRow> for Call {
    type Error = DomainError;

    fn try_from(row: CallRow) -> Result<Self, Self::Error> {
        Ok(Call {
            id: CallId::from_uuid(row.id),
            patient_id: UserId::from_uuid(row.patient_id),
            mentor_id: UserId::from_uuid(row.mentor_id),
            scheduled_at: Timestamp::from_datetime(row.scheduled_at),
            duration: CallDuration::try_from_minutes(row.duration_minutes as u32)
                .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?,
            price: Money::from_cents(row.price_cents),
            platform_fee: Money::from_cents(row.platform_fee_cents),
            mentor_payout: Money::from_cents(row.mentor_payout_cents),
            status: parse_status(&row.status)?,
            room_url: row.room_url,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<CallStatus, DomainError> {
    match s {
        "requested" => Ok(CallStatus::Requested),
        "confirmed" => Ok(CallStatus::Confirmed),
        "completed" => Ok(CallStatus::Completed),
        "cancelled" => Ok(CallStatus::Cancelled),
        "no_show" => Ok(CallStatus::NoShow),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid call status value: {}", s),
        )),
    }
}

fn status_to_string(status: &CallStatus) -> &'static str {
    match status {
        CallStatus::Requested => "requested",
        CallStatus::Confirmed => "confirmed",
        CallStatus::Completed => "completed",
        CallStatus::Cancelled => "cancelled",
        CallStatus::NoShow => "no_show",
    }
}

fn db_err(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl CallRepository for PostgresCallRepository {
    async fn save(&self, call: &Call) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO calls (
                id, patient_id, mentor_id, scheduled_at, duration_minutes,
                price_cents, platform_fee_cents, mentor_payout_cents,
                status, room_url, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(call.id.as_uuid())
        .bind(call.patient_id.as_uuid())
        .bind(call.mentor_id.as_uuid())
        .bind(call.scheduled_at.as_datetime())
        .bind(call.duration.minutes() as i32)
        .bind(call.price.cents())
        .bind(call.platform_fee.cents())
        .bind(call.mentor_payout.cents())
        .bind(status_to_string(&call.status))
        .bind(&call.room_url)
        .bind(call.created_at.as_datetime())
        .bind(call.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to save call", e))?;
        Ok(())
    }

    async fn update(&self, call: &Call) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE calls SET
                scheduled_at = $2, status = $3, room_url = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(call.id.as_uuid())
        .bind(call.scheduled_at.as_datetime())
        .bind(status_to_string(&call.status))
        .bind(&call.room_url)
        .bind(call.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to update call", e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &CallId) -> Result<Option<Call>, DomainError> {
        let row = sqlx::query_as::<_, CallRow>("SELECT * FROM calls WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("Failed to fetch call", e))?;
        row.map(Call::try_from).transpose()
    }

    async fn find_occupying_for_mentor(
        &self,
        mentor_id: &UserId,
        interval: &UtcInterval,
    ) -> Result<Vec<Call>, DomainError> {
        // Half-open overlap against the concrete occupied interval.
        let rows = sqlx::query_as::<_, CallRow>(
            r#"
            SELECT * FROM calls
            WHERE mentor_id = $1
              AND status IN ('requested', 'confirmed')
              AND scheduled_at < $3
              AND scheduled_at + make_interval(mins => duration_minutes) > $2
            ORDER BY scheduled_at
            "#,
        )
        .bind(mentor_id.as_uuid())
        .bind(interval.start.as_datetime())
        .bind(interval.end.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to query occupying calls", e))?;

        rows.into_iter().map(Call::try_from).collect()
    }
}
