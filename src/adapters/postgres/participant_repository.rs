//! PostgreSQL implementation of ParticipantRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, GroupSessionId, Money, ParticipantId, Timestamp, UserId,
};
use crate::domain::sessions::{GroupSessionParticipant, ParticipantStatus};
use crate::ports::ParticipantRepository;

/// PostgreSQL implementation of the ParticipantRepository port.
pub struct PostgresParticipantRepository {
    pool: PgPool,
}

impl PostgresParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a participant registration.
#[derive(Debug, sqlx::FromRow)]
struct ParticipantRow {
    id: Uuid,
    session_id: Uuid,
    user_id: Uuid,
    amount_paid_cents: i64,
    payment_reference: Option<String>,
    status: String,
    registered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ParticipantRow> for GroupSessionParticipant {
    type Error = DomainError;

    fn try_from(row: ParticipantRow) -> Result<Self, Self::Error> {
        Ok(GroupSessionParticipant {
            id: ParticipantId::from_uuid(row.id),
            session_id: GroupSessionId::from_uuid(row.session_id),
            user_id: UserId::from_uuid(row.user_id),
            amount_paid: Money::from_cents(row.amount_paid_cents),
            payment_reference: row.payment_reference,
            status: parse_status(&row.status)?,
            registered_at: Timestamp::from_datetime(row.registered_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<ParticipantStatus, DomainError> {
    match s {
        "registered" => Ok(ParticipantStatus::Registered),
        "attended" => Ok(ParticipantStatus::Attended),
        "cancelled" => Ok(ParticipantStatus::Cancelled),
        "refunded" => Ok(ParticipantStatus::Refunded),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid participant status value: {}", s),
        )),
    }
}

fn status_to_string(status: &ParticipantStatus) -> &'static str {
    match status {
        ParticipantStatus::Registered => "registered",
        ParticipantStatus::Attended => "attended",
        ParticipantStatus::Cancelled => "cancelled",
        ParticipantStatus::Refunded => "refunded",
    }
}

fn db_err(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl ParticipantRepository for PostgresParticipantRepository {
    async fn save(&self, participant: &GroupSessionParticipant) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO group_session_participants (
                id, session_id, user_id, amount_paid_cents, payment_reference,
                status, registered_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(participant.id.as_uuid())
        .bind(participant.session_id.as_uuid())
        .bind(participant.user_id.as_uuid())
        .bind(participant.amount_paid.cents())
        .bind(&participant.payment_reference)
        .bind(status_to_string(&participant.status))
        .bind(participant.registered_at.as_datetime())
        .bind(participant.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to save participant", e))?;
        Ok(())
    }

    async fn update(&self, participant: &GroupSessionParticipant) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE group_session_participants SET status = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(participant.id.as_uuid())
        .bind(status_to_string(&participant.status))
        .bind(participant.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to update participant", e))?;
        Ok(())
    }

    async fn find_by_session(
        &self,
        session_id: &GroupSessionId,
    ) -> Result<Vec<GroupSessionParticipant>, DomainError> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            "SELECT * FROM group_session_participants WHERE session_id = $1 ORDER BY registered_at",
        )
        .bind(session_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to query participants", e))?;
        rows.into_iter()
            .map(GroupSessionParticipant::try_from)
            .collect()
    }

    async fn count_registered(&self, session_id: &GroupSessionId) -> Result<u32, DomainError> {
        let row = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM group_session_participants \
             WHERE session_id = $1 AND status = 'registered'",
        )
        .bind(session_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("Failed to count registered participants", e))?;
        Ok(row.0 as u32)
    }
}
