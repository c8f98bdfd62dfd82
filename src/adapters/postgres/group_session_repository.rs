//! PostgreSQL implementation of GroupSessionRepository.
//!
//! The lifecycle pass queries express "time window AND unset marker"
//! directly in SQL, so a stamped row can never come back from a pass query.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, GroupSessionId, Money, Timestamp, UserId,
};
use crate::domain::scheduling::UtcInterval;
use crate::domain::sessions::{GroupSession, GroupSessionStatus};
use crate::ports::GroupSessionRepository;

/// PostgreSQL implementation of the GroupSessionRepository port.
pub struct PostgresGroupSessionRepository {
    pool: PgPool,
}

impl PostgresGroupSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_where(
        &self,
        condition: &str,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<GroupSession>, DomainError> {
        let query = format!(
            "SELECT * FROM group_sessions WHERE {} AND scheduled_at >= $1 AND scheduled_at < $2 \
             ORDER BY scheduled_at",
            condition
        );
        let rows = sqlx::query_as::<_, GroupSessionRow>(&query)
            .bind(from.as_datetime())
            .bind(to.as_datetime())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_err("Failed to query group sessions", e))?;
        rows.into_iter().map(GroupSession::try_from).collect()
    }
}

/// Database row representation of a group session.
#[derive(Debug, sqlx::FromRow)]
struct GroupSessionRow {
    id: Uuid,
    mentor_id: Uuid,
    title: String,
    procedure_tag: String,
    scheduled_at: DateTime<Utc>,
    duration_minutes: i32,
    capacity: i32,
    min_attendees: i32,
    price_per_seat_cents: i64,
    status: String,
    minimum_checked_at: Option<DateTime<Utc>>,
    day_reminder_sent_at: Option<DateTime<Utc>>,
    hour_reminder_sent_at: Option<DateTime<Utc>>,
    room_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<GroupSessionRow> for GroupSession {
    type Error = DomainError;

    fn try_from(row: GroupSessionRow) -> Result<Self, Self::Error> {
        Ok(GroupSession {
            id: GroupSessionId::from_uuid(row.id),
            mentor_id: UserId::from_uuid(row.mentor_id),
            title: row.title,
            procedure_tag: row.procedure_tag,
            scheduled_at: Timestamp::from_datetime(row.scheduled_at),
            duration_minutes: row.duration_minutes as u32,
            capacity: row.capacity as u32,
            min_attendees: row.min_attendees as u32,
            price_per_seat: Money::from_cents(row.price_per_seat_cents),
            status: parse_status(&row.status)?,
            minimum_checked_at: row.minimum_checked_at.map(Timestamp::from_datetime),
            day_reminder_sent_at: row.day_reminder_sent_at.map(Timestamp::from_datetime),
            hour_reminder_sent_at: row.hour_reminder_sent_at.map(Timestamp::from_datetime),
            room_url: row.room_url,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<GroupSessionStatus, DomainError> {
    match s {
        "scheduled" => Ok(GroupSessionStatus::Scheduled),
        "confirmed" => Ok(GroupSessionStatus::Confirmed),
        "cancelled" => Ok(GroupSessionStatus::Cancelled),
        "completed" => Ok(GroupSessionStatus::Completed),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid group session status value: {}", s),
        )),
    }
}

fn status_to_string(status: &GroupSessionStatus) -> &'static str {
    match status {
        GroupSessionStatus::Scheduled => "scheduled",
        GroupSessionStatus::Confirmed => "confirmed",
        GroupSessionStatus::Cancelled => "cancelled",
        GroupSessionStatus::Completed => "completed",
    }
}

fn db_err(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl GroupSessionRepository for PostgresGroupSessionRepository {
    async fn save(&self, session: &GroupSession) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO group_sessions (
                id, mentor_id, title, procedure_tag, scheduled_at,
                duration_minutes, capacity, min_attendees, price_per_seat_cents,
                status, minimum_checked_at, day_reminder_sent_at,
                hour_reminder_sent_at, room_url, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(session.mentor_id.as_uuid())
        .bind(&session.title)
        .bind(&session.procedure_tag)
        .bind(session.scheduled_at.as_datetime())
        .bind(session.duration_minutes as i32)
        .bind(session.capacity as i32)
        .bind(session.min_attendees as i32)
        .bind(session.price_per_seat.cents())
        .bind(status_to_string(&session.status))
        .bind(session.minimum_checked_at.as_ref().map(|t| *t.as_datetime()))
        .bind(session.day_reminder_sent_at.as_ref().map(|t| *t.as_datetime()))
        .bind(session.hour_reminder_sent_at.as_ref().map(|t| *t.as_datetime()))
        .bind(&session.room_url)
        .bind(session.created_at.as_datetime())
        .bind(session.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to save group session", e))?;
        Ok(())
    }

    async fn update(&self, session: &GroupSession) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE group_sessions SET
                status = $2,
                minimum_checked_at = $3,
                day_reminder_sent_at = $4,
                hour_reminder_sent_at = $5,
                room_url = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(status_to_string(&session.status))
        .bind(session.minimum_checked_at.as_ref().map(|t| *t.as_datetime()))
        .bind(session.day_reminder_sent_at.as_ref().map(|t| *t.as_datetime()))
        .bind(session.hour_reminder_sent_at.as_ref().map(|t| *t.as_datetime()))
        .bind(&session.room_url)
        .bind(session.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to update group session", e))?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &GroupSessionId,
    ) -> Result<Option<GroupSession>, DomainError> {
        let row =
            sqlx::query_as::<_, GroupSessionRow>("SELECT * FROM group_sessions WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_err("Failed to fetch group session", e))?;
        row.map(GroupSession::try_from).transpose()
    }

    async fn find_needing_minimum_check(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<GroupSession>, DomainError> {
        self.fetch_where(
            "status = 'scheduled' AND minimum_checked_at IS NULL",
            from,
            to,
        )
        .await
    }

    async fn find_needing_day_reminder(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<GroupSession>, DomainError> {
        self.fetch_where(
            "status = 'confirmed' AND room_url IS NOT NULL AND day_reminder_sent_at IS NULL",
            from,
            to,
        )
        .await
    }

    async fn find_needing_hour_reminder(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<GroupSession>, DomainError> {
        self.fetch_where(
            "status = 'confirmed' AND room_url IS NOT NULL AND hour_reminder_sent_at IS NULL",
            from,
            to,
        )
        .await
    }

    async fn find_confirmed(&self) -> Result<Vec<GroupSession>, DomainError> {
        let rows = sqlx::query_as::<_, GroupSessionRow>(
            "SELECT * FROM group_sessions WHERE status = 'confirmed' ORDER BY scheduled_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to query confirmed sessions", e))?;
        rows.into_iter().map(GroupSession::try_from).collect()
    }

    async fn find_occupying_for_mentor(
        &self,
        mentor_id: &UserId,
        interval: &UtcInterval,
    ) -> Result<Vec<GroupSession>, DomainError> {
        let rows = sqlx::query_as::<_, GroupSessionRow>(
            r#"
            SELECT * FROM group_sessions
            WHERE mentor_id = $1
              AND status IN ('scheduled', 'confirmed')
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
        .map_err(|e| db_err("Failed to query occupying sessions", e))?;

        rows.into_iter().map(GroupSession::try_from).collect()
    }
}
