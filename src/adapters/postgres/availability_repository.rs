//! PostgreSQL implementation of AvailabilityRepository.
//!
//! Booked intervals are derived with a union over live calls and group
//! sessions; they are never stored separately.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{CallId, DomainError, ErrorCode, GroupSessionId, Timestamp, UserId};
use crate::domain::scheduling::{AvailabilityWindow, BookedInterval, UtcInterval};
use crate::ports::AvailabilityRepository;

/// PostgreSQL implementation of the AvailabilityRepository port.
pub struct PostgresAvailabilityRepository {
    pool: PgPool,
}

impl PostgresAvailabilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an availability window.
#[derive(Debug, sqlx::FromRow)]
struct WindowRow {
    mentor_id: Uuid,
    day_of_week: i16,
    start_time: NaiveTime,
    end_time: NaiveTime,
    timezone: String,
}

impl TryFrom<WindowRow> for AvailabilityWindow {
    type Error = DomainError;

    fn try_from(row: WindowRow) -> Result<Self, Self::Error> {
        let timezone: chrono_tz::Tz = row.timezone.parse().map_err(|_| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid timezone value: {}", row.timezone),
            )
        })?;
        AvailabilityWindow::new(
            UserId::from_uuid(row.mentor_id),
            row.day_of_week as u8,
            row.start_time,
            row.end_time,
            timezone,
        )
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))
    }
}

/// Row of the booked-interval union query.
#[derive(Debug, sqlx::FromRow)]
struct BookedRow {
    source_kind: String,
    source_id: Uuid,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
}

fn db_err(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl AvailabilityRepository for PostgresAvailabilityRepository {
    async fn windows_for_mentor(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<AvailabilityWindow>, DomainError> {
        let rows = sqlx::query_as::<_, WindowRow>(
            "SELECT mentor_id, day_of_week, start_time, end_time, timezone \
             FROM availability_windows WHERE mentor_id = $1 \
             ORDER BY day_of_week, start_time",
        )
        .bind(mentor_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to query availability windows", e))?;
        rows.into_iter().map(AvailabilityWindow::try_from).collect()
    }

    async fn blocked_dates_for_mentor(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<NaiveDate>, DomainError> {
        let rows = sqlx::query_as::<_, (NaiveDate,)>(
            "SELECT blocked_on FROM blocked_dates WHERE mentor_id = $1 ORDER BY blocked_on",
        )
        .bind(mentor_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to query blocked dates", e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn booked_intervals_for_mentor(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<BookedInterval>, DomainError> {
        let rows = sqlx::query_as::<_, BookedRow>(
            r#"
            SELECT 'call' AS source_kind, id AS source_id,
                   scheduled_at AS starts_at,
                   scheduled_at + make_interval(mins => duration_minutes) AS ends_at
            FROM calls
            WHERE mentor_id = $1 AND status IN ('requested', 'confirmed')
            UNION ALL
            SELECT 'group_session' AS source_kind, id AS source_id,
                   scheduled_at AS starts_at,
                   scheduled_at + make_interval(mins => duration_minutes) AS ends_at
            FROM group_sessions
            WHERE mentor_id = $1 AND status IN ('scheduled', 'confirmed')
            ORDER BY starts_at
            "#,
        )
        .bind(mentor_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to query booked intervals", e))?;

        rows.into_iter()
            .map(|row| {
                let interval = UtcInterval::new(
                    Timestamp::from_datetime(row.starts_at),
                    Timestamp::from_datetime(row.ends_at),
                )
                .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?;
                Ok(match row.source_kind.as_str() {
                    "call" => BookedInterval::from_call(CallId::from_uuid(row.source_id), interval),
                    _ => BookedInterval::from_group_session(
                        GroupSessionId::from_uuid(row.source_id),
                        interval,
                    ),
                })
            })
            .collect()
    }
}
