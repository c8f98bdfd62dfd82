//! CreateGroupSessionHandler - mentor-initiated session creation.
//!
//! Validates the creation policy (duration set, 24-hour lead, capacity and
//! price bounds) and rejects proposals whose buffered interval overlaps any
//! live call or group session of the same mentor. Nothing is partially
//! applied: a rejected command writes nothing.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, GroupSessionId, Money, Timestamp, UserId, ValidationError};
use crate::domain::sessions::GroupSession;
use crate::ports::{CallRepository, Clock, GroupSessionRepository};

/// Command to create a group session.
#[derive(Debug, Clone)]
pub struct CreateGroupSessionCommand {
    pub mentor_id: UserId,
    pub title: String,
    pub procedure_tag: String,
    pub scheduled_at: Timestamp,
    pub duration_minutes: u32,
    pub capacity: u32,
    pub min_attendees: u32,
    pub price_per_seat: Money,
}

/// Error type for session creation.
#[derive(Debug, Clone)]
pub enum CreateGroupSessionError {
    /// Policy validation failed; the reason names the field.
    Validation(ValidationError),
    /// The buffered interval overlaps an existing booking.
    Conflict { detail: String },
    /// Other domain error.
    Domain(DomainError),
}

impl std::fmt::Display for CreateGroupSessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateGroupSessionError::Validation(err) => write!(f, "{}", err),
            CreateGroupSessionError::Conflict { detail } => {
                write!(f, "Scheduling conflict: {}", detail)
            }
            CreateGroupSessionError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CreateGroupSessionError {}

impl From<DomainError> for CreateGroupSessionError {
    fn from(err: DomainError) -> Self {
        CreateGroupSessionError::Domain(err)
    }
}

/// Handler for session creation.
pub struct CreateGroupSessionHandler {
    sessions: Arc<dyn GroupSessionRepository>,
    calls: Arc<dyn CallRepository>,
    clock: Arc<dyn Clock>,
}

impl CreateGroupSessionHandler {
    pub fn new(
        sessions: Arc<dyn GroupSessionRepository>,
        calls: Arc<dyn CallRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            calls,
            clock,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateGroupSessionCommand,
    ) -> Result<GroupSession, CreateGroupSessionError> {
        let now = self.clock.now();

        // 1. Policy validation via the aggregate constructor.
        let session = GroupSession::create(
            GroupSessionId::new(),
            cmd.mentor_id,
            cmd.title,
            cmd.procedure_tag,
            cmd.scheduled_at,
            cmd.duration_minutes,
            cmd.capacity,
            cmd.min_attendees,
            cmd.price_per_seat,
            now,
        )
        .map_err(CreateGroupSessionError::Validation)?;

        // 2. Conflict check against the buffered interval (2h both sides).
        let window = session.conflict_window();

        let conflicting_calls = self
            .calls
            .find_occupying_for_mentor(&cmd.mentor_id, &window)
            .await?;
        if let Some(call) = conflicting_calls.first() {
            return Err(CreateGroupSessionError::Conflict {
                detail: format!("call {} at {:?}", call.id, call.scheduled_at),
            });
        }

        let conflicting_sessions = self
            .sessions
            .find_occupying_for_mentor(&cmd.mentor_id, &window)
            .await?;
        if let Some(other) = conflicting_sessions.first() {
            return Err(CreateGroupSessionError::Conflict {
                detail: format!("group session {} at {:?}", other.id, other.scheduled_at),
            });
        }

        // 3. Persist. Interval uniqueness under concurrent creation is the
        // datastore's transactional invariant; this check is the fast path.
        self.sessions.save(&session).await?;
        tracing::info!(
            session_id = %session.id,
            mentor_id = %session.mentor_id,
            scheduled_at = ?session.scheduled_at,
            "Group session created"
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::memory::{InMemoryCallRepository, InMemoryGroupSessionRepository};
    use crate::domain::booking::{Call, CallDuration, CallStatus};
    use crate::domain::foundation::CallId;
    use crate::domain::sessions::GroupSessionStatus;
    use crate::ports::{CallRepository as _, GroupSessionRepository as _};

    fn now() -> Timestamp {
        Timestamp::from_unix_secs(1_717_408_800)
    }

    struct Fixture {
        sessions: Arc<InMemoryGroupSessionRepository>,
        calls: Arc<InMemoryCallRepository>,
        handler: CreateGroupSessionHandler,
    }

    fn fixture() -> Fixture {
        let sessions = Arc::new(InMemoryGroupSessionRepository::new());
        let calls = Arc::new(InMemoryCallRepository::new());
        let handler = CreateGroupSessionHandler::new(
            sessions.clone(),
            calls.clone(),
            Arc::new(FixedClock::at(now())),
        );
        Fixture {
            sessions,
            calls,
            handler,
        }
    }

    fn command(mentor: UserId, scheduled_at: Timestamp) -> CreateGroupSessionCommand {
        CreateGroupSessionCommand {
            mentor_id: mentor,
            title: "Preparing for surgery day".to_string(),
            procedure_tag: "hip-replacement".to_string(),
            scheduled_at,
            duration_minutes: 60,
            capacity: 12,
            min_attendees: 4,
            price_per_seat: Money::from_cents(2_500),
        }
    }

    async fn seed_call(f: &Fixture, mentor: UserId, scheduled_at: Timestamp, status: CallStatus) {
        let mut call = Call::request(
            CallId::new(),
            UserId::new(),
            mentor,
            scheduled_at,
            CallDuration::SixtyMinutes,
            Money::from_cents(5_000),
            now(),
        );
        if status != CallStatus::Requested {
            call.transition(status, now()).unwrap();
        }
        f.calls.save(&call).await.unwrap();
    }

    #[tokio::test]
    async fn creates_a_session_on_a_clear_calendar() {
        let f = fixture();
        let mentor = UserId::new();

        let session = f
            .handler
            .handle(command(mentor, now().plus_days(3)))
            .await
            .unwrap();

        assert_eq!(session.status, GroupSessionStatus::Scheduled);
        assert!(f.sessions.find_by_id(&session.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn rejects_validation_failures_without_writing() {
        let f = fixture();
        let mentor = UserId::new();

        let mut cmd = command(mentor, now().plus_days(3));
        cmd.duration_minutes = 75;
        assert!(matches!(
            f.handler.handle(cmd).await,
            Err(CreateGroupSessionError::Validation(_))
        ));

        let mut cmd = command(mentor, now().plus_hours(5));
        cmd.scheduled_at = now().plus_hours(5); // under the 24h lead
        assert!(matches!(
            f.handler.handle(cmd).await,
            Err(CreateGroupSessionError::Validation(_))
        ));

        assert!(f.sessions.all().is_empty());
    }

    #[tokio::test]
    async fn rejects_overlap_with_a_confirmed_call() {
        let f = fixture();
        let mentor = UserId::new();
        let start = now().plus_days(3);
        seed_call(&f, mentor, start.plus_minutes(30), CallStatus::Confirmed).await;

        let result = f.handler.handle(command(mentor, start)).await;

        assert!(matches!(
            result,
            Err(CreateGroupSessionError::Conflict { .. })
        ));
        assert!(f.sessions.all().is_empty());
    }

    #[tokio::test]
    async fn buffer_extends_two_hours_on_both_sides() {
        let f = fixture();
        let mentor = UserId::new();
        let start = now().plus_days(3);

        // Call 90 minutes before the session starts: inside the buffer.
        seed_call(&f, mentor, start.minus_minutes(90), CallStatus::Requested).await;
        assert!(matches!(
            f.handler.handle(command(mentor, start)).await,
            Err(CreateGroupSessionError::Conflict { .. })
        ));

        // Call starting 90 minutes after the session ends: inside the
        // trailing buffer too.
        let f = fixture();
        seed_call(
            &f,
            mentor,
            start.plus_minutes(60 + 90),
            CallStatus::Requested,
        )
        .await;
        assert!(matches!(
            f.handler.handle(command(mentor, start)).await,
            Err(CreateGroupSessionError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn bookings_ending_exactly_at_the_buffer_edge_are_allowed() {
        let f = fixture();
        let mentor = UserId::new();
        let start = now().plus_days(3);

        // 60-minute call ending exactly 2h before the session start:
        // half-open overlap says no conflict.
        seed_call(&f, mentor, start.minus_hours(3), CallStatus::Confirmed).await;

        assert!(f.handler.handle(command(mentor, start)).await.is_ok());
    }

    #[tokio::test]
    async fn cancelled_bookings_do_not_conflict() {
        let f = fixture();
        let mentor = UserId::new();
        let start = now().plus_days(3);
        seed_call(&f, mentor, start, CallStatus::Cancelled).await;

        assert!(f.handler.handle(command(mentor, start)).await.is_ok());
    }

    #[tokio::test]
    async fn another_mentors_bookings_do_not_conflict() {
        let f = fixture();
        let mentor = UserId::new();
        let other_mentor = UserId::new();
        let start = now().plus_days(3);
        seed_call(&f, other_mentor, start, CallStatus::Confirmed).await;

        assert!(f.handler.handle(command(mentor, start)).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_overlap_with_another_scheduled_session() {
        let f = fixture();
        let mentor = UserId::new();
        let start = now().plus_days(3);
        f.handler.handle(command(mentor, start)).await.unwrap();

        // Exactly the same start again.
        let result = f.handler.handle(command(mentor, start)).await;

        assert!(matches!(
            result,
            Err(CreateGroupSessionError::Conflict { .. })
        ));
        assert_eq!(f.sessions.all().len(), 1);
    }
}
