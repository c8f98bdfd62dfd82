//! DTOs for the group-session endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{GroupSessionId, Money, Timestamp, UserId};
use crate::domain::sessions::{GroupSession, GroupSessionStatus};

/// Body for session creation.
#[derive(Debug, Deserialize)]
pub struct CreateGroupSessionRequest {
    pub title: String,
    pub procedure_tag: String,
    pub scheduled_at: Timestamp,
    pub duration_minutes: u32,
    pub capacity: u32,
    pub min_attendees: u32,
    pub price_per_seat_cents: i64,
}

/// Response for session endpoints.
#[derive(Debug, Serialize)]
pub struct GroupSessionResponse {
    pub id: GroupSessionId,
    pub mentor_id: UserId,
    pub title: String,
    pub procedure_tag: String,
    pub scheduled_at: Timestamp,
    pub duration_minutes: u32,
    pub capacity: u32,
    pub min_attendees: u32,
    pub price_per_seat_cents: i64,
    pub status: GroupSessionStatus,
    pub room_url: Option<String>,
}

impl From<GroupSession> for GroupSessionResponse {
    fn from(session: GroupSession) -> Self {
        Self {
            id: session.id,
            mentor_id: session.mentor_id,
            title: session.title,
            procedure_tag: session.procedure_tag,
            scheduled_at: session.scheduled_at,
            duration_minutes: session.duration_minutes,
            capacity: session.capacity,
            min_attendees: session.min_attendees,
            price_per_seat_cents: session.price_per_seat.cents(),
            status: session.status,
            room_url: session.room_url,
        }
    }
}

/// Response for host cancellation: the cancelled session plus any refunds
/// that need manual follow-up.
#[derive(Debug, Serialize)]
pub struct CancelGroupSessionResponse {
    pub session: GroupSessionResponse,
    pub refund_failures: Vec<String>,
}

/// Convenience for handlers constructing request money values.
pub fn price_from_cents(cents: i64) -> Money {
    Money::from_cents(cents)
}
