//! Group-session participant entity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{
    DomainError, ErrorCode, GroupSessionId, Money, ParticipantId, Timestamp, UserId,
};

/// Lifecycle status of a participant registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Registered,
    Attended,
    Cancelled,
    Refunded,
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParticipantStatus::Registered => "Registered",
            ParticipantStatus::Attended => "Attended",
            ParticipantStatus::Cancelled => "Cancelled",
            ParticipantStatus::Refunded => "Refunded",
        };
        write!(f, "{}", s)
    }
}

/// A user's paid registration for a group session.
///
/// Counts toward capacity and the minimum-attendance threshold only while
/// Registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSessionParticipant {
    pub id: ParticipantId,
    pub session_id: GroupSessionId,
    pub user_id: UserId,
    pub amount_paid: Money,

    /// Processor payment reference; present for paid registrations and used
    /// when issuing refunds.
    pub payment_reference: Option<String>,

    pub status: ParticipantStatus,
    pub registered_at: Timestamp,
    pub updated_at: Timestamp,
}

impl GroupSessionParticipant {
    /// Registers a user for a session.
    pub fn register(
        id: ParticipantId,
        session_id: GroupSessionId,
        user_id: UserId,
        amount_paid: Money,
        payment_reference: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            session_id,
            user_id,
            amount_paid,
            payment_reference,
            status: ParticipantStatus::Registered,
            registered_at: now,
            updated_at: now,
        }
    }

    /// True while this registration counts toward capacity and threshold.
    pub fn counts_toward_minimum(&self) -> bool {
        self.status == ParticipantStatus::Registered
    }

    /// True if this participant paid and would need a refund on cancellation.
    pub fn needs_refund(&self) -> bool {
        self.status == ParticipantStatus::Registered && self.amount_paid.is_positive()
    }

    /// Marks a registered participant as attended (session completion).
    pub fn mark_attended(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.change_from_registered(ParticipantStatus::Attended, now)
    }

    /// Marks a registered participant as refunded (session cancellation,
    /// nonzero payment).
    pub fn mark_refunded(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.change_from_registered(ParticipantStatus::Refunded, now)
    }

    /// Marks a registered participant as cancelled (session cancellation,
    /// nothing to refund).
    pub fn mark_cancelled(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.change_from_registered(ParticipantStatus::Cancelled, now)
    }

    fn change_from_registered(
        &mut self,
        target: ParticipantStatus,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        if self.status != ParticipantStatus::Registered {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot move participant from {} to {}", self.status, target),
            )
            .with_detail("participant_id", self.id.to_string()));
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }
}
