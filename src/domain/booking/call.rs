//! Call aggregate: a paid one-on-one video call between patient and mentor.
//!
//! # Design Decisions
//!
//! - **Money in cents**: price, fee, and payout are i64 cents, split at
//!   creation time so the row is self-describing for reconciliation
//! - **Never deleted**: cancellation and no-show are terminal statuses,
//!   preserving the audit trail
//! - **Two creation paths**: manual booking starts Requested; the
//!   post-payment path creates the call directly Confirmed

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{
    CallId, DomainError, ErrorCode, Money, RevenueSplit, StateMachine, Timestamp, UserId,
    ValidationError,
};
use crate::domain::scheduling::UtcInterval;

/// Lifecycle status of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Requested,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl StateMachine for CallStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use CallStatus::*;
        matches!(
            (self, target),
            (Requested, Confirmed)
                | (Requested, Cancelled)
                | (Confirmed, Completed)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use CallStatus::*;
        match self {
            Requested => vec![Confirmed, Cancelled],
            Confirmed => vec![Completed, Cancelled, NoShow],
            Completed | Cancelled | NoShow => vec![],
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallStatus::Requested => "Requested",
            CallStatus::Confirmed => "Confirmed",
            CallStatus::Completed => "Completed",
            CallStatus::Cancelled => "Cancelled",
            CallStatus::NoShow => "NoShow",
        };
        write!(f, "{}", s)
    }
}

/// Allowed call lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallDuration {
    ThirtyMinutes,
    SixtyMinutes,
}

impl CallDuration {
    /// Parses a requested duration, rejecting anything but 30 or 60.
    pub fn try_from_minutes(minutes: u32) -> Result<Self, ValidationError> {
        match minutes {
            30 => Ok(CallDuration::ThirtyMinutes),
            60 => Ok(CallDuration::SixtyMinutes),
            other => Err(ValidationError::not_in_allowed_set(
                "duration_minutes",
                &[30, 60],
                i64::from(other),
            )),
        }
    }

    /// Duration in minutes.
    pub fn minutes(&self) -> u32 {
        match self {
            CallDuration::ThirtyMinutes => 30,
            CallDuration::SixtyMinutes => 60,
        }
    }
}

/// Call aggregate.
///
/// # Invariants
///
/// - `price == platform_fee + mentor_payout`
/// - status changes only through the [`CallStatus`] transition table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Unique identifier for this call.
    pub id: CallId,

    /// Patient who booked the call.
    pub patient_id: UserId,

    /// Mentor giving the call.
    pub mentor_id: UserId,

    /// Scheduled UTC start instant.
    pub scheduled_at: Timestamp,

    /// Call length.
    pub duration: CallDuration,

    /// Gross price paid by the patient.
    pub price: Money,

    /// Platform's share of the price.
    pub platform_fee: Money,

    /// Mentor's share of the price.
    pub mentor_payout: Money,

    /// Current lifecycle status.
    pub status: CallStatus,

    /// Video room URL, when provisioned.
    pub room_url: Option<String>,

    /// When the call row was created.
    pub created_at: Timestamp,

    /// When the call row was last updated.
    pub updated_at: Timestamp,
}

impl Call {
    /// Creates a manually-booked call in Requested status.
    pub fn request(
        id: CallId,
        patient_id: UserId,
        mentor_id: UserId,
        scheduled_at: Timestamp,
        duration: CallDuration,
        price: Money,
        now: Timestamp,
    ) -> Self {
        Self::build(
            id,
            patient_id,
            mentor_id,
            scheduled_at,
            duration,
            price,
            CallStatus::Requested,
            None,
            now,
        )
    }

    /// Creates a paid call directly in Confirmed status (auto-confirm path).
    ///
    /// The room may be absent: room provisioning failure does not block the
    /// purchase, the call proceeds roomless.
    pub fn confirmed(
        id: CallId,
        patient_id: UserId,
        mentor_id: UserId,
        scheduled_at: Timestamp,
        duration: CallDuration,
        price: Money,
        room_url: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self::build(
            id,
            patient_id,
            mentor_id,
            scheduled_at,
            duration,
            price,
            CallStatus::Confirmed,
            room_url,
            now,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        id: CallId,
        patient_id: UserId,
        mentor_id: UserId,
        scheduled_at: Timestamp,
        duration: CallDuration,
        price: Money,
        status: CallStatus,
        room_url: Option<String>,
        now: Timestamp,
    ) -> Self {
        let mentor_payout = RevenueSplit::STANDARD.mentor_share(price);
        let platform_fee = price.minus(mentor_payout);
        Self {
            id,
            patient_id,
            mentor_id,
            scheduled_at,
            duration,
            price,
            platform_fee,
            mentor_payout,
            status,
            room_url,
            created_at: now,
            updated_at: now,
        }
    }

    /// The concrete UTC interval this call occupies.
    pub fn interval(&self) -> UtcInterval {
        UtcInterval::from_start_and_minutes(self.scheduled_at, self.duration.minutes())
    }

    /// True while the call still occupies the mentor's calendar.
    pub fn occupies_calendar(&self) -> bool {
        matches!(self.status, CallStatus::Requested | CallStatus::Confirmed)
    }

    /// Performs a validated status transition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` and leaves the call untouched when
    /// the target is not reachable from the current status.
    pub fn transition(&mut self, target: CallStatus, now: Timestamp) -> Result<(), DomainError> {
        let next = self.status.transition_to(target).map_err(|e| {
            DomainError::new(ErrorCode::InvalidStateTransition, e.to_string())
                .with_detail("call_id", self.id.to_string())
        })?;
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Attaches a provisioned room.
    pub fn attach_room(&mut self, url: impl Into<String>, now: Timestamp) {
        self.room_url = Some(url.into());
        self.updated_at = now;
    }
}
