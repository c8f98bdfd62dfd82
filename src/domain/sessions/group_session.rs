//! GroupSession aggregate: a paid group session hosted by one mentor.
//!
//! # Design Decisions
//!
//! - **Marker-based idempotency**: the three nullable `*_at` markers are the
//!   only thing keeping the periodic lifecycle passes from processing a
//!   session twice. Once set, a marker permanently excludes the session from
//!   that pass.
//! - **Never deleted**: Cancelled and Completed are terminal statuses.
//! - **Symmetric conflict buffer**: the creation-time conflict check expands
//!   the session interval by two hours on both sides for setup/teardown. The
//!   upstream behavior buffered only one side; both edges need the cushion,
//!   so we buffer both and state it here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{
    DomainError, ErrorCode, GroupSessionId, Money, StateMachine, Timestamp, UserId,
    ValidationError,
};
use crate::domain::scheduling::{UtcInterval, GROUP_SESSION_LEAD_HOURS};

/// Group-session lengths offered by the platform, in minutes.
pub const ALLOWED_DURATIONS_MINUTES: [i64; 5] = [30, 45, 60, 90, 120];

/// Capacity policy bounds.
pub const MIN_CAPACITY: u32 = 2;
pub const MAX_CAPACITY: u32 = 50;

/// Price-per-seat policy upper bound, in cents.
pub const MAX_PRICE_CENTS: i64 = 50_000;

/// Setup/teardown buffer applied on both sides of the session interval when
/// checking for scheduling conflicts.
pub const CONFLICT_BUFFER_HOURS: i64 = 2;

/// Lifecycle status of a group session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSessionStatus {
    Scheduled,
    Confirmed,
    Cancelled,
    Completed,
}

impl StateMachine for GroupSessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use GroupSessionStatus::*;
        matches!(
            (self, target),
            (Scheduled, Confirmed) | (Scheduled, Cancelled) | (Confirmed, Completed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use GroupSessionStatus::*;
        match self {
            Scheduled => vec![Confirmed, Cancelled],
            Confirmed => vec![Completed],
            Cancelled | Completed => vec![],
        }
    }
}

impl fmt::Display for GroupSessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GroupSessionStatus::Scheduled => "Scheduled",
            GroupSessionStatus::Confirmed => "Confirmed",
            GroupSessionStatus::Cancelled => "Cancelled",
            GroupSessionStatus::Completed => "Completed",
        };
        write!(f, "{}", s)
    }
}

/// GroupSession aggregate.
///
/// # Invariants
///
/// - duration is one of [`ALLOWED_DURATIONS_MINUTES`]
/// - `MIN_CAPACITY <= capacity <= MAX_CAPACITY`
/// - `1 <= min_attendees <= capacity`
/// - each idempotency marker is stamped at most once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSession {
    /// Unique identifier for this session.
    pub id: GroupSessionId,

    /// Hosting mentor.
    pub mentor_id: UserId,

    /// Display title.
    pub title: String,

    /// Procedure this session covers (e.g. "knee-replacement").
    pub procedure_tag: String,

    /// Scheduled UTC start instant.
    pub scheduled_at: Timestamp,

    /// Session length in minutes.
    pub duration_minutes: u32,

    /// Maximum number of registered participants.
    pub capacity: u32,

    /// Minimum registered participants required to run.
    pub min_attendees: u32,

    /// Price per seat.
    pub price_per_seat: Money,

    /// Current lifecycle status.
    pub status: GroupSessionStatus,

    /// When the minimum-attendance pass resolved this session.
    pub minimum_checked_at: Option<Timestamp>,

    /// When the day-before reminder went out.
    pub day_reminder_sent_at: Option<Timestamp>,

    /// When the hour-before reminder went out.
    pub hour_reminder_sent_at: Option<Timestamp>,

    /// Video room URL, provisioned on confirmation.
    pub room_url: Option<String>,

    /// When the session row was created.
    pub created_at: Timestamp,

    /// When the session row was last updated.
    pub updated_at: Timestamp,
}

impl GroupSession {
    /// Creates a new Scheduled session, enforcing the creation policy.
    ///
    /// # Errors
    ///
    /// Each violated rule returns a specific [`ValidationError`]; nothing is
    /// partially applied.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        id: GroupSessionId,
        mentor_id: UserId,
        title: String,
        procedure_tag: String,
        scheduled_at: Timestamp,
        duration_minutes: u32,
        capacity: u32,
        min_attendees: u32,
        price_per_seat: Money,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        if title.trim().is_empty() {
            return Err(ValidationError::empty_field("title"));
        }
        if !ALLOWED_DURATIONS_MINUTES.contains(&i64::from(duration_minutes)) {
            return Err(ValidationError::not_in_allowed_set(
                "duration_minutes",
                &ALLOWED_DURATIONS_MINUTES,
                i64::from(duration_minutes),
            ));
        }
        if scheduled_at.is_before(&now.plus_hours(GROUP_SESSION_LEAD_HOURS)) {
            return Err(ValidationError::invalid_format(
                "scheduled_at",
                format!(
                    "sessions must be scheduled at least {} hours in advance",
                    GROUP_SESSION_LEAD_HOURS
                ),
            ));
        }
        if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&capacity) {
            return Err(ValidationError::out_of_range(
                "capacity",
                i64::from(MIN_CAPACITY),
                i64::from(MAX_CAPACITY),
                i64::from(capacity),
            ));
        }
        if min_attendees < 1 || min_attendees > capacity {
            return Err(ValidationError::out_of_range(
                "min_attendees",
                1,
                i64::from(capacity),
                i64::from(min_attendees),
            ));
        }
        if price_per_seat.cents() < 0 || price_per_seat.cents() > MAX_PRICE_CENTS {
            return Err(ValidationError::out_of_range(
                "price_per_seat",
                0,
                MAX_PRICE_CENTS,
                price_per_seat.cents(),
            ));
        }

        Ok(Self {
            id,
            mentor_id,
            title,
            procedure_tag,
            scheduled_at,
            duration_minutes,
            capacity,
            min_attendees,
            price_per_seat,
            status: GroupSessionStatus::Scheduled,
            minimum_checked_at: None,
            day_reminder_sent_at: None,
            hour_reminder_sent_at: None,
            room_url: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// The concrete UTC interval this session occupies.
    pub fn interval(&self) -> UtcInterval {
        UtcInterval::from_start_and_minutes(self.scheduled_at, self.duration_minutes)
    }

    /// Scheduled end instant.
    pub fn end_at(&self) -> Timestamp {
        self.scheduled_at.plus_minutes(i64::from(self.duration_minutes))
    }

    /// The interval used for creation-time conflict checks: the session
    /// interval expanded by [`CONFLICT_BUFFER_HOURS`] on both sides.
    pub fn conflict_window(&self) -> UtcInterval {
        self.interval()
            .expanded(chrono::Duration::hours(CONFLICT_BUFFER_HOURS))
    }

    /// True while the session still occupies the mentor's calendar.
    pub fn occupies_calendar(&self) -> bool {
        matches!(
            self.status,
            GroupSessionStatus::Scheduled | GroupSessionStatus::Confirmed
        )
    }

    /// Confirms the session (minimum met) and attaches the provisioned room.
    pub fn confirm(&mut self, room_url: impl Into<String>, now: Timestamp) -> Result<(), DomainError> {
        self.transition(GroupSessionStatus::Confirmed, now)?;
        self.room_url = Some(room_url.into());
        Ok(())
    }

    /// Cancels the session (minimum not met, or host-initiated).
    pub fn cancel(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition(GroupSessionStatus::Cancelled, now)
    }

    /// Completes the session after it has ended.
    pub fn complete(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition(GroupSessionStatus::Completed, now)
    }

    fn transition(
        &mut self,
        target: GroupSessionStatus,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let next = self.status.transition_to(target).map_err(|e| {
            DomainError::new(ErrorCode::InvalidStateTransition, e.to_string())
                .with_detail("session_id", self.id.to_string())
        })?;
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Whether the minimum-attendance pass still needs to resolve this
    /// session.
    pub fn needs_minimum_check(&self) -> bool {
        self.status == GroupSessionStatus::Scheduled && self.minimum_checked_at.is_none()
    }

    /// Stamps the minimum-check marker.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyProcessed` if the marker is already set; the marker is
    /// written exactly once.
    pub fn mark_minimum_checked(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.minimum_checked_at.is_some() {
            return Err(self.already_processed("minimum_check"));
        }
        self.minimum_checked_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Stamps the day-before reminder marker.
    pub fn mark_day_reminder_sent(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.day_reminder_sent_at.is_some() {
            return Err(self.already_processed("day_reminder"));
        }
        self.day_reminder_sent_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Stamps the hour-before reminder marker.
    pub fn mark_hour_reminder_sent(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.hour_reminder_sent_at.is_some() {
            return Err(self.already_processed("hour_reminder"));
        }
        self.hour_reminder_sent_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    fn already_processed(&self, marker: &str) -> DomainError {
        DomainError::new(
            ErrorCode::AlreadyProcessed,
            format!("Marker '{}' already set", marker),
        )
        .with_detail("session_id", self.id.to_string())
    }
}
