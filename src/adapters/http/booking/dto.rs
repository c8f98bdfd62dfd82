//! DTOs for the booking endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::application::handlers::booking::AvailableSlotsView;
use crate::domain::booking::{Call, CallStatus};
use crate::domain::foundation::{CallId, Timestamp, UserId};
use crate::domain::scheduling::{BookedInterval, DaySlots};

/// Query string for the slots endpoint.
#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    /// Requested call length in minutes (30 or 60).
    pub duration: u32,
}

/// Response for the slots endpoint: generated slots plus the exclusions
/// they were computed from, so clients need not re-derive them.
#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    pub mentor_id: UserId,
    pub days: Vec<DaySlots>,
    pub booked: Vec<BookedInterval>,
    pub blocked_dates: Vec<NaiveDate>,
}

impl From<AvailableSlotsView> for SlotsResponse {
    fn from(view: AvailableSlotsView) -> Self {
        Self {
            mentor_id: view.mentor_id,
            days: view.days,
            booked: view.booked,
            blocked_dates: view.blocked_dates,
        }
    }
}

/// Body for the call transition endpoint.
#[derive(Debug, Deserialize)]
pub struct UpdateCallStatusRequest {
    pub status: CallStatus,
}

/// Response for call endpoints.
#[derive(Debug, Serialize)]
pub struct CallResponse {
    pub id: CallId,
    pub patient_id: UserId,
    pub mentor_id: UserId,
    pub scheduled_at: Timestamp,
    pub duration_minutes: u32,
    pub price_cents: i64,
    pub status: CallStatus,
    pub room_url: Option<String>,
}

impl From<Call> for CallResponse {
    fn from(call: Call) -> Self {
        Self {
            id: call.id,
            patient_id: call.patient_id,
            mentor_id: call.mentor_id,
            scheduled_at: call.scheduled_at,
            duration_minutes: call.duration.minutes(),
            price_cents: call.price.cents(),
            status: call.status,
            room_url: call.room_url,
        }
    }
}
