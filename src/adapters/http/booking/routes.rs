//! Axum router for the booking endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::super::AppState;
use super::handlers::{get_slots, update_call_status};

/// Booking routes.
///
/// - `GET /mentors/:mentor_id/slots` - bookable slots plus exclusions
/// - `POST /calls/:call_id/status` - owner-driven call transition
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/mentors/:mentor_id/slots", get(get_slots))
        .route("/calls/:call_id/status", post(update_call_status))
}
