//! Axum router for the group-session endpoints.

use axum::routing::post;
use axum::Router;

use super::super::AppState;
use super::handlers::{cancel_group_session, create_group_session};

/// Group-session routes.
///
/// - `POST /` - create a session (mentor)
/// - `POST /:session_id/cancel` - host cancellation with refunds
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_group_session))
        .route("/:session_id/cancel", post(cancel_group_session))
}
