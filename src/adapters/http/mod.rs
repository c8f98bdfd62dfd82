//! HTTP adapters: Axum routes, handlers, and DTOs per context.

pub mod booking;
pub mod lifecycle;
pub mod sessions;
pub mod webhooks;

mod state;

pub use state::{ApiError, AppState, AuthenticatedUser, ErrorResponse};

use axum::Router;

/// Builds the complete API router.
///
/// - `/api/booking/*` - slots read API and call transitions
/// - `/api/sessions/*` - group session creation and host cancellation
/// - `/api/internal/*` - shared-secret guarded lifecycle trigger
/// - `/api/webhooks/*` - signature-verified payment events
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/booking", booking::routes())
        .nest("/api/sessions", sessions::routes())
        .nest("/api/internal", lifecycle::routes())
        .nest("/api/webhooks", webhooks::routes())
        .with_state(state)
}
