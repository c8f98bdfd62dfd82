//! Lifecycle trigger HTTP module.
//!
//! The engine performs work as a side effect of this endpoint being
//! invoked - there is no internal schedule. The route is guarded by a
//! shared secret compared in constant time.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use subtle::ConstantTimeEq;

use crate::application::handlers::lifecycle::RunSummary;
use crate::domain::foundation::ErrorCode;

use super::{ApiError, AppState};

/// Header carrying the trigger secret.
pub const TRIGGER_SECRET_HEADER: &str = "x-trigger-secret";

/// Lifecycle routes.
///
/// - `POST /lifecycle/run` - run the three engine passes once
pub fn routes() -> Router<AppState> {
    Router::new().route("/lifecycle/run", post(run_lifecycle))
}

/// `POST /lifecycle/run`
pub async fn run_lifecycle(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RunSummary>, ApiError> {
    let presented = headers
        .get(TRIGGER_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !secrets_match(presented, &state.trigger_secret) {
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Invalid trigger secret",
        ));
    }

    let summary = state.engine.run().await.map_err(|err| {
        if err.code == ErrorCode::RunInProgress {
            ApiError::new(StatusCode::CONFLICT, err.code.to_string(), err.message)
        } else {
            err.into()
        }
    })?;
    Ok(Json(summary))
}

fn secrets_match(presented: &str, expected: &str) -> bool {
    if presented.len() != expected.len() {
        return false;
    }
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}
