//! HTTP handlers for the booking endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::application::handlers::booking::{
    GetAvailableSlotsQuery, UpdateCallStatusCommand, UpdateCallStatusError,
};
use crate::domain::foundation::{CallId, UserId};

use super::super::{ApiError, AppState, AuthenticatedUser};
use super::dto::{CallResponse, SlotsQuery, SlotsResponse, UpdateCallStatusRequest};

/// `GET /mentors/:mentor_id/slots?duration=30`
pub async fn get_slots(
    State(state): State<AppState>,
    Path(mentor_id): Path<UserId>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, ApiError> {
    let view = state
        .slots_handler()
        .handle(GetAvailableSlotsQuery {
            mentor_id,
            duration_minutes: query.duration,
        })
        .await?;
    Ok(Json(view.into()))
}

/// `POST /calls/:call_id/status`
pub async fn update_call_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(call_id): Path<CallId>,
    Json(body): Json<UpdateCallStatusRequest>,
) -> Result<Json<CallResponse>, ApiError> {
    let call = state
        .update_call_status_handler()
        .handle(UpdateCallStatusCommand {
            call_id,
            requested_by: user.user_id,
            target: body.status,
        })
        .await
        .map_err(map_error)?;
    Ok(Json(call.into()))
}

fn map_error(err: UpdateCallStatusError) -> ApiError {
    match err {
        UpdateCallStatusError::CallNotFound(_) => {
            ApiError::new(StatusCode::NOT_FOUND, "CALL_NOT_FOUND", err.to_string())
        }
        UpdateCallStatusError::Forbidden => {
            ApiError::new(StatusCode::FORBIDDEN, "FORBIDDEN", err.to_string())
        }
        UpdateCallStatusError::InvalidTransition(inner) => {
            ApiError::new(StatusCode::CONFLICT, inner.code.to_string(), inner.message)
        }
        UpdateCallStatusError::Domain(inner) => inner.into(),
    }
}
