//! HTTP handlers for the group-session endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::application::handlers::sessions::{
    CancelGroupSessionCommand, CancelGroupSessionError, CreateGroupSessionCommand,
    CreateGroupSessionError,
};
use crate::domain::foundation::GroupSessionId;

use super::super::{ApiError, AppState, AuthenticatedUser};
use super::dto::{
    price_from_cents, CancelGroupSessionResponse, CreateGroupSessionRequest, GroupSessionResponse,
};

/// `POST /`
pub async fn create_group_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateGroupSessionRequest>,
) -> Result<(StatusCode, Json<GroupSessionResponse>), ApiError> {
    let session = state
        .create_group_session_handler()
        .handle(CreateGroupSessionCommand {
            mentor_id: user.user_id,
            title: body.title,
            procedure_tag: body.procedure_tag,
            scheduled_at: body.scheduled_at,
            duration_minutes: body.duration_minutes,
            capacity: body.capacity,
            min_attendees: body.min_attendees,
            price_per_seat: price_from_cents(body.price_per_seat_cents),
        })
        .await
        .map_err(map_create_error)?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// `POST /:session_id/cancel`
pub async fn cancel_group_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(session_id): Path<GroupSessionId>,
) -> Result<Json<CancelGroupSessionResponse>, ApiError> {
    let result = state
        .cancel_group_session_handler()
        .handle(CancelGroupSessionCommand {
            session_id,
            requested_by: user.user_id,
        })
        .await
        .map_err(map_cancel_error)?;
    Ok(Json(CancelGroupSessionResponse {
        session: result.session.into(),
        refund_failures: result.refund_failures,
    }))
}

fn map_create_error(err: CreateGroupSessionError) -> ApiError {
    match err {
        CreateGroupSessionError::Validation(inner) => ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            inner.to_string(),
        ),
        CreateGroupSessionError::Conflict { detail } => {
            ApiError::new(StatusCode::CONFLICT, "SCHEDULING_CONFLICT", detail)
        }
        CreateGroupSessionError::Domain(inner) => inner.into(),
    }
}

fn map_cancel_error(err: CancelGroupSessionError) -> ApiError {
    match err {
        CancelGroupSessionError::SessionNotFound(_) => {
            ApiError::new(StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", err.to_string())
        }
        CancelGroupSessionError::Forbidden => {
            ApiError::new(StatusCode::FORBIDDEN, "FORBIDDEN", err.to_string())
        }
        CancelGroupSessionError::InvalidState(inner) => {
            ApiError::new(StatusCode::CONFLICT, inner.code.to_string(), inner.message)
        }
        CancelGroupSessionError::Domain(inner) => inner.into(),
    }
}
