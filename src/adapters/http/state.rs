//! Shared application state and cross-cutting HTTP types.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::application::handlers::booking::{GetAvailableSlotsHandler, UpdateCallStatusHandler};
use crate::application::handlers::lifecycle::LifecycleEngine;
use crate::application::handlers::payments::{
    CallPurchaseHandler, IdempotentCheckoutProcessor, PurchaseRouter, RecordingPurchaseHandler,
    SeriesPurchaseHandler, SessionRegistrationHandler,
};
use crate::application::handlers::payouts::PayoutInitiator;
use crate::application::handlers::sessions::{CancelGroupSessionHandler, CreateGroupSessionHandler};
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::{
    AvailabilityRepository, CallRepository, CatalogReader, Clock, DirectoryReader,
    GroupSessionRepository, Notifier, ParticipantRepository, PaymentGateway, PayoutLedger,
    PurchaseRepository, RoomProvisioner, WebhookEventRepository,
};

/// Shared application state containing all dependencies.
///
/// Cloned per request; everything inside is Arc-wrapped. The lifecycle
/// engine is a single long-lived instance so its run lease spans requests.
#[derive(Clone)]
pub struct AppState {
    pub availability: Arc<dyn AvailabilityRepository>,
    pub calls: Arc<dyn CallRepository>,
    pub sessions: Arc<dyn GroupSessionRepository>,
    pub participants: Arc<dyn ParticipantRepository>,
    pub purchases: Arc<dyn PurchaseRepository>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub payout_ledger: Arc<dyn PayoutLedger>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub rooms: Arc<dyn RoomProvisioner>,
    pub notifier: Arc<dyn Notifier>,
    pub directory: Arc<dyn DirectoryReader>,
    pub catalog: Arc<dyn CatalogReader>,
    pub clock: Arc<dyn Clock>,
    pub engine: Arc<LifecycleEngine>,

    /// Shared secret guarding the internal trigger endpoint.
    pub trigger_secret: String,
}

impl AppState {
    /// Create handlers on demand from the shared state.
    pub fn slots_handler(&self) -> GetAvailableSlotsHandler {
        GetAvailableSlotsHandler::new(self.availability.clone(), self.clock.clone())
    }

    pub fn update_call_status_handler(&self) -> UpdateCallStatusHandler {
        UpdateCallStatusHandler::new(self.calls.clone(), self.clock.clone())
    }

    pub fn create_group_session_handler(&self) -> CreateGroupSessionHandler {
        CreateGroupSessionHandler::new(
            self.sessions.clone(),
            self.calls.clone(),
            self.clock.clone(),
        )
    }

    pub fn cancel_group_session_handler(&self) -> CancelGroupSessionHandler {
        CancelGroupSessionHandler::new(
            self.sessions.clone(),
            self.participants.clone(),
            self.gateway.clone(),
            self.notifier.clone(),
            self.directory.clone(),
            self.clock.clone(),
        )
    }

    pub fn payout_initiator(&self) -> Arc<PayoutInitiator> {
        Arc::new(PayoutInitiator::new(
            self.gateway.clone(),
            self.payout_ledger.clone(),
            self.directory.clone(),
        ))
    }

    /// The idempotent checkout processor with all four purchase handlers
    /// registered.
    pub fn checkout_processor(&self) -> IdempotentCheckoutProcessor {
        let payouts = self.payout_initiator();
        let router = PurchaseRouter::new(vec![
            Arc::new(RecordingPurchaseHandler::new(
                self.purchases.clone(),
                self.catalog.clone(),
                payouts.clone(),
                self.clock.clone(),
            )),
            Arc::new(SeriesPurchaseHandler::new(
                self.purchases.clone(),
                self.catalog.clone(),
                payouts,
                self.clock.clone(),
            )),
            Arc::new(CallPurchaseHandler::new(
                self.purchases.clone(),
                self.calls.clone(),
                self.rooms.clone(),
                self.notifier.clone(),
                self.directory.clone(),
                self.clock.clone(),
            )),
            Arc::new(SessionRegistrationHandler::new(
                self.purchases.clone(),
                self.sessions.clone(),
                self.participants.clone(),
                self.notifier.clone(),
                self.directory.clone(),
                self.clock.clone(),
            )),
        ]);
        IdempotentCheckoutProcessor::new(self.webhook_events.clone(), router)
    }
}

/// JSON error payload returned by every endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// HTTP-facing error with a status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse::new(code, message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let status = match err.code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat
            | ErrorCode::InvalidSignature
            | ErrorCode::MissingMetadata => StatusCode::BAD_REQUEST,
            ErrorCode::CallNotFound
            | ErrorCode::SessionNotFound
            | ErrorCode::ParticipantNotFound
            | ErrorCode::MentorNotFound
            | ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            code if code.is_conflict() => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(status, err.code.to_string(), err.message)
    }
}

/// Authenticated user context extracted from the request.
///
/// In production this is populated by the auth middleware in front of the
/// service; here it reads the `x-user-id` header directly, which keeps the
/// subsystem testable without dragging in authentication mechanics.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ApiError::new(
                    StatusCode::UNAUTHORIZED,
                    "AUTHENTICATION_REQUIRED",
                    "Authentication is required",
                )
            })?;
        let user_id = header.parse::<UserId>().map_err(|_| {
            ApiError::new(
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_REQUIRED",
                "Invalid user identity",
            )
        })?;
        Ok(AuthenticatedUser { user_id })
    }
}
