//! Payment webhook HTTP module.
//!
//! Separate from the authed API routes: webhooks carry no user identity and
//! are trusted only after signature verification. The raw body is consumed
//! byte-for-byte because the signature covers the exact payload.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use crate::application::handlers::payments::CheckoutResult;
use crate::domain::payments::WebhookError;

use super::{ApiError, AppState};

/// Header carrying the processor's signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Acknowledgement body returned to the processor.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub duplicate: bool,
}

/// Webhook routes.
///
/// - `POST /payments` - signature-verified checkout events
pub fn routes() -> Router<AppState> {
    Router::new().route("/payments", post(handle_payment_webhook))
}

/// `POST /payments`
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_SIGNATURE",
                "Missing signature header",
            )
        })?;

    // 1. Verify before trusting anything in the payload.
    let event = state
        .gateway
        .verify_webhook(&body, signature)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "Rejected webhook delivery");
            ApiError::new(StatusCode::BAD_REQUEST, err.code.to_string(), err.message)
        })?;

    // 2. Idempotent dispatch.
    let result = state
        .checkout_processor()
        .process(event)
        .await
        .map_err(map_processing_error)?;

    Ok(Json(WebhookAck {
        received: true,
        duplicate: result == CheckoutResult::AlreadyProcessed,
    }))
}

fn map_processing_error(err: WebhookError) -> ApiError {
    match &err {
        // Integrity failures: reject outright, the processor will not be
        // able to fix these by retrying but the 4xx shows up in its logs.
        WebhookError::InvalidSignature
        | WebhookError::TimestampOutOfRange
        | WebhookError::InvalidTimestamp
        | WebhookError::ParseError(_)
        | WebhookError::MissingMetadata(_) => {
            ApiError::new(StatusCode::BAD_REQUEST, "INTEGRITY_ERROR", err.to_string())
        }
        // Handler/database failures: 500 so the processor redelivers.
        _ => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "PROCESSING_FAILED",
            err.to_string(),
        ),
    }
}
