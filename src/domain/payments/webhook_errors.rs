//! Error types for payment webhook processing.

use thiserror::Error;

/// Errors that occur while verifying or processing a payment webhook.
///
/// Integrity failures (`InvalidSignature`, timestamp violations,
/// `MissingMetadata`) are fatal: the request is rejected outright and the
/// processor will retry delivery. `Ignored` acknowledges an event we do not
/// handle.
#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    /// Signature verification failed.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Event timestamp is older than the replay window.
    #[error("Webhook timestamp outside acceptable range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock-skew tolerance.
    #[error("Webhook timestamp is invalid")]
    InvalidTimestamp,

    /// Header or payload could not be parsed.
    #[error("Webhook parse error: {0}")]
    ParseError(String),

    /// Required metadata is missing or malformed.
    #[error("Webhook metadata error: {0}")]
    MissingMetadata(String),

    /// Event type we deliberately do not process.
    #[error("Webhook event ignored: {0}")]
    Ignored(String),

    /// Datastore failure while recording or checking the event.
    #[error("Webhook database error: {0}")]
    Database(String),

    /// A purchase handler failed after verification.
    #[error("Webhook handler error: {0}")]
    Handler(String),
}
