//! Payment gateway port for external payment processing.
//!
//! Defines the contract for the payment processor integration: inbound
//! webhook verification and outbound transfers (revenue-split payouts) and
//! refunds.
//!
//! # Design
//!
//! - **Gateway agnostic**: interface works with any Stripe-like processor
//! - **Idempotent**: transfer and refund requests carry idempotency keys so
//!   retries are safe
//! - **Non-fatal by policy**: callers treat transfer/refund failures as
//!   reconciliation work, never as a reason to revert domain state

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::foundation::{DomainError, ErrorCode, Money};
use crate::domain::payments::CheckoutEvent;

/// Port for the payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Verify a webhook signature and parse the event.
    ///
    /// Returns the parsed event if valid, error if the signature or replay
    /// window check fails. Verification is mandatory before trusting any
    /// payload content.
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<CheckoutEvent, PaymentError>;

    /// Create a transfer to a seller's payout destination.
    async fn create_transfer(
        &self,
        request: CreateTransferRequest,
    ) -> Result<Transfer, PaymentError>;

    /// Refund a payment by its processor reference.
    async fn create_refund(&self, request: CreateRefundRequest) -> Result<Refund, PaymentError>;
}

/// Request to create a payout transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransferRequest {
    /// Processor account reference of the destination.
    pub destination_account: String,

    /// Amount in minor units.
    pub amount: Money,

    /// ISO currency code.
    pub currency: String,

    /// Idempotency key for safe retries.
    pub idempotency_key: Option<String>,

    /// Metadata attached to the transfer (source entity ids).
    pub metadata: HashMap<String, String>,
}

/// A transfer accepted by the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    /// Processor's transfer reference.
    pub id: String,

    /// Destination account reference.
    pub destination_account: String,

    /// Amount in minor units.
    pub amount: Money,

    /// ISO currency code.
    pub currency: String,
}

/// Request to refund a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRefundRequest {
    /// Processor payment reference to refund.
    pub payment_reference: String,

    /// Idempotency key for safe retries.
    pub idempotency_key: Option<String>,
}

/// A refund accepted by the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    /// Processor's refund reference.
    pub id: String,

    /// Payment reference that was refunded.
    pub payment_reference: String,
}

/// Errors from payment gateway operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl PaymentError {
    /// Create a new payment error.
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    /// Create an invalid webhook error.
    pub fn invalid_webhook(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidWebhook, message)
    }

    /// Create a provider-side error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        let code = match err.code {
            PaymentErrorCode::NotFound => ErrorCode::NotFound,
            PaymentErrorCode::InvalidWebhook => ErrorCode::InvalidSignature,
            _ => ErrorCode::ExternalServiceError,
        };
        DomainError::new(code, err.message)
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Destination balance cannot cover the transfer.
    InsufficientFunds,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Invalid webhook signature.
    InvalidWebhook,

    /// Provider API error.
    ProviderError,

    /// Unknown error.
    Unknown,
}

impl PaymentErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError | PaymentErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::InsufficientFunds => "insufficient_funds",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::InvalidWebhook => "invalid_webhook",
            PaymentErrorCode::ProviderError => "provider_error",
            PaymentErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}
