//! Mock payment gateway for testing.
//!
//! Provides a configurable mock implementation of `PaymentGateway` for unit
//! and integration tests. Supports:
//! - Real signature verification against a test secret, accept-all parsing,
//!   or reject-everything modes
//! - Error injection for transfers and refunds (global or per payment
//!   reference)
//! - Call tracking for assertions

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::foundation::Timestamp;
use crate::domain::payments::{CheckoutEvent, WebhookVerifier};
use crate::ports::{
    CreateRefundRequest, CreateTransferRequest, PaymentError, PaymentGateway, Refund, Transfer,
};

/// How the mock verifies webhooks.
#[derive(Default, Clone)]
enum VerifyMode {
    /// Parse the payload without checking the signature.
    #[default]
    AcceptAll,

    /// Verify for real against this secret.
    Secret(String),

    /// Always fail verification.
    AlwaysFail,
}

#[derive(Default)]
struct MockState {
    verify_mode: VerifyMode,

    /// Recorded transfer requests.
    transfers: Vec<CreateTransferRequest>,

    /// Recorded refund requests.
    refunds: Vec<CreateRefundRequest>,

    /// Fail every transfer.
    fail_transfers: bool,

    /// Fail every refund.
    fail_refunds: bool,

    /// Fail refunds for specific payment references only.
    fail_refund_references: HashSet<String>,

    next_transfer_seq: u32,
    next_refund_seq: u32,
}

/// Mock payment gateway.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentGateway::new();
/// mock.fail_transfers();
///
/// let result = mock.create_transfer(request).await;
/// assert!(result.is_err());
/// assert_eq!(mock.transfers().len(), 0);
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

impl MockPaymentGateway {
    /// Mock that parses any payload without signature checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that verifies signatures for real against `secret`.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().verify_mode = VerifyMode::Secret(secret.into());
        mock
    }

    /// Mock that fails all webhook verifications.
    pub fn rejecting_webhooks() -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().verify_mode = VerifyMode::AlwaysFail;
        mock
    }

    /// Make every transfer fail.
    pub fn fail_transfers(&self) {
        self.inner.lock().unwrap().fail_transfers = true;
    }

    /// Make every refund fail.
    pub fn fail_refunds(&self) {
        self.inner.lock().unwrap().fail_refunds = true;
    }

    /// Make refunds fail for one payment reference only.
    pub fn fail_refund_for(&self, payment_reference: impl Into<String>) {
        self.inner
            .lock()
            .unwrap()
            .fail_refund_references
            .insert(payment_reference.into());
    }

    /// Recorded transfer requests.
    pub fn transfers(&self) -> Vec<CreateTransferRequest> {
        self.inner.lock().unwrap().transfers.clone()
    }

    /// Recorded refund requests.
    pub fn refunds(&self) -> Vec<CreateRefundRequest> {
        self.inner.lock().unwrap().refunds.clone()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<CheckoutEvent, PaymentError> {
        let mode = self.inner.lock().unwrap().verify_mode.clone();
        match mode {
            VerifyMode::AcceptAll => serde_json::from_slice(payload)
                .map_err(|e| PaymentError::invalid_webhook(e.to_string())),
            VerifyMode::Secret(secret) => WebhookVerifier::new(secret)
                .verify_and_parse(payload, signature, Timestamp::now())
                .map_err(|e| PaymentError::invalid_webhook(e.to_string())),
            VerifyMode::AlwaysFail => {
                Err(PaymentError::invalid_webhook("verification disabled"))
            }
        }
    }

    async fn create_transfer(
        &self,
        request: CreateTransferRequest,
    ) -> Result<Transfer, PaymentError> {
        let mut state = self.inner.lock().unwrap();
        if state.fail_transfers {
            return Err(PaymentError::network("simulated transfer failure"));
        }
        state.next_transfer_seq += 1;
        let transfer = Transfer {
            id: format!("tr_mock_{}", state.next_transfer_seq),
            destination_account: request.destination_account.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
        };
        state.transfers.push(request);
        Ok(transfer)
    }

    async fn create_refund(&self, request: CreateRefundRequest) -> Result<Refund, PaymentError> {
        let mut state = self.inner.lock().unwrap();
        if state.fail_refunds
            || state
                .fail_refund_references
                .contains(&request.payment_reference)
        {
            return Err(PaymentError::network("simulated refund failure"));
        }
        state.next_refund_seq += 1;
        let refund = Refund {
            id: format!("re_mock_{}", state.next_refund_seq),
            payment_reference: request.payment_reference.clone(),
        };
        state.refunds.push(request);
        Ok(refund)
    }
}
