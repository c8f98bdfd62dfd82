//! Stripe payment gateway adapter.
//!
//! Implements the `PaymentGateway` port against the Stripe API: webhook
//! signature verification (delegated to the domain verifier), payout
//! transfers, and refunds.
//!
//! # Security
//!
//! - Secrets handled via `secrecy::SecretString`
//! - Signature verification with constant-time comparison and a replay
//!   window happens before any payload content is trusted
//! - Transfer and refund requests carry idempotency keys

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::payments::{CheckoutEvent, WebhookVerifier};
use crate::ports::{
    Clock, CreateRefundRequest, CreateTransferRequest, PaymentError, PaymentGateway, Refund,
    Transfer,
};

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Webhook signing secret (whsec_...).
    webhook_secret: SecretString,

    /// Base URL for the Stripe API (default: https://api.stripe.com).
    api_base_url: String,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Set a custom API base URL (for testing against a stub server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Stripe implementation of the `PaymentGateway` port.
pub struct StripeGateway {
    config: StripeConfig,
    http_client: reqwest::Client,
    clock: Arc<dyn Clock>,
}

/// Minimal transfer response shape; extra fields are ignored.
#[derive(Debug, Deserialize)]
struct StripeTransferResponse {
    id: String,
    destination: String,
    amount: i64,
    currency: String,
}

/// Minimal refund response shape.
#[derive(Debug, Deserialize)]
struct StripeRefundResponse {
    id: String,
    payment_intent: String,
}

impl StripeGateway {
    pub fn new(config: StripeConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
            clock,
        }
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
        idempotency_key: Option<&str>,
    ) -> Result<T, PaymentError> {
        let url = format!("{}{}", self.config.api_base_url, path);
        let mut request = self
            .http_client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .form(form);
        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(PaymentError::authentication("Stripe rejected the API key"));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::provider(format!(
                "Stripe returned {}: {}",
                status, body
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| PaymentError::provider(format!("Malformed Stripe response: {}", e)))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<CheckoutEvent, PaymentError> {
        WebhookVerifier::new(self.config.webhook_secret.expose_secret())
            .verify_and_parse(payload, signature, self.clock.now())
            .map_err(|err| {
                tracing::warn!(error = %err, "Webhook signature verification failed");
                PaymentError::invalid_webhook(err.to_string())
            })
    }

    async fn create_transfer(
        &self,
        request: CreateTransferRequest,
    ) -> Result<Transfer, PaymentError> {
        let mut form = vec![
            ("amount".to_string(), request.amount.cents().to_string()),
            ("currency".to_string(), request.currency.clone()),
            (
                "destination".to_string(),
                request.destination_account.clone(),
            ),
        ];
        for (key, value) in &request.metadata {
            form.push((format!("metadata[{}]", key), value.clone()));
        }

        let response: StripeTransferResponse = self
            .post_form(
                "/v1/transfers",
                &form,
                request.idempotency_key.as_deref(),
            )
            .await?;

        Ok(Transfer {
            id: response.id,
            destination_account: response.destination,
            amount: crate::domain::foundation::Money::from_cents(response.amount),
            currency: response.currency,
        })
    }

    async fn create_refund(&self, request: CreateRefundRequest) -> Result<Refund, PaymentError> {
        let form = vec![(
            "payment_intent".to_string(),
            request.payment_reference.clone(),
        )];

        let response: StripeRefundResponse = self
            .post_form("/v1/refunds", &form, request.idempotency_key.as_deref())
            .await?;

        Ok(Refund {
            id: response.id,
            payment_reference: response.payment_intent,
        })
    }
}
