//! Payments context: checkout events, signature verification, purchase
//! records, access grants, and the payout ledger.

mod checkout_event;
mod payout;
mod purchase;
mod webhook_errors;
mod webhook_verifier;

pub use checkout_event::{
    CheckoutEvent, CheckoutEventBuilder, CheckoutEventData, CheckoutMetadata, PurchaseDetail,
    PurchaseKind, CHECKOUT_COMPLETED,
};
pub use payout::{PayoutLedgerEntry, PayoutOutcome, PayoutSource};
pub use purchase::{AccessGrant, AccessTarget, PurchaseRecord, PurchaseTarget};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{sign_payload, SignatureHeader, WebhookVerifier};
