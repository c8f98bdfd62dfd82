//! DirectoryReader port - read access to user contact and payout data.
//!
//! Profiles are managed by CRUD surfaces outside this subsystem; the
//! lifecycle engine and payment router only need contacts for notifications
//! and payout destinations for transfers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, UserId};

use super::Contact;

/// A seller's payout destination at the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutAccount {
    /// Processor account reference (e.g. a connected account id).
    pub account_reference: String,

    /// Whether the processor has verified the destination. Transfers are
    /// only initiated to verified destinations.
    pub verified: bool,
}

impl PayoutAccount {
    pub fn verified(account_reference: impl Into<String>) -> Self {
        Self {
            account_reference: account_reference.into(),
            verified: true,
        }
    }

    pub fn unverified(account_reference: impl Into<String>) -> Self {
        Self {
            account_reference: account_reference.into(),
            verified: false,
        }
    }
}

/// Port for user directory lookups.
#[async_trait]
pub trait DirectoryReader: Send + Sync {
    /// Contact details for notifications.
    async fn contact(&self, user_id: &UserId) -> Result<Option<Contact>, DomainError>;

    /// Payout destination for a mentor or seller, if one is configured.
    async fn payout_account(
        &self,
        user_id: &UserId,
    ) -> Result<Option<PayoutAccount>, DomainError>;
}
