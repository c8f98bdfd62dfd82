//! PurchaseRepository port - append-only purchase records and access grants.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::payments::{AccessGrant, AccessTarget, PurchaseRecord};

/// Port for purchase records and derived access grants.
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Append a purchase record. Exactly one row exists per processor event
    /// id; implementations enforce this with a unique constraint.
    async fn save(&self, record: &PurchaseRecord) -> Result<(), DomainError>;

    /// Find a purchase by processor event id.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<PurchaseRecord>, DomainError>;

    /// Upsert an access grant. Writing an existing (user, target) pair is a
    /// no-op, never an error.
    async fn grant_access(&self, grant: &AccessGrant) -> Result<(), DomainError>;

    /// Whether a user holds a grant for a target.
    async fn has_grant(
        &self,
        user_id: &UserId,
        target: &AccessTarget,
    ) -> Result<bool, DomainError>;
}
