//! PayoutLedger port - append-only record of attempted payouts.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::payments::PayoutLedgerEntry;

/// Port for the payout ledger.
///
/// A row is appended for every attempted transfer, success or failure, so
/// failed payouts surface as a reconciliation backlog.
#[async_trait]
pub trait PayoutLedger: Send + Sync {
    /// Append a ledger entry.
    async fn record(&self, entry: &PayoutLedgerEntry) -> Result<(), DomainError>;

    /// Entries for one mentor, newest first.
    async fn find_by_mentor(&self, mentor_id: &UserId)
        -> Result<Vec<PayoutLedgerEntry>, DomainError>;
}
