//! PayoutInitiator - revenue-split transfers with an always-written ledger.
//!
//! Wraps the payment gateway's transfer call with the platform's 75/25
//! split. For every *attempted* transfer a ledger row is persisted whether
//! the transfer succeeded or not, so a failed payout becomes reconciliation
//! work instead of lost money. Transfers are only attempted when the payout
//! is positive and the seller has a verified destination.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, Money, RevenueSplit, Timestamp, UserId};
use crate::domain::payments::{PayoutLedgerEntry, PayoutSource};
use crate::ports::{CreateTransferRequest, DirectoryReader, PaymentGateway, PayoutLedger};

/// Currency used for payouts until multi-currency sellers exist.
pub const PAYOUT_CURRENCY: &str = "usd";

/// What happened to a payout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutDisposition {
    /// Transfer accepted; ledger row written.
    Transferred { transfer_reference: String },

    /// Transfer attempted and failed; ledger row written for reconciliation.
    TransferFailed { error: String },

    /// Nothing to pay out (zero mentor share).
    SkippedZeroAmount,

    /// Seller has no payout destination configured.
    SkippedNoDestination,

    /// Seller's destination exists but is not verified.
    SkippedUnverified,
}

/// Initiates revenue-split payouts.
pub struct PayoutInitiator {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn PayoutLedger>,
    directory: Arc<dyn DirectoryReader>,
}

impl PayoutInitiator {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<dyn PayoutLedger>,
        directory: Arc<dyn DirectoryReader>,
    ) -> Self {
        Self {
            gateway,
            ledger,
            directory,
        }
    }

    /// Initiates the payout for one revenue event.
    ///
    /// Never reverts or retries; the returned disposition says what happened.
    ///
    /// # Errors
    ///
    /// Only datastore failures (directory lookup, ledger write) propagate.
    /// Gateway failures are captured in the ledger row and disposition.
    pub async fn initiate(
        &self,
        seller_id: UserId,
        source: PayoutSource,
        gross: Money,
        now: Timestamp,
    ) -> Result<PayoutDisposition, DomainError> {
        let payout = RevenueSplit::STANDARD.mentor_share(gross);
        if !payout.is_positive() {
            tracing::debug!(seller_id = %seller_id, "Skipping payout: zero amount");
            return Ok(PayoutDisposition::SkippedZeroAmount);
        }

        let account = match self.directory.payout_account(&seller_id).await? {
            Some(account) => account,
            None => {
                tracing::info!(
                    seller_id = %seller_id,
                    "Skipping payout: no destination configured"
                );
                return Ok(PayoutDisposition::SkippedNoDestination);
            }
        };
        if !account.verified {
            tracing::info!(
                seller_id = %seller_id,
                "Skipping payout: destination not verified"
            );
            return Ok(PayoutDisposition::SkippedUnverified);
        }

        let (source_kind, source_id) = source_key(&source);
        let request = CreateTransferRequest {
            destination_account: account.account_reference,
            amount: payout,
            currency: PAYOUT_CURRENCY.to_string(),
            idempotency_key: Some(format!("payout-{}-{}", source_kind, source_id)),
            metadata: HashMap::from([
                ("seller_id".to_string(), seller_id.to_string()),
                ("source_kind".to_string(), source_kind.to_string()),
                ("source_id".to_string(), source_id.clone()),
            ]),
        };

        let (entry, disposition) = match self.gateway.create_transfer(request).await {
            Ok(transfer) => (
                PayoutLedgerEntry::transferred(
                    seller_id, source, gross, payout, &transfer.id, now,
                ),
                PayoutDisposition::Transferred {
                    transfer_reference: transfer.id,
                },
            ),
            Err(err) => {
                tracing::warn!(
                    seller_id = %seller_id,
                    source_kind,
                    source_id = %source_id,
                    error = %err,
                    "Payout transfer failed; ledger row written for reconciliation"
                );
                (
                    PayoutLedgerEntry::transfer_failed(
                        seller_id,
                        source,
                        gross,
                        payout,
                        err.to_string(),
                        now,
                    ),
                    PayoutDisposition::TransferFailed {
                        error: err.to_string(),
                    },
                )
            }
        };

        self.ledger.record(&entry).await?;
        Ok(disposition)
    }
}

fn source_key(source: &PayoutSource) -> (&'static str, String) {
    match source {
        PayoutSource::Call { id } => ("call", id.to_string()),
        PayoutSource::GroupSession { id } => ("group_session", id.to_string()),
        PayoutSource::Recording { id } => ("recording", id.to_string()),
        PayoutSource::Series { id } => ("series", id.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryDirectory, InMemoryPayoutLedger};
    use crate::adapters::stripe::MockPaymentGateway;
    use crate::domain::foundation::GroupSessionId;
    use crate::ports::PayoutAccount;

    fn now() -> Timestamp {
        Timestamp::from_unix_secs(1_717_408_800)
    }

    fn source() -> PayoutSource {
        PayoutSource::GroupSession {
            id: GroupSessionId::new(),
        }
    }

    struct Fixture {
        gateway: MockPaymentGateway,
        ledger: Arc<InMemoryPayoutLedger>,
        directory: Arc<InMemoryDirectory>,
        initiator: PayoutInitiator,
    }

    fn fixture() -> Fixture {
        let gateway = MockPaymentGateway::new();
        let ledger = Arc::new(InMemoryPayoutLedger::new());
        let directory = Arc::new(InMemoryDirectory::new());
        let initiator = PayoutInitiator::new(
            Arc::new(gateway.clone()),
            ledger.clone(),
            directory.clone(),
        );
        Fixture {
            gateway,
            ledger,
            directory,
            initiator,
        }
    }

    #[tokio::test]
    async fn transfers_the_mentor_share_and_writes_ledger() {
        let f = fixture();
        let seller = UserId::new();
        f.directory
            .set_payout_account(seller, PayoutAccount::verified("acct_1"));

        let disposition = f
            .initiator
            .initiate(seller, source(), Money::from_cents(10_000), now())
            .await
            .unwrap();

        assert!(matches!(disposition, PayoutDisposition::Transferred { .. }));

        let transfers = f.gateway.transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].amount, Money::from_cents(7_500));
        assert_eq!(transfers[0].destination_account, "acct_1");
        assert!(transfers[0].idempotency_key.as_deref().unwrap().starts_with("payout-group_session-"));

        let entries = f.ledger.all();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].settled());
        assert_eq!(entries[0].gross, Money::from_cents(10_000));
        assert_eq!(entries[0].payout, Money::from_cents(7_500));
    }

    #[tokio::test]
    async fn failed_transfer_still_writes_a_ledger_row() {
        let f = fixture();
        let seller = UserId::new();
        f.directory
            .set_payout_account(seller, PayoutAccount::verified("acct_1"));
        f.gateway.fail_transfers();

        let disposition = f
            .initiator
            .initiate(seller, source(), Money::from_cents(10_000), now())
            .await
            .unwrap();

        assert!(matches!(
            disposition,
            PayoutDisposition::TransferFailed { .. }
        ));
        let entries = f.ledger.all();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].settled());
        assert_eq!(entries[0].payout, Money::from_cents(7_500));
    }

    #[tokio::test]
    async fn zero_share_skips_gateway_and_ledger() {
        let f = fixture();
        let seller = UserId::new();
        f.directory
            .set_payout_account(seller, PayoutAccount::verified("acct_1"));

        let disposition = f
            .initiator
            .initiate(seller, source(), Money::ZERO, now())
            .await
            .unwrap();

        assert_eq!(disposition, PayoutDisposition::SkippedZeroAmount);
        assert!(f.gateway.transfers().is_empty());
        assert!(f.ledger.all().is_empty());
    }

    #[tokio::test]
    async fn missing_destination_skips_transfer() {
        let f = fixture();
        let disposition = f
            .initiator
            .initiate(UserId::new(), source(), Money::from_cents(10_000), now())
            .await
            .unwrap();

        assert_eq!(disposition, PayoutDisposition::SkippedNoDestination);
        assert!(f.gateway.transfers().is_empty());
        assert!(f.ledger.all().is_empty());
    }

    #[tokio::test]
    async fn unverified_destination_skips_transfer() {
        let f = fixture();
        let seller = UserId::new();
        f.directory
            .set_payout_account(seller, PayoutAccount::unverified("acct_1"));

        let disposition = f
            .initiator
            .initiate(seller, source(), Money::from_cents(10_000), now())
            .await
            .unwrap();

        assert_eq!(disposition, PayoutDisposition::SkippedUnverified);
        assert!(f.gateway.transfers().is_empty());
        assert!(f.ledger.all().is_empty());
    }
}
