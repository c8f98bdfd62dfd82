//! RecordingPurchaseHandler - single-recording checkout.
//!
//! Writes the purchase record and access grant, then initiates the seller's
//! revenue-split payout. Payout failure never reverts the grant.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::handlers::payouts::PayoutInitiator;
use crate::domain::foundation::PurchaseId;
use crate::domain::payments::{
    AccessGrant, CheckoutEvent, CheckoutMetadata, PayoutSource, PurchaseDetail, PurchaseKind,
    PurchaseRecord, PurchaseTarget, WebhookError,
};
use crate::ports::{CatalogReader, Clock, PurchaseRepository};

use super::{save_purchase_tolerating_duplicate, PurchaseHandler};

/// Handles `purpose = recording` checkouts.
pub struct RecordingPurchaseHandler {
    purchases: Arc<dyn PurchaseRepository>,
    catalog: Arc<dyn CatalogReader>,
    payouts: Arc<PayoutInitiator>,
    clock: Arc<dyn Clock>,
}

impl RecordingPurchaseHandler {
    pub fn new(
        purchases: Arc<dyn PurchaseRepository>,
        catalog: Arc<dyn CatalogReader>,
        payouts: Arc<PayoutInitiator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            purchases,
            catalog,
            payouts,
            clock,
        }
    }
}

#[async_trait]
impl PurchaseHandler for RecordingPurchaseHandler {
    fn kind(&self) -> PurchaseKind {
        PurchaseKind::Recording
    }

    async fn handle(
        &self,
        event: &CheckoutEvent,
        metadata: &CheckoutMetadata,
    ) -> Result<(), WebhookError> {
        let PurchaseDetail::Recording { recording_id } = metadata.detail else {
            return Err(WebhookError::Handler(
                "recording handler received a non-recording purchase".to_string(),
            ));
        };
        let now = self.clock.now();

        // 1. Append the purchase record.
        let record = PurchaseRecord::new(
            PurchaseId::new(),
            &event.id,
            metadata.user_id,
            PurchaseTarget::Recording { id: recording_id },
            metadata.amount,
            &metadata.currency,
            metadata.payment_reference.clone(),
            now,
        );
        save_purchase_tolerating_duplicate(self.purchases.as_ref(), &record).await?;

        // 2. Grant access (upsert).
        self.purchases
            .grant_access(&AccessGrant::recording(metadata.user_id, recording_id, now))
            .await?;

        // 3. Best-effort payout; the grant stands regardless.
        match self.catalog.recording_seller(&recording_id).await? {
            Some(seller) => {
                if let Err(err) = self
                    .payouts
                    .initiate(
                        seller,
                        PayoutSource::Recording { id: recording_id },
                        metadata.amount,
                        now,
                    )
                    .await
                {
                    tracing::warn!(
                        event_id = %event.id,
                        recording_id = %recording_id,
                        error = %err,
                        "Recording payout bookkeeping failed; access grant stands"
                    );
                }
            }
            None => {
                tracing::warn!(
                    event_id = %event.id,
                    recording_id = %recording_id,
                    "Recording has no seller on file; skipping payout"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::memory::{
        InMemoryCatalog, InMemoryDirectory, InMemoryPayoutLedger, InMemoryPurchaseRepository,
    };
    use crate::adapters::stripe::MockPaymentGateway;
    use crate::domain::foundation::{Money, RecordingId, Timestamp, UserId};
    use crate::domain::payments::{AccessTarget, CheckoutEventBuilder};
    use crate::ports::PayoutAccount;

    fn now() -> Timestamp {
        Timestamp::from_unix_secs(1_717_408_800)
    }

    struct Fixture {
        purchases: Arc<InMemoryPurchaseRepository>,
        catalog: Arc<InMemoryCatalog>,
        directory: Arc<InMemoryDirectory>,
        gateway: MockPaymentGateway,
        ledger: Arc<InMemoryPayoutLedger>,
        handler: RecordingPurchaseHandler,
    }

    fn fixture() -> Fixture {
        let purchases = Arc::new(InMemoryPurchaseRepository::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let directory = Arc::new(InMemoryDirectory::new());
        let gateway = MockPaymentGateway::new();
        let ledger = Arc::new(InMemoryPayoutLedger::new());
        let payouts = Arc::new(PayoutInitiator::new(
            Arc::new(gateway.clone()),
            ledger.clone(),
            directory.clone(),
        ));
        let handler = RecordingPurchaseHandler::new(
            purchases.clone(),
            catalog.clone(),
            payouts,
            Arc::new(FixedClock::at(now())),
        );
        Fixture {
            purchases,
            catalog,
            directory,
            gateway,
            ledger,
            handler,
        }
    }

    fn event(buyer: UserId, recording: RecordingId) -> CheckoutEvent {
        CheckoutEventBuilder::new("evt_rec")
            .metadata("purpose", "recording")
            .metadata("user_id", buyer.to_string())
            .metadata("recording_id", recording.to_string())
            .amount_total(1_500)
            .payment_intent("pi_rec")
            .build()
    }

    #[tokio::test]
    async fn writes_record_grant_and_payout() {
        let f = fixture();
        let buyer = UserId::new();
        let seller = UserId::new();
        let recording = RecordingId::new();
        f.catalog.add_recording(recording, seller);
        f.directory
            .set_payout_account(seller, PayoutAccount::verified("acct_s"));

        let event = event(buyer, recording);
        let metadata = event.purchase_metadata().unwrap();
        f.handler.handle(&event, &metadata).await.unwrap();

        let records = f.purchases.all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, Money::from_cents(1_500));

        assert!(f
            .purchases
            .has_grant(&buyer, &AccessTarget::Recording { id: recording })
            .await
            .unwrap());

        let transfers = f.gateway.transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].amount, Money::from_cents(1_125)); // 75% of 1500
        assert_eq!(f.ledger.all().len(), 1);
    }

    #[tokio::test]
    async fn payout_failure_does_not_revert_the_grant() {
        let f = fixture();
        let buyer = UserId::new();
        let seller = UserId::new();
        let recording = RecordingId::new();
        f.catalog.add_recording(recording, seller);
        f.directory
            .set_payout_account(seller, PayoutAccount::verified("acct_s"));
        f.gateway.fail_transfers();

        let event = event(buyer, recording);
        let metadata = event.purchase_metadata().unwrap();
        f.handler.handle(&event, &metadata).await.unwrap();

        assert!(f
            .purchases
            .has_grant(&buyer, &AccessTarget::Recording { id: recording })
            .await
            .unwrap());
        // The failed attempt is on the ledger for reconciliation.
        assert_eq!(f.ledger.all().len(), 1);
        assert!(!f.ledger.all()[0].settled());
    }

    #[tokio::test]
    async fn unknown_seller_skips_payout_but_grants_access() {
        let f = fixture();
        let buyer = UserId::new();
        let recording = RecordingId::new();

        let event = event(buyer, recording);
        let metadata = event.purchase_metadata().unwrap();
        f.handler.handle(&event, &metadata).await.unwrap();

        assert!(f
            .purchases
            .has_grant(&buyer, &AccessTarget::Recording { id: recording })
            .await
            .unwrap());
        assert!(f.gateway.transfers().is_empty());
    }

    #[tokio::test]
    async fn replayed_handle_is_idempotent() {
        let f = fixture();
        let buyer = UserId::new();
        let recording = RecordingId::new();

        let event = event(buyer, recording);
        let metadata = event.purchase_metadata().unwrap();
        f.handler.handle(&event, &metadata).await.unwrap();
        f.handler.handle(&event, &metadata).await.unwrap();

        assert_eq!(f.purchases.all().len(), 1);
        assert_eq!(f.purchases.grant_count(), 1);
    }
}
