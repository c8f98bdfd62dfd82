//! SeriesPurchaseHandler - recording-series (bundle) checkout.
//!
//! Like the single-recording handler, plus a fan-out of access grants across
//! every recording the series bundles. All grants are upserts, so replays
//! and overlapping single-recording purchases never error.

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

/// Handles `purpose = series` checkouts.
pub struct SeriesPurchaseHandler {
    purchases: Arc<dyn PurchaseRepository>,
    catalog: Arc<dyn CatalogReader>,
    payouts: Arc<PayoutInitiator>,
    clock: Arc<dyn Clock>,
}

impl SeriesPurchaseHandler {
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
impl PurchaseHandler for SeriesPurchaseHandler {
    fn kind(&self) -> PurchaseKind {
        PurchaseKind::Series
    }

    async fn handle(
        &self,
        event: &CheckoutEvent,
        metadata: &CheckoutMetadata,
    ) -> Result<(), WebhookError> {
        let PurchaseDetail::Series { series_id } = metadata.detail else {
            return Err(WebhookError::Handler(
                "series handler received a non-series purchase".to_string(),
            ));
        };
        let now = self.clock.now();

        // 1. Append the purchase record.
        let record = PurchaseRecord::new(
            PurchaseId::new(),
            &event.id,
            metadata.user_id,
            PurchaseTarget::Series { id: series_id },
            metadata.amount,
            &metadata.currency,
            metadata.payment_reference.clone(),
            now,
        );
        save_purchase_tolerating_duplicate(self.purchases.as_ref(), &record).await?;

        // 2. Series-level grant plus fan-out across every bundled recording.
        self.purchases
            .grant_access(&AccessGrant::series(metadata.user_id, series_id, now))
            .await?;
        for recording_id in self.catalog.series_recordings(&series_id).await? {
            self.purchases
                .grant_access(&AccessGrant::recording(metadata.user_id, recording_id, now))
                .await?;
        }

        // 3. Best-effort payout; grants stand regardless.
        match self.catalog.series_seller(&series_id).await? {
            Some(seller) => {
                if let Err(err) = self
                    .payouts
                    .initiate(
                        seller,
                        PayoutSource::Series { id: series_id },
                        metadata.amount,
                        now,
                    )
                    .await
                {
                    tracing::warn!(
                        event_id = %event.id,
                        series_id = %series_id,
                        error = %err,
                        "Series payout bookkeeping failed; access grants stand"
                    );
                }
            }
            None => {
                tracing::warn!(
                    event_id = %event.id,
                    series_id = %series_id,
                    "Series has no seller on file; skipping payout"
                );
            }
        }

        Ok(())
    }
}
