//! CallPurchaseHandler - paid one-on-one call checkout.
//!
//! Writes the purchase record, provisions a video room synchronously (the
//! call proceeds roomless if provisioning fails), creates the Call directly
//! in Confirmed status (auto-confirm), and notifies both parties.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::booking::{Call, CallDuration};
use crate::domain::foundation::{PurchaseId, UserId};
use crate::domain::payments::{
    CheckoutEvent, CheckoutMetadata, PurchaseDetail, PurchaseKind, PurchaseRecord, PurchaseTarget,
    WebhookError,
};
use crate::ports::{
    room_expiry_minutes, CallRepository, Clock, CreateRoomRequest, DirectoryReader, Notification,
    NotificationTemplate, Notifier, PurchaseRepository, RoomProvisioner,
};

use super::{save_purchase_tolerating_duplicate, PurchaseHandler};

/// Handles `purpose = call` checkouts.
pub struct CallPurchaseHandler {
    purchases: Arc<dyn PurchaseRepository>,
    calls: Arc<dyn CallRepository>,
    rooms: Arc<dyn RoomProvisioner>,
    notifier: Arc<dyn Notifier>,
    directory: Arc<dyn DirectoryReader>,
    clock: Arc<dyn Clock>,
}

impl CallPurchaseHandler {
    pub fn new(
        purchases: Arc<dyn PurchaseRepository>,
        calls: Arc<dyn CallRepository>,
        rooms: Arc<dyn RoomProvisioner>,
        notifier: Arc<dyn Notifier>,
        directory: Arc<dyn DirectoryReader>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            purchases,
            calls,
            rooms,
            notifier,
            directory,
            clock,
        }
    }

    async fn notify_party(&self, user_id: UserId, call: &Call) {
        let contact = match self.directory.contact(&user_id).await {
            Ok(Some(contact)) => contact,
            Ok(None) => {
                tracing::warn!(user_id = %user_id, call_id = %call.id, "No contact for call notification");
                return;
            }
            Err(err) => {
                tracing::warn!(user_id = %user_id, call_id = %call.id, error = %err, "Contact lookup failed");
                return;
            }
        };
        let notification = Notification::new(
            contact,
            NotificationTemplate::CallConfirmed,
            serde_json::json!({
                "call_id": call.id,
                "scheduled_at": call.scheduled_at,
                "duration_minutes": call.duration.minutes(),
                "room_url": call.room_url,
            }),
        );
        if let Err(err) = self.notifier.send(notification).await {
            tracing::warn!(user_id = %user_id, call_id = %call.id, error = %err, "Call notification failed");
        }
    }
}

#[async_trait]
impl PurchaseHandler for CallPurchaseHandler {
    fn kind(&self) -> PurchaseKind {
        PurchaseKind::Call
    }

    async fn handle(
        &self,
        event: &CheckoutEvent,
        metadata: &CheckoutMetadata,
    ) -> Result<(), WebhookError> {
        let PurchaseDetail::Call {
            call_id,
            mentor_id,
            scheduled_at,
            duration_minutes,
        } = metadata.detail
        else {
            return Err(WebhookError::Handler(
                "call handler received a non-call purchase".to_string(),
            ));
        };
        let duration = CallDuration::try_from_minutes(duration_minutes)
            .map_err(|e| WebhookError::MissingMetadata(e.to_string()))?;
        let now = self.clock.now();

        // 1. Append the purchase record.
        let record = PurchaseRecord::new(
            PurchaseId::new(),
            &event.id,
            metadata.user_id,
            PurchaseTarget::Call { id: call_id },
            metadata.amount,
            &metadata.currency,
            metadata.payment_reference.clone(),
            now,
        );
        save_purchase_tolerating_duplicate(self.purchases.as_ref(), &record).await?;

        // 2. Provision a room; the purchase goes through without one.
        let scheduled_end = scheduled_at.plus_minutes(i64::from(duration.minutes()));
        let room_url = match self
            .rooms
            .create_room(CreateRoomRequest {
                reference: call_id.to_string(),
                max_participants: 2,
                expires_in_minutes: room_expiry_minutes(now, scheduled_end),
                enable_chat: true,
                enable_recording: false,
            })
            .await
        {
            Ok(room) => Some(room.url),
            Err(err) => {
                tracing::warn!(
                    call_id = %call_id,
                    error = %err,
                    "Room provisioning failed; call proceeds without a room"
                );
                None
            }
        };

        // 3. Create the call in Confirmed status (auto-confirm path).
        let call = Call::confirmed(
            call_id,
            metadata.user_id,
            mentor_id,
            scheduled_at,
            duration,
            metadata.amount,
            room_url,
            now,
        );
        self.calls
            .save(&call)
            .await
            .map_err(|e| WebhookError::Database(e.to_string()))?;

        // 4. Notify both parties (fire-and-forget).
        self.notify_party(call.patient_id, &call).await;
        self.notify_party(call.mentor_id, &call).await;

        Ok(())
    }
}
