//! SessionRegistrationHandler - paid group-session seat checkout.
//!
//! Writes the purchase record, registers the participant, and notifies them.
//! There is no cancellation semantic here: once the processor confirms the
//! payment our job is to converge state, so an over-capacity registration is
//! logged for reconciliation rather than rejected.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::{ParticipantId, PurchaseId};
use crate::domain::payments::{
    CheckoutEvent, CheckoutMetadata, PurchaseDetail, PurchaseKind, PurchaseRecord, PurchaseTarget,
    WebhookError,
};
use crate::domain::sessions::GroupSessionParticipant;
use crate::ports::{
    Clock, DirectoryReader, GroupSessionRepository, Notification, NotificationTemplate, Notifier,
    ParticipantRepository, PurchaseRepository,
};

use super::{save_purchase_tolerating_duplicate, PurchaseHandler};

/// Handles `purpose = group_session` checkouts.
pub struct SessionRegistrationHandler {
    purchases: Arc<dyn PurchaseRepository>,
    sessions: Arc<dyn GroupSessionRepository>,
    participants: Arc<dyn ParticipantRepository>,
    notifier: Arc<dyn Notifier>,
    directory: Arc<dyn DirectoryReader>,
    clock: Arc<dyn Clock>,
}

impl SessionRegistrationHandler {
    pub fn new(
        purchases: Arc<dyn PurchaseRepository>,
        sessions: Arc<dyn GroupSessionRepository>,
        participants: Arc<dyn ParticipantRepository>,
        notifier: Arc<dyn Notifier>,
        directory: Arc<dyn DirectoryReader>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            purchases,
            sessions,
            participants,
            notifier,
            directory,
            clock,
        }
    }
}

#[async_trait]
impl PurchaseHandler for SessionRegistrationHandler {
    fn kind(&self) -> PurchaseKind {
        PurchaseKind::GroupSession
    }

    async fn handle(
        &self,
        event: &CheckoutEvent,
        metadata: &CheckoutMetadata,
    ) -> Result<(), WebhookError> {
        let PurchaseDetail::GroupSession { session_id } = metadata.detail else {
            return Err(WebhookError::Handler(
                "session handler received a non-session purchase".to_string(),
            ));
        };
        let now = self.clock.now();

        let session = self
            .sessions
            .find_by_id(&session_id)
            .await?
            .ok_or_else(|| {
                WebhookError::Handler(format!("Group session {} not found", session_id))
            })?;

        // 1. Append the purchase record.
        let record = PurchaseRecord::new(
            PurchaseId::new(),
            &event.id,
            metadata.user_id,
            PurchaseTarget::GroupSession { id: session_id },
            metadata.amount,
            &metadata.currency,
            metadata.payment_reference.clone(),
            now,
        );
        save_purchase_tolerating_duplicate(self.purchases.as_ref(), &record).await?;

        // 2. Register the participant. Money has already moved, so capacity
        // overflow is a reconciliation warning, not a rejection.
        let registered = self.participants.count_registered(&session_id).await?;
        if registered >= session.capacity {
            tracing::warn!(
                session_id = %session_id,
                registered,
                capacity = session.capacity,
                "Registration past capacity; recording for manual reconciliation"
            );
        }
        let participant = GroupSessionParticipant::register(
            ParticipantId::new(),
            session_id,
            metadata.user_id,
            metadata.amount,
            metadata.payment_reference.clone(),
            now,
        );
        self.participants.save(&participant).await?;

        // 3. Notify the participant (fire-and-forget).
        match self.directory.contact(&metadata.user_id).await {
            Ok(Some(contact)) => {
                let notification = Notification::new(
                    contact,
                    NotificationTemplate::GroupSessionSeatRegistered,
                    serde_json::json!({
                        "session_id": session.id,
                        "title": session.title,
                        "scheduled_at": session.scheduled_at,
                        "amount_paid": metadata.amount,
                    }),
                );
                if let Err(err) = self.notifier.send(notification).await {
                    tracing::warn!(
                        session_id = %session_id,
                        user_id = %metadata.user_id,
                        error = %err,
                        "Seat registration notification failed"
                    );
                }
            }
            Ok(None) => {
                tracing::warn!(user_id = %metadata.user_id, "No contact for registration notification");
            }
            Err(err) => {
                tracing::warn!(user_id = %metadata.user_id, error = %err, "Contact lookup failed");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::email::MockNotifier;
    use crate::adapters::memory::{
        InMemoryDirectory, InMemoryGroupSessionRepository, InMemoryParticipantRepository,
        InMemoryPurchaseRepository,
    };
    use crate::domain::foundation::{GroupSessionId, Money, Timestamp, UserId};
    use crate::domain::payments::CheckoutEventBuilder;
    use crate::domain::sessions::{GroupSession, ParticipantStatus};

    fn now() -> Timestamp {
        Timestamp::from_unix_secs(1_717_408_800)
    }

    struct Fixture {
        purchases: Arc<InMemoryPurchaseRepository>,
        sessions: Arc<InMemoryGroupSessionRepository>,
        participants: Arc<InMemoryParticipantRepository>,
        notifier: MockNotifier,
        directory: Arc<InMemoryDirectory>,
        handler: SessionRegistrationHandler,
    }

    fn fixture() -> Fixture {
        let purchases = Arc::new(InMemoryPurchaseRepository::new());
        let sessions = Arc::new(InMemoryGroupSessionRepository::new());
        let participants = Arc::new(InMemoryParticipantRepository::new());
        let notifier = MockNotifier::new();
        let directory = Arc::new(InMemoryDirectory::new());
        let handler = SessionRegistrationHandler::new(
            purchases.clone(),
            sessions.clone(),
            participants.clone(),
            Arc::new(notifier.clone()),
            directory.clone(),
            Arc::new(FixedClock::at(now())),
        );
        Fixture {
            purchases,
            sessions,
            participants,
            notifier,
            directory,
            handler,
        }
    }

    async fn seed_session(f: &Fixture, capacity: u32) -> GroupSession {
        let session = GroupSession::create(
            GroupSessionId::new(),
            UserId::new(),
            "Recovering together".to_string(),
            "acl-repair".to_string(),
            now().plus_days(3),
            60,
            capacity,
            2,
            Money::from_cents(2_500),
            now(),
        )
        .unwrap();
        f.sessions.save(&session).await.unwrap();
        session
    }

    fn event(buyer: UserId, session_id: GroupSessionId) -> CheckoutEvent {
        CheckoutEventBuilder::new("evt_seat")
            .metadata("purpose", "group_session")
            .metadata("user_id", buyer.to_string())
            .metadata("session_id", session_id.to_string())
            .amount_total(2_500)
            .payment_intent("pi_seat")
            .build()
    }

    #[tokio::test]
    async fn registers_participant_and_notifies() {
        let f = fixture();
        let session = seed_session(&f, 10).await;
        let buyer = UserId::new();
        f.directory.add_contact(buyer, "Sam Seeker");

        let event = event(buyer, session.id);
        let metadata = event.purchase_metadata().unwrap();
        f.handler.handle(&event, &metadata).await.unwrap();

        let rows = f.participants.find_by_session(&session.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, ParticipantStatus::Registered);
        assert_eq!(rows[0].amount_paid, Money::from_cents(2_500));
        assert_eq!(rows[0].payment_reference.as_deref(), Some("pi_seat"));

        assert_eq!(f.purchases.all().len(), 1);
        assert_eq!(
            f.notifier
                .sent_with_template(NotificationTemplate::GroupSessionSeatRegistered)
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn missing_session_fails_the_handler() {
        let f = fixture();
        let event = event(UserId::new(), GroupSessionId::new());
        let metadata = event.purchase_metadata().unwrap();

        let result = f.handler.handle(&event, &metadata).await;

        assert!(matches!(result, Err(WebhookError::Handler(_))));
        assert!(f.purchases.all().is_empty());
    }

    #[tokio::test]
    async fn over_capacity_registration_is_recorded_anyway() {
        let f = fixture();
        let session = seed_session(&f, 2).await;
        for _ in 0..2 {
            let p = GroupSessionParticipant::register(
                ParticipantId::new(),
                session.id,
                UserId::new(),
                Money::from_cents(2_500),
                Some("pi_x".to_string()),
                now(),
            );
            f.participants.save(&p).await.unwrap();
        }

        let event = event(UserId::new(), session.id);
        let metadata = event.purchase_metadata().unwrap();
        f.handler.handle(&event, &metadata).await.unwrap();

        assert_eq!(
            f.participants.count_registered(&session.id).await.unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn notification_failure_keeps_the_registration() {
        let f = fixture();
        let session = seed_session(&f, 10).await;
        let buyer = UserId::new();
        f.directory.add_contact(buyer, "Sam Seeker");
        f.notifier.fail_sends();

        let event = event(buyer, session.id);
        let metadata = event.purchase_metadata().unwrap();
        f.handler.handle(&event, &metadata).await.unwrap();

        assert_eq!(
            f.participants.count_registered(&session.id).await.unwrap(),
            1
        );
    }
}
