//! Payment event routing end to end: signature verification, purpose
//! dispatch, idempotent redelivery, and the grant/call/participant writes
//! each purpose produces.

use std::sync::Arc;

use peerbridge::adapters::clock::FixedClock;
use peerbridge::adapters::email::MockNotifier;
use peerbridge::adapters::memory::{
    InMemoryCallRepository, InMemoryCatalog, InMemoryDirectory, InMemoryGroupSessionRepository,
    InMemoryParticipantRepository, InMemoryPayoutLedger, InMemoryPurchaseRepository,
    InMemoryWebhookEventRepository,
};
use peerbridge::adapters::rooms::MockRoomProvisioner;
use peerbridge::adapters::stripe::MockPaymentGateway;
use peerbridge::application::handlers::payments::{
    CallPurchaseHandler, CheckoutResult, IdempotentCheckoutProcessor, PurchaseRouter,
    RecordingPurchaseHandler, SeriesPurchaseHandler, SessionRegistrationHandler,
};
use peerbridge::application::handlers::payouts::PayoutInitiator;
use peerbridge::domain::booking::CallStatus;
use peerbridge::domain::foundation::{
    CallId, GroupSessionId, Money, RecordingId, SeriesId, Timestamp, UserId,
};
use peerbridge::domain::payments::{sign_payload, AccessTarget, CheckoutEventBuilder};
use peerbridge::domain::sessions::GroupSession;
use peerbridge::ports::{
    CallRepository, GroupSessionRepository, ParticipantRepository, PaymentGateway, PayoutAccount,
    PurchaseRepository,
};

const WEBHOOK_SECRET: &str = "whsec_integration_secret";

fn t0() -> Timestamp {
    Timestamp::from_unix_secs(1_717_408_800)
}

struct World {
    gateway: MockPaymentGateway,
    calls: Arc<InMemoryCallRepository>,
    sessions: Arc<InMemoryGroupSessionRepository>,
    participants: Arc<InMemoryParticipantRepository>,
    purchases: Arc<InMemoryPurchaseRepository>,
    catalog: Arc<InMemoryCatalog>,
    directory: Arc<InMemoryDirectory>,
    ledger: Arc<InMemoryPayoutLedger>,
    notifier: MockNotifier,
    processor: IdempotentCheckoutProcessor,
}

fn world() -> World {
    let gateway = MockPaymentGateway::with_secret(WEBHOOK_SECRET);
    let calls = Arc::new(InMemoryCallRepository::new());
    let sessions = Arc::new(InMemoryGroupSessionRepository::new());
    let participants = Arc::new(InMemoryParticipantRepository::new());
    let purchases = Arc::new(InMemoryPurchaseRepository::new());
    let catalog = Arc::new(InMemoryCatalog::new());
    let directory = Arc::new(InMemoryDirectory::new());
    let ledger = Arc::new(InMemoryPayoutLedger::new());
    let notifier = MockNotifier::new();
    let rooms = MockRoomProvisioner::new();
    let clock = Arc::new(FixedClock::at(t0()));

    let payouts = Arc::new(PayoutInitiator::new(
        Arc::new(gateway.clone()),
        ledger.clone(),
        directory.clone(),
    ));
    let router = PurchaseRouter::new(vec![
        Arc::new(RecordingPurchaseHandler::new(
            purchases.clone(),
            catalog.clone(),
            payouts.clone(),
            clock.clone(),
        )),
        Arc::new(SeriesPurchaseHandler::new(
            purchases.clone(),
            catalog.clone(),
            payouts,
            clock.clone(),
        )),
        Arc::new(CallPurchaseHandler::new(
            purchases.clone(),
            calls.clone(),
            Arc::new(rooms),
            Arc::new(notifier.clone()),
            directory.clone(),
            clock.clone(),
        )),
        Arc::new(SessionRegistrationHandler::new(
            purchases.clone(),
            sessions.clone(),
            participants.clone(),
            Arc::new(notifier.clone()),
            directory.clone(),
            clock,
        )),
    ]);
    let processor = IdempotentCheckoutProcessor::new(
        Arc::new(InMemoryWebhookEventRepository::new()),
        router,
    );

    World {
        gateway,
        calls,
        sessions,
        participants,
        purchases,
        catalog,
        directory,
        ledger,
        notifier,
        processor,
    }
}

/// Serializes and signs an event the way the processor would deliver it.
fn signed(event: &peerbridge::domain::payments::CheckoutEvent) -> (String, String) {
    let payload = serde_json::to_string(event).unwrap();
    let timestamp = Timestamp::now().as_unix_secs() as i64;
    let header = format!(
        "t={},v1={}",
        timestamp,
        sign_payload(WEBHOOK_SECRET, timestamp, &payload)
    );
    (payload, header)
}

#[tokio::test]
async fn signed_recording_purchase_grants_access_and_pays_the_seller() {
    let w = world();
    let buyer = UserId::new();
    let seller = UserId::new();
    let recording = RecordingId::new();
    w.catalog.add_recording(recording, seller);
    w.directory
        .set_payout_account(seller, PayoutAccount::verified("acct_seller"));

    let event = CheckoutEventBuilder::new("evt_rec")
        .metadata("purpose", "recording")
        .metadata("user_id", buyer.to_string())
        .metadata("recording_id", recording.to_string())
        .amount_total(1_900)
        .payment_intent("pi_rec")
        .build();
    let (payload, header) = signed(&event);

    let verified = w
        .gateway
        .verify_webhook(payload.as_bytes(), &header)
        .await
        .expect("signature accepted");
    let result = w.processor.process(verified).await.unwrap();

    assert_eq!(result, CheckoutResult::Processed);
    assert!(w
        .purchases
        .has_grant(&buyer, &AccessTarget::Recording { id: recording })
        .await
        .unwrap());
    assert_eq!(w.gateway.transfers().len(), 1);
    assert_eq!(w.gateway.transfers()[0].amount, Money::from_cents(1_425));
    assert_eq!(w.ledger.all().len(), 1);
}

#[tokio::test]
async fn tampered_payload_is_rejected_before_any_processing() {
    let w = world();
    let event = CheckoutEventBuilder::new("evt_tampered")
        .metadata("purpose", "recording")
        .metadata("user_id", UserId::new().to_string())
        .metadata("recording_id", RecordingId::new().to_string())
        .amount_total(1_900)
        .build();
    let (payload, header) = signed(&event);
    let tampered = payload.replace("1900", "1");

    let result = w.gateway.verify_webhook(tampered.as_bytes(), &header).await;

    assert!(result.is_err());
    assert!(w.purchases.all().is_empty());
}

#[tokio::test]
async fn series_purchase_fans_out_across_the_bundle() {
    let w = world();
    let buyer = UserId::new();
    let seller = UserId::new();
    let series = SeriesId::new();
    let recordings = vec![RecordingId::new(), RecordingId::new()];
    w.catalog.add_series(series, seller, recordings.clone());

    let event = CheckoutEventBuilder::new("evt_series")
        .metadata("purpose", "series")
        .metadata("user_id", buyer.to_string())
        .metadata("series_id", series.to_string())
        .amount_total(4_900)
        .build();
    w.processor.process(event).await.unwrap();

    assert!(w
        .purchases
        .has_grant(&buyer, &AccessTarget::Series { id: series })
        .await
        .unwrap());
    for recording in recordings {
        assert!(w
            .purchases
            .has_grant(&buyer, &AccessTarget::Recording { id: recording })
            .await
            .unwrap());
    }
}

#[tokio::test]
async fn call_purchase_creates_a_confirmed_call_with_room() {
    let w = world();
    let patient = UserId::new();
    let mentor = UserId::new();
    let call_id = CallId::new();
    w.directory.add_contact(patient, "Pat Patient");
    w.directory.add_contact(mentor, "Morgan Mentor");

    let event = CheckoutEventBuilder::new("evt_call")
        .metadata("purpose", "call")
        .metadata("user_id", patient.to_string())
        .metadata("call_id", call_id.to_string())
        .metadata("mentor_id", mentor.to_string())
        .metadata("scheduled_at", "2024-06-10T09:00:00Z")
        .metadata("duration_minutes", "60")
        .amount_total(8_000)
        .payment_intent("pi_call")
        .build();
    w.processor.process(event).await.unwrap();

    let call = w.calls.find_by_id(&call_id).await.unwrap().unwrap();
    assert_eq!(call.status, CallStatus::Confirmed);
    assert!(call.room_url.is_some());
    assert_eq!(call.mentor_payout, Money::from_cents(6_000));
    assert_eq!(w.notifier.sent().len(), 2);
}

#[tokio::test]
async fn every_purpose_is_idempotent_under_redelivery() {
    let w = world();
    let buyer = UserId::new();
    let session = GroupSession::create(
        GroupSessionId::new(),
        UserId::new(),
        "Recovery roundtable".to_string(),
        "acl-repair".to_string(),
        t0().plus_days(3),
        60,
        10,
        2,
        Money::from_cents(2_500),
        t0(),
    )
    .unwrap();
    w.sessions.save(&session).await.unwrap();

    let event = CheckoutEventBuilder::new("evt_seat")
        .metadata("purpose", "group_session")
        .metadata("user_id", buyer.to_string())
        .metadata("session_id", session.id.to_string())
        .amount_total(2_500)
        .payment_intent("pi_seat")
        .build();

    let first = w.processor.process(event.clone()).await.unwrap();
    let second = w.processor.process(event).await.unwrap();

    assert_eq!(first, CheckoutResult::Processed);
    assert_eq!(second, CheckoutResult::AlreadyProcessed);
    assert_eq!(w.purchases.all().len(), 1);
    assert_eq!(
        w.participants.count_registered(&session.id).await.unwrap(),
        1
    );
}
