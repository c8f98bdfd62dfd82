//! Session lifecycle engine: three independent, order-independent passes
//! driven by a periodic external trigger.

mod auto_completion;
mod engine;
mod minimum_attendance;
mod reminders;

pub use engine::{
    LifecycleEngine, RunSummary, COMPLETION_GRACE_MINUTES, DAY_REMINDER_FROM_HOURS,
    DAY_REMINDER_TO_HOURS, HOUR_REMINDER_FROM_MINUTES, HOUR_REMINDER_TO_MINUTES,
    MINIMUM_CHECK_FROM_HOURS, MINIMUM_CHECK_TO_HOURS,
};

/// Shared fixture for the pass test modules: one engine over in-memory
/// adapters, mock external services, and a pinned clock.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use crate::adapters::clock::FixedClock;
    use crate::adapters::email::MockNotifier;
    use crate::adapters::memory::{
        InMemoryDirectory, InMemoryGroupSessionRepository, InMemoryParticipantRepository,
        InMemoryPayoutLedger,
    };
    use crate::adapters::rooms::MockRoomProvisioner;
    use crate::adapters::stripe::MockPaymentGateway;
    use crate::application::handlers::payouts::PayoutInitiator;
    use crate::domain::foundation::{
        GroupSessionId, Money, ParticipantId, Timestamp, UserId,
    };
    use crate::domain::sessions::{GroupSession, GroupSessionParticipant};
    use crate::ports::{GroupSessionRepository, ParticipantRepository, PayoutAccount};

    use super::LifecycleEngine;

    pub(crate) fn base_now() -> Timestamp {
        Timestamp::from_unix_secs(1_717_408_800) // 2024-06-03T10:00:00Z
    }

    pub(crate) struct Fixture {
        pub sessions: Arc<InMemoryGroupSessionRepository>,
        pub participants: Arc<InMemoryParticipantRepository>,
        pub gateway: MockPaymentGateway,
        pub rooms: MockRoomProvisioner,
        pub notifier: MockNotifier,
        pub directory: Arc<InMemoryDirectory>,
        pub ledger: Arc<InMemoryPayoutLedger>,
        pub clock: Arc<FixedClock>,
        pub engine: LifecycleEngine,
    }

    pub(crate) fn fixture() -> Fixture {
        let sessions = Arc::new(InMemoryGroupSessionRepository::new());
        let participants = Arc::new(InMemoryParticipantRepository::new());
        let gateway = MockPaymentGateway::new();
        let rooms = MockRoomProvisioner::new();
        let notifier = MockNotifier::new();
        let directory = Arc::new(InMemoryDirectory::new());
        let ledger = Arc::new(InMemoryPayoutLedger::new());
        let clock = Arc::new(FixedClock::at(base_now()));
        let payouts = Arc::new(PayoutInitiator::new(
            Arc::new(gateway.clone()),
            ledger.clone(),
            directory.clone(),
        ));
        let engine = LifecycleEngine::new(
            sessions.clone(),
            participants.clone(),
            Arc::new(gateway.clone()),
            Arc::new(rooms.clone()),
            Arc::new(notifier.clone()),
            directory.clone(),
            payouts,
            clock.clone(),
        );
        Fixture {
            sessions,
            participants,
            gateway,
            rooms,
            notifier,
            directory,
            ledger,
            clock,
            engine,
        }
    }

    /// Seeds a Scheduled 60-minute session at an arbitrary instant, the way
    /// a repository row would look (creation policy does not apply to rows
    /// already in the store).
    pub(crate) async fn seed_session(
        f: &Fixture,
        scheduled_at: Timestamp,
        min_attendees: u32,
    ) -> GroupSession {
        let mentor = UserId::new();
        f.directory.add_contact(mentor, "Morgan Mentor");

        let mut session = GroupSession::create(
            GroupSessionId::new(),
            mentor,
            "Life after surgery".to_string(),
            "hip-replacement".to_string(),
            base_now().plus_days(30),
            60,
            12,
            min_attendees,
            Money::from_cents(2_500),
            base_now(),
        )
        .unwrap();
        session.scheduled_at = scheduled_at;
        f.sessions.save(&session).await.unwrap();
        session
    }

    /// Moves a seeded session into the Confirmed-with-room state the
    /// minimum-attendance pass would have produced.
    pub(crate) async fn confirm_with_room(f: &Fixture, session: &GroupSession) {
        let mut session = f
            .sessions
            .find_by_id(&session.id)
            .await
            .unwrap()
            .expect("seeded session");
        session
            .confirm(format!("https://rooms.example/{}", session.id), base_now())
            .unwrap();
        session.mark_minimum_checked(base_now()).unwrap();
        f.sessions.update(&session).await.unwrap();
    }

    /// Registers a paid participant with a contact on file.
    pub(crate) async fn seed_participant(
        f: &Fixture,
        session: &GroupSession,
        amount_cents: i64,
        payment_reference: &str,
    ) -> GroupSessionParticipant {
        let user = UserId::new();
        f.directory.add_contact(user, "Pat Participant");

        let reference = (amount_cents > 0).then(|| payment_reference.to_string());
        let participant = GroupSessionParticipant::register(
            ParticipantId::new(),
            session.id,
            user,
            Money::from_cents(amount_cents),
            reference,
            base_now(),
        );
        f.participants.save(&participant).await.unwrap();
        participant
    }

    /// Gives the session's mentor a verified payout destination.
    pub(crate) fn verify_mentor_payout(f: &Fixture, session: &GroupSession) {
        f.directory
            .set_payout_account(session.mentor_id, PayoutAccount::verified("acct_mentor"));
    }
}
