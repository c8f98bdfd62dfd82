//! Auto-completion pass.
//!
//! Scans every Confirmed session (no time filter at the query level) and
//! completes those whose computed end is at least 30 minutes in the past:
//! sum the payments of Registered/Attended participants, mark the session
//! Completed, flip Registered participants to Attended, and initiate the
//! mentor's 75% payout. The transition to Completed commits before the
//! payout is attempted and is never reverted by a payout failure.

use chrono::Duration;

use crate::domain::foundation::{DomainError, Money, Timestamp};
use crate::domain::payments::PayoutSource;
use crate::domain::sessions::{GroupSession, ParticipantStatus};

use super::engine::{LifecycleEngine, RunSummary, COMPLETION_GRACE_MINUTES};

const PASS: &str = "auto_completion";

impl LifecycleEngine {
    pub(super) async fn run_auto_completion(&self, now: Timestamp, summary: &mut RunSummary) {
        let sessions = match self.sessions.find_confirmed().await {
            Ok(sessions) => sessions,
            Err(err) => {
                summary.record_error(PASS, "query", err);
                return;
            }
        };

        for mut session in sessions {
            let past_end = now.duration_since(&session.end_at());
            if past_end < Duration::minutes(COMPLETION_GRACE_MINUTES) {
                continue;
            }
            if let Err(err) = self.complete_session(&mut session, now, summary).await {
                summary.record_error(PASS, format!("session {}", session.id), err);
            }
        }
    }

    async fn complete_session(
        &self,
        session: &mut GroupSession,
        now: Timestamp,
        summary: &mut RunSummary,
    ) -> Result<(), DomainError> {
        let participants = self.participants.find_by_session(&session.id).await?;
        let gross: Money = participants
            .iter()
            .filter(|p| {
                matches!(
                    p.status,
                    ParticipantStatus::Registered | ParticipantStatus::Attended
                )
            })
            .map(|p| p.amount_paid)
            .sum();

        // Authoritative state first: the session is Completed even if every
        // step below fails.
        session.complete(now)?;
        self.sessions.update(session).await?;
        summary.completed += 1;
        tracing::info!(
            session_id = %session.id,
            gross_cents = gross.cents(),
            "Group session auto-completed"
        );

        for participant in participants {
            if participant.status != ParticipantStatus::Registered {
                continue;
            }
            let mut participant = participant;
            match participant.mark_attended(now) {
                Ok(()) => {
                    if let Err(err) = self.participants.update(&participant).await {
                        summary.record_error(
                            PASS,
                            format!("participant {} attendance", participant.id),
                            err,
                        );
                    }
                }
                Err(err) => {
                    summary.record_error(
                        PASS,
                        format!("participant {} attendance", participant.id),
                        err,
                    );
                }
            }
        }

        // Best-effort payout; the initiator skips zero amounts and
        // unverified destinations, and ledgers failed transfers.
        if let Err(err) = self
            .payouts
            .initiate(
                session.mentor_id,
                PayoutSource::GroupSession { id: session.id },
                gross,
                now,
            )
            .await
        {
            summary.record_error(PASS, format!("session {} payout", session.id), err);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{
        base_now, confirm_with_room, fixture, seed_participant, seed_session, verify_mentor_payout,
    };
    use crate::domain::foundation::Money;
    use crate::domain::sessions::{GroupSessionStatus, ParticipantStatus};
    use crate::ports::{GroupSessionRepository, ParticipantRepository};

    #[tokio::test]
    async fn completes_session_ended_beyond_grace_and_pays_mentor() {
        let f = fixture();
        // 60-minute session that started 2 hours ago: ended 60 minutes ago.
        let session = seed_session(&f, base_now().minus_hours(2), 2).await;
        confirm_with_room(&f, &session).await;
        verify_mentor_payout(&f, &session);
        seed_participant(&f, &session, 2_500, "pi_1").await;
        seed_participant(&f, &session, 2_500, "pi_2").await;

        let summary = f.engine.run().await.unwrap();

        assert_eq!(summary.completed, 1);
        assert!(summary.errors.is_empty());

        let stored = f.sessions.find_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.status, GroupSessionStatus::Completed);

        let rows = f.participants.find_by_session(&session.id).await.unwrap();
        assert!(rows.iter().all(|p| p.status == ParticipantStatus::Attended));

        // 75% of 5000.
        let transfers = f.gateway.transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].amount, Money::from_cents(3_750));

        let entries = f.ledger.all();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].settled());
        assert_eq!(entries[0].gross, Money::from_cents(5_000));
    }

    #[tokio::test]
    async fn recently_ended_sessions_wait_for_the_grace_period() {
        let f = fixture();
        // 60-minute session that started 85 minutes ago: ended 25 minutes
        // ago, inside the 30-minute grace.
        let session = seed_session(&f, base_now().minus_minutes(85), 2).await;
        confirm_with_room(&f, &session).await;
        seed_participant(&f, &session, 2_500, "pi_1").await;

        let summary = f.engine.run().await.unwrap();

        assert_eq!(summary.completed, 0);
        let stored = f.sessions.find_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.status, GroupSessionStatus::Confirmed);

        // 6 more minutes puts the end 31 minutes in the past.
        f.clock.advance_minutes(6);
        let summary = f.engine.run().await.unwrap();
        assert_eq!(summary.completed, 1);
    }

    #[tokio::test]
    async fn transfer_failure_never_reverts_completion() {
        let f = fixture();
        let session = seed_session(&f, base_now().minus_hours(2), 2).await;
        confirm_with_room(&f, &session).await;
        verify_mentor_payout(&f, &session);
        seed_participant(&f, &session, 4_000, "pi_1").await;
        f.gateway.fail_transfers();

        let summary = f.engine.run().await.unwrap();

        assert_eq!(summary.completed, 1);
        let stored = f.sessions.find_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.status, GroupSessionStatus::Completed);

        // Failed transfer is on the ledger for reconciliation.
        let entries = f.ledger.all();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].settled());
        assert_eq!(entries[0].payout, Money::from_cents(3_000));
    }

    #[tokio::test]
    async fn free_sessions_complete_without_a_transfer() {
        let f = fixture();
        let session = seed_session(&f, base_now().minus_hours(2), 2).await;
        confirm_with_room(&f, &session).await;
        verify_mentor_payout(&f, &session);
        seed_participant(&f, &session, 0, "pi_free").await;

        let summary = f.engine.run().await.unwrap();

        assert_eq!(summary.completed, 1);
        assert!(f.gateway.transfers().is_empty());
        assert!(f.ledger.all().is_empty());
    }

    #[tokio::test]
    async fn unverified_mentor_gets_no_transfer_but_session_completes() {
        let f = fixture();
        let session = seed_session(&f, base_now().minus_hours(2), 2).await;
        confirm_with_room(&f, &session).await;
        // No payout account registered for the mentor at all.
        seed_participant(&f, &session, 2_500, "pi_1").await;

        let summary = f.engine.run().await.unwrap();

        assert_eq!(summary.completed, 1);
        assert!(f.gateway.transfers().is_empty());
        assert!(f.ledger.all().is_empty());
    }

    #[tokio::test]
    async fn completed_sessions_are_not_reprocessed() {
        let f = fixture();
        let session = seed_session(&f, base_now().minus_hours(2), 2).await;
        confirm_with_room(&f, &session).await;
        verify_mentor_payout(&f, &session);
        seed_participant(&f, &session, 2_500, "pi_1").await;

        let first = f.engine.run().await.unwrap();
        let second = f.engine.run().await.unwrap();

        assert_eq!(first.completed, 1);
        assert_eq!(second.completed, 0);
        assert_eq!(f.gateway.transfers().len(), 1);
        assert_eq!(f.ledger.all().len(), 1);
    }
}
