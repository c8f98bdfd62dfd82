//! Minimum-attendance pass.
//!
//! Resolves Scheduled sessions starting 3-4 hours out: enough Registered
//! participants confirms the session (room provisioned, everyone notified);
//! too few cancels it and refunds every paid Registered participant. Either
//! way the minimum-check marker is stamped exactly once.
//!
//! Room provisioning failure is the one case that leaves the marker unset:
//! a Confirmed session without a room would never get reminders, so the
//! session stays Scheduled and the next run retries while the window holds.

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::sessions::{GroupSession, GroupSessionParticipant};
use crate::ports::{
    room_expiry_minutes, CreateRefundRequest, CreateRoomRequest, NotificationTemplate,
};

use super::engine::{LifecycleEngine, RunSummary, MINIMUM_CHECK_FROM_HOURS, MINIMUM_CHECK_TO_HOURS};

const PASS: &str = "minimum_check";

impl LifecycleEngine {
    pub(super) async fn run_minimum_attendance(&self, now: Timestamp, summary: &mut RunSummary) {
        let from = now.plus_hours(MINIMUM_CHECK_FROM_HOURS);
        let to = now.plus_hours(MINIMUM_CHECK_TO_HOURS);

        let sessions = match self.sessions.find_needing_minimum_check(from, to).await {
            Ok(sessions) => sessions,
            Err(err) => {
                summary.record_error(PASS, "query", err);
                return;
            }
        };

        for mut session in sessions {
            if let Err(err) = self.resolve_minimum(&mut session, now, summary).await {
                summary.record_error(PASS, format!("session {}", session.id), err);
            }
        }
    }

    async fn resolve_minimum(
        &self,
        session: &mut GroupSession,
        now: Timestamp,
        summary: &mut RunSummary,
    ) -> Result<(), DomainError> {
        let registered = self.participants.count_registered(&session.id).await?;
        tracing::info!(
            session_id = %session.id,
            registered,
            threshold = session.min_attendees,
            "Resolving minimum attendance"
        );

        if registered >= session.min_attendees {
            self.confirm_session(session, now, summary).await
        } else {
            self.cancel_underattended(session, now, summary).await
        }
    }

    async fn confirm_session(
        &self,
        session: &mut GroupSession,
        now: Timestamp,
        summary: &mut RunSummary,
    ) -> Result<(), DomainError> {
        let room = match self
            .rooms
            .create_room(CreateRoomRequest {
                reference: session.id.to_string(),
                max_participants: session.capacity,
                expires_in_minutes: room_expiry_minutes(now, session.end_at()),
                enable_chat: true,
                enable_recording: false,
            })
            .await
        {
            Ok(room) => room,
            Err(err) => {
                // Marker stays unset so the next run inside the window
                // retries with a fresh room attempt.
                summary.record_error(PASS, format!("session {} room", session.id), err);
                return Ok(());
            }
        };

        session.confirm(room.url, now)?;
        session.mark_minimum_checked(now)?;
        self.sessions.update(session).await?;
        summary.confirmed += 1;

        let participants = self.participants.find_by_session(&session.id).await?;
        self.notify_circle(session, &participants, NotificationTemplate::GroupSessionConfirmed)
            .await;
        Ok(())
    }

    async fn cancel_underattended(
        &self,
        session: &mut GroupSession,
        now: Timestamp,
        summary: &mut RunSummary,
    ) -> Result<(), DomainError> {
        session.cancel(now)?;
        session.mark_minimum_checked(now)?;
        self.sessions.update(session).await?;
        summary.cancelled += 1;

        let participants = self.participants.find_by_session(&session.id).await?;
        let registered: Vec<GroupSessionParticipant> = participants
            .iter()
            .filter(|p| p.counts_toward_minimum())
            .cloned()
            .collect();

        // Each participant settles independently: one refund failure never
        // blocks the others, and the session is already Cancelled above.
        for participant in &registered {
            if let Err(err) = self.settle_cancelled(participant.clone(), now).await {
                summary.record_error(
                    PASS,
                    format!("participant {} refund", participant.id),
                    err,
                );
            }
        }

        self.notify_circle(session, &registered, NotificationTemplate::GroupSessionCancelled)
            .await;
        Ok(())
    }

    async fn settle_cancelled(
        &self,
        mut participant: GroupSessionParticipant,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        if participant.needs_refund() {
            let reference = participant.payment_reference.clone().ok_or_else(|| {
                DomainError::external("create_refund", "paid participant has no payment reference")
                    .with_detail("participant_id", participant.id.to_string())
            })?;
            self.gateway
                .create_refund(CreateRefundRequest {
                    payment_reference: reference,
                    idempotency_key: Some(format!("refund-{}", participant.id)),
                })
                .await
                .map_err(|err| {
                    DomainError::external("create_refund", err.to_string())
                        .with_detail("participant_id", participant.id.to_string())
                })?;
            participant.mark_refunded(now)?;
        } else {
            participant.mark_cancelled(now)?;
        }
        self.participants.update(&participant).await
    }
}
