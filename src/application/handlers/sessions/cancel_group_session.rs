//! CancelGroupSessionHandler - host-initiated cancellation.
//!
//! A mentor may cancel a Scheduled session ahead of the minimum check.
//! Paid Registered participants are refunded with the same per-participant
//! fencing the lifecycle engine uses: one refund failure never blocks the
//! others or the cancellation itself.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, GroupSessionId, Timestamp, UserId};
use crate::domain::sessions::{GroupSession, GroupSessionParticipant};
use crate::ports::{
    Clock, CreateRefundRequest, DirectoryReader, GroupSessionRepository, Notification,
    NotificationTemplate, Notifier, ParticipantRepository, PaymentGateway,
};

/// Command to cancel a session.
#[derive(Debug, Clone)]
pub struct CancelGroupSessionCommand {
    pub session_id: GroupSessionId,
    pub requested_by: UserId,
}

/// Outcome of a host cancellation.
#[derive(Debug, Clone)]
pub struct CancelGroupSessionResult {
    pub session: GroupSession,

    /// Participants whose refunds failed and need manual reconciliation.
    pub refund_failures: Vec<String>,
}

/// Error type for host cancellation.
#[derive(Debug, Clone)]
pub enum CancelGroupSessionError {
    SessionNotFound(GroupSessionId),
    /// Requester does not host this session.
    Forbidden,
    /// Session is no longer cancellable (Confirmed, Completed, Cancelled).
    InvalidState(DomainError),
    Domain(DomainError),
}

impl std::fmt::Display for CancelGroupSessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelGroupSessionError::SessionNotFound(id) => {
                write!(f, "Group session not found: {}", id)
            }
            CancelGroupSessionError::Forbidden => {
                write!(f, "Only the hosting mentor may cancel this session")
            }
            CancelGroupSessionError::InvalidState(err) => write!(f, "{}", err),
            CancelGroupSessionError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CancelGroupSessionError {}

impl From<DomainError> for CancelGroupSessionError {
    fn from(err: DomainError) -> Self {
        if err.code == ErrorCode::InvalidStateTransition {
            CancelGroupSessionError::InvalidState(err)
        } else {
            CancelGroupSessionError::Domain(err)
        }
    }
}

/// Handler for host cancellation.
pub struct CancelGroupSessionHandler {
    sessions: Arc<dyn GroupSessionRepository>,
    participants: Arc<dyn ParticipantRepository>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    directory: Arc<dyn DirectoryReader>,
    clock: Arc<dyn Clock>,
}

impl CancelGroupSessionHandler {
    pub fn new(
        sessions: Arc<dyn GroupSessionRepository>,
        participants: Arc<dyn ParticipantRepository>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        directory: Arc<dyn DirectoryReader>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            participants,
            gateway,
            notifier,
            directory,
            clock,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelGroupSessionCommand,
    ) -> Result<CancelGroupSessionResult, CancelGroupSessionError> {
        let now = self.clock.now();

        // 1. Load and authorize.
        let mut session = self
            .sessions
            .find_by_id(&cmd.session_id)
            .await?
            .ok_or(CancelGroupSessionError::SessionNotFound(cmd.session_id))?;
        if session.mentor_id != cmd.requested_by {
            return Err(CancelGroupSessionError::Forbidden);
        }

        // 2. Authoritative state first.
        session.cancel(now)?;
        // A cancelled session never reaches the minimum-attendance pass
        // again (status filter), but stamp the marker for symmetry with the
        // engine path when it is still unset.
        if session.minimum_checked_at.is_none() {
            session.mark_minimum_checked(now)?;
        }
        self.sessions.update(&session).await?;

        // 3. Refund paid Registered participants, each independently fenced.
        let registered: Vec<GroupSessionParticipant> = self
            .participants
            .find_by_session(&session.id)
            .await?
            .into_iter()
            .filter(|p| p.counts_toward_minimum())
            .collect();

        let mut refund_failures = Vec::new();
        for participant in &registered {
            if let Err(err) = self.settle(participant.clone(), now).await {
                tracing::error!(
                    session_id = %session.id,
                    participant_id = %participant.id,
                    error = %err,
                    "Host-cancel refund failed"
                );
                refund_failures.push(format!("participant {}: {}", participant.id, err));
            }
        }

        // 4. Notify everyone affected (fire-and-forget).
        let context = serde_json::json!({
            "session_id": session.id,
            "title": session.title,
            "scheduled_at": session.scheduled_at,
            "cancelled_by_host": true,
        });
        for participant in &registered {
            self.notify(participant.user_id, context.clone()).await;
        }
        self.notify(session.mentor_id, context).await;

        Ok(CancelGroupSessionResult {
            session,
            refund_failures,
        })
    }

    async fn settle(
        &self,
        mut participant: GroupSessionParticipant,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        if participant.needs_refund() {
            let reference = participant.payment_reference.clone().ok_or_else(|| {
                DomainError::external("create_refund", "paid participant has no payment reference")
            })?;
            self.gateway
                .create_refund(CreateRefundRequest {
                    payment_reference: reference,
                    idempotency_key: Some(format!("refund-{}", participant.id)),
                })
                .await
                .map_err(|err| DomainError::external("create_refund", err.to_string()))?;
            participant.mark_refunded(now)?;
        } else {
            participant.mark_cancelled(now)?;
        }
        self.participants.update(&participant).await
    }

    async fn notify(&self, user_id: UserId, context: serde_json::Value) {
        match self.directory.contact(&user_id).await {
            Ok(Some(contact)) => {
                if let Err(err) = self
                    .notifier
                    .send(Notification::new(
                        contact,
                        NotificationTemplate::GroupSessionCancelled,
                        context,
                    ))
                    .await
                {
                    tracing::warn!(user_id = %user_id, error = %err, "Cancellation notification failed");
                }
            }
            Ok(None) => tracing::warn!(user_id = %user_id, "No contact on file"),
            Err(err) => tracing::warn!(user_id = %user_id, error = %err, "Contact lookup failed"),
        }
    }
}
