//! LifecycleEngine - periodic group-session orchestration.
//!
//! Invoked by the authenticated trigger endpoint on an external cadence; no
//! internal scheduling. One invocation runs three independent passes
//! (minimum attendance, reminders, auto-completion), each selecting rows by
//! a time-window predicate AND an unset idempotency marker.
//!
//! ## Failure policy
//!
//! Authoritative state first, then best-effort side effects. Every external
//! call (refund, transfer, room, email) is fenced per item: a failure is
//! logged and recorded in the run summary, and never aborts the loop or
//! reverts a status write that already happened.
//!
//! ## Concurrency
//!
//! Two overlapping engine runs would race the idempotency markers, so `run`
//! takes a try-lock lease and returns `RunInProgress` to the second caller.
//! The lease is per process; multi-instance deployments must route the
//! trigger to a single instance.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::application::handlers::payouts::PayoutInitiator;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::sessions::{GroupSession, GroupSessionParticipant};
use crate::ports::{
    Clock, DirectoryReader, GroupSessionRepository, Notification, NotificationTemplate, Notifier,
    ParticipantRepository, PaymentGateway, RoomProvisioner,
};

/// Minimum-attendance pass window: sessions starting 3-4 hours out.
pub const MINIMUM_CHECK_FROM_HOURS: i64 = 3;
pub const MINIMUM_CHECK_TO_HOURS: i64 = 4;

/// Day-before reminder window: sessions starting 24-25 hours out.
pub const DAY_REMINDER_FROM_HOURS: i64 = 24;
pub const DAY_REMINDER_TO_HOURS: i64 = 25;

/// Hour-before reminder window: sessions starting 45-75 minutes out.
pub const HOUR_REMINDER_FROM_MINUTES: i64 = 45;
pub const HOUR_REMINDER_TO_MINUTES: i64 = 75;

/// A session completes only once its end is this far in the past.
pub const COMPLETION_GRACE_MINUTES: i64 = 30;

/// Structured result of one engine run, returned to the trigger caller for
/// observability.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Sessions confirmed by the minimum-attendance pass.
    pub confirmed: u32,

    /// Sessions cancelled by the minimum-attendance pass.
    pub cancelled: u32,

    /// Day-before reminders sent.
    pub day_reminders: u32,

    /// Hour-before reminders sent.
    pub hour_reminders: u32,

    /// Sessions auto-completed.
    pub completed: u32,

    /// Per-item failures, with enough context for manual reconciliation.
    pub errors: Vec<String>,
}

impl RunSummary {
    /// Logs and records one fenced failure.
    pub(super) fn record_error(&mut self, pass: &str, entity: impl fmt::Display, err: impl fmt::Display) {
        let line = format!("{}: {}: {}", pass, entity, err);
        tracing::error!(pass, entity = %entity, error = %err, "Lifecycle pass item failed");
        self.errors.push(line);
    }
}

/// The periodically-invoked session lifecycle engine.
pub struct LifecycleEngine {
    pub(super) sessions: Arc<dyn GroupSessionRepository>,
    pub(super) participants: Arc<dyn ParticipantRepository>,
    pub(super) gateway: Arc<dyn PaymentGateway>,
    pub(super) rooms: Arc<dyn RoomProvisioner>,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) directory: Arc<dyn DirectoryReader>,
    pub(super) payouts: Arc<PayoutInitiator>,
    pub(super) clock: Arc<dyn Clock>,
    lease: tokio::sync::Mutex<()>,
}

impl LifecycleEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: Arc<dyn GroupSessionRepository>,
        participants: Arc<dyn ParticipantRepository>,
        gateway: Arc<dyn PaymentGateway>,
        rooms: Arc<dyn RoomProvisioner>,
        notifier: Arc<dyn Notifier>,
        directory: Arc<dyn DirectoryReader>,
        payouts: Arc<PayoutInitiator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            participants,
            gateway,
            rooms,
            notifier,
            directory,
            payouts,
            clock,
            lease: tokio::sync::Mutex::new(()),
        }
    }

    /// Runs the three passes once.
    ///
    /// # Errors
    ///
    /// Returns `RunInProgress` if another run holds the lease. Per-item
    /// failures inside the passes never error the run; they land in
    /// `RunSummary::errors`.
    pub async fn run(&self) -> Result<RunSummary, DomainError> {
        let _guard = self.lease.try_lock().map_err(|_| {
            DomainError::new(
                ErrorCode::RunInProgress,
                "A lifecycle run is already in progress",
            )
        })?;

        let now = self.clock.now();
        let mut summary = RunSummary::default();

        self.run_minimum_attendance(now, &mut summary).await;
        self.run_reminders(now, &mut summary).await;
        self.run_auto_completion(now, &mut summary).await;

        tracing::info!(
            confirmed = summary.confirmed,
            cancelled = summary.cancelled,
            day_reminders = summary.day_reminders,
            hour_reminders = summary.hour_reminders,
            completed = summary.completed,
            errors = summary.errors.len(),
            "Lifecycle run finished"
        );
        Ok(summary)
    }

    /// Fire-and-forget notification to one user. Failures are logged with
    /// template context and swallowed.
    pub(super) async fn notify_user(
        &self,
        user_id: UserId,
        template: NotificationTemplate,
        context: serde_json::Value,
    ) {
        let contact = match self.directory.contact(&user_id).await {
            Ok(Some(contact)) => contact,
            Ok(None) => {
                tracing::warn!(user_id = %user_id, template = template.as_str(), "No contact on file");
                return;
            }
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = %err, "Contact lookup failed");
                return;
            }
        };
        if let Err(err) = self
            .notifier
            .send(Notification::new(contact, template, context))
            .await
        {
            tracing::warn!(
                user_id = %user_id,
                template = template.as_str(),
                error = %err,
                "Notification send failed"
            );
        }
    }

    /// Notifies every Registered participant and the mentor.
    pub(super) async fn notify_circle(
        &self,
        session: &GroupSession,
        participants: &[GroupSessionParticipant],
        template: NotificationTemplate,
    ) {
        let context = serde_json::json!({
            "session_id": session.id,
            "title": session.title,
            "scheduled_at": session.scheduled_at,
            "room_url": session.room_url,
        });
        for participant in participants.iter().filter(|p| p.counts_toward_minimum()) {
            self.notify_user(participant.user_id, template, context.clone())
                .await;
        }
        self.notify_user(session.mentor_id, template, context).await;
    }
}
