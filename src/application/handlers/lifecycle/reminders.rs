//! Reminder pass.
//!
//! Two independent sub-scans over Confirmed sessions with a provisioned
//! room: day-before (24-25 hours out) and hour-before (45-75 minutes out).
//! The windows are deliberately wider than the reminder granularity because
//! the trigger cadence is coarse; a late engine run must not skip a session.
//! Double sends are prevented solely by the marker, never by time math.

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::sessions::GroupSession;
use crate::ports::NotificationTemplate;

use super::engine::{
    LifecycleEngine, RunSummary, DAY_REMINDER_FROM_HOURS, DAY_REMINDER_TO_HOURS,
    HOUR_REMINDER_FROM_MINUTES, HOUR_REMINDER_TO_MINUTES,
};

#[derive(Debug, Clone, Copy)]
enum ReminderKind {
    DayBefore,
    HourBefore,
}

impl ReminderKind {
    fn pass_name(&self) -> &'static str {
        match self {
            ReminderKind::DayBefore => "day_reminder",
            ReminderKind::HourBefore => "hour_reminder",
        }
    }

    fn template(&self) -> NotificationTemplate {
        match self {
            ReminderKind::DayBefore => NotificationTemplate::GroupSessionReminderDay,
            ReminderKind::HourBefore => NotificationTemplate::GroupSessionReminderHour,
        }
    }

    fn window(&self, now: Timestamp) -> (Timestamp, Timestamp) {
        match self {
            ReminderKind::DayBefore => (
                now.plus_hours(DAY_REMINDER_FROM_HOURS),
                now.plus_hours(DAY_REMINDER_TO_HOURS),
            ),
            ReminderKind::HourBefore => (
                now.plus_minutes(HOUR_REMINDER_FROM_MINUTES),
                now.plus_minutes(HOUR_REMINDER_TO_MINUTES),
            ),
        }
    }
}

impl LifecycleEngine {
    pub(super) async fn run_reminders(&self, now: Timestamp, summary: &mut RunSummary) {
        self.run_reminder_scan(now, summary, ReminderKind::DayBefore)
            .await;
        self.run_reminder_scan(now, summary, ReminderKind::HourBefore)
            .await;
    }

    async fn run_reminder_scan(
        &self,
        now: Timestamp,
        summary: &mut RunSummary,
        kind: ReminderKind,
    ) {
        let (from, to) = kind.window(now);
        let query = match kind {
            ReminderKind::DayBefore => self.sessions.find_needing_day_reminder(from, to).await,
            ReminderKind::HourBefore => self.sessions.find_needing_hour_reminder(from, to).await,
        };
        let sessions = match query {
            Ok(sessions) => sessions,
            Err(err) => {
                summary.record_error(kind.pass_name(), "query", err);
                return;
            }
        };

        for mut session in sessions {
            match self.send_reminder(&mut session, now, kind).await {
                Ok(()) => match kind {
                    ReminderKind::DayBefore => summary.day_reminders += 1,
                    ReminderKind::HourBefore => summary.hour_reminders += 1,
                },
                Err(err) => {
                    summary.record_error(
                        kind.pass_name(),
                        format!("session {}", session.id),
                        err,
                    );
                }
            }
        }
    }

    async fn send_reminder(
        &self,
        session: &mut GroupSession,
        now: Timestamp,
        kind: ReminderKind,
    ) -> Result<(), DomainError> {
        let participants = self.participants.find_by_session(&session.id).await?;
        self.notify_circle(session, &participants, kind.template())
            .await;

        // Stamp after sending: a failed send is logged and lost, never
        // retried, while the marker guarantees no session is reminded twice.
        match kind {
            ReminderKind::DayBefore => session.mark_day_reminder_sent(now)?,
            ReminderKind::HourBefore => session.mark_hour_reminder_sent(now)?,
        }
        self.sessions.update(session).await
    }
}
