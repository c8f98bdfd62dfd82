//! Notifier port for templated transactional email.
//!
//! Fire-and-forget from the caller's perspective: delivery failures are
//! logged with recipient and template context, never propagated into the
//! triggering state transition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::UserId;

/// Port for the transactional email provider.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one templated notification.
    async fn send(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// A recipient resolved from the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
}

/// Transactional templates the platform sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    /// Group session reached its minimum and is confirmed.
    GroupSessionConfirmed,
    /// Group session was cancelled (minimum not met or host cancelled).
    GroupSessionCancelled,
    /// Day-before group session reminder.
    GroupSessionReminderDay,
    /// Hour-before group session reminder.
    GroupSessionReminderHour,
    /// Seat registration confirmed after payment.
    GroupSessionSeatRegistered,
    /// One-on-one call booked and confirmed after payment.
    CallConfirmed,
}

impl NotificationTemplate {
    /// Provider-side template name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationTemplate::GroupSessionConfirmed => "group-session-confirmed",
            NotificationTemplate::GroupSessionCancelled => "group-session-cancelled",
            NotificationTemplate::GroupSessionReminderDay => "group-session-reminder-day",
            NotificationTemplate::GroupSessionReminderHour => "group-session-reminder-hour",
            NotificationTemplate::GroupSessionSeatRegistered => "group-session-seat-registered",
            NotificationTemplate::CallConfirmed => "call-confirmed",
        }
    }
}

/// One templated send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: Contact,
    pub template: NotificationTemplate,

    /// Structured template context (session title, times, amounts).
    pub context: serde_json::Value,
}

impl Notification {
    pub fn new(
        recipient: Contact,
        template: NotificationTemplate,
        context: serde_json::Value,
    ) -> Self {
        Self {
            recipient,
            template,
            context,
        }
    }
}

/// Errors from the email provider.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("Notification provider error: {0}")]
    Provider(String),

    #[error("Notification provider unreachable: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifier_is_object_safe() {
        fn _accepts_dyn(_notifier: &dyn Notifier) {}
    }

    #[test]
    fn template_names_are_stable() {
        assert_eq!(
            NotificationTemplate::GroupSessionReminderDay.as_str(),
            "group-session-reminder-day"
        );
        assert_eq!(NotificationTemplate::CallConfirmed.as_str(), "call-confirmed");
    }
}
