//! Resend transactional email adapter.
//!
//! Implements the `Notifier` port against the Resend API. Each template
//! maps to a subject line and a short text body rendered from the
//! structured context; callers treat sends as fire-and-forget.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::ports::{Notification, NotificationTemplate, Notifier, NotifyError};

/// Resend API configuration.
#[derive(Clone)]
pub struct ResendConfig {
    /// Resend API key (re_...).
    api_key: SecretString,

    /// Sender address.
    from_address: String,

    /// Base URL for the Resend API (default: https://api.resend.com).
    api_base_url: String,
}

impl ResendConfig {
    pub fn new(api_key: impl Into<String>, from_address: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            from_address: from_address.into(),
            api_base_url: "https://api.resend.com".to_string(),
        }
    }

    /// Set a custom API base URL (for testing against a stub server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Resend implementation of the `Notifier` port.
pub struct ResendNotifier {
    config: ResendConfig,
    http_client: reqwest::Client,
}

impl ResendNotifier {
    pub fn new(config: ResendConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }
}

fn subject_for(template: NotificationTemplate) -> &'static str {
    match template {
        NotificationTemplate::GroupSessionConfirmed => "Your group session is confirmed",
        NotificationTemplate::GroupSessionCancelled => "Your group session was cancelled",
        NotificationTemplate::GroupSessionReminderDay => "Your group session is tomorrow",
        NotificationTemplate::GroupSessionReminderHour => "Your group session starts soon",
        NotificationTemplate::GroupSessionSeatRegistered => "You're registered",
        NotificationTemplate::CallConfirmed => "Your call is booked",
    }
}

fn render_text(notification: &Notification) -> String {
    let mut lines = vec![format!("Hi {},", notification.recipient.name)];
    if let Some(title) = notification.context.get("title").and_then(|v| v.as_str()) {
        lines.push(format!("Session: {}", title));
    }
    if let Some(at) = notification
        .context
        .get("scheduled_at")
        .and_then(|v| v.as_str())
    {
        lines.push(format!("When: {}", at));
    }
    if let Some(url) = notification.context.get("room_url").and_then(|v| v.as_str()) {
        lines.push(format!("Join link: {}", url));
    }
    lines.join("\n")
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        let body = serde_json::json!({
            "from": self.config.from_address,
            "to": [notification.recipient.email],
            "subject": subject_for(notification.template),
            "text": render_text(&notification),
            "tags": [{ "name": "template", "value": notification.template.as_str() }],
        });

        let url = format!("{}/emails", self.config.api_base_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Provider(format!(
                "Resend returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}
