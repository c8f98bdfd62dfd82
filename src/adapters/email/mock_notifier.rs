//! Mock notifier for testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{Notification, NotificationTemplate, Notifier, NotifyError};

#[derive(Default)]
struct MockState {
    sent: Vec<Notification>,
    fail: bool,
}

/// Mock notifier that records sends and supports error injection.
#[derive(Default, Clone)]
pub struct MockNotifier {
    inner: Arc<Mutex<MockState>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send fail.
    pub fn fail_sends(&self) {
        self.inner.lock().unwrap().fail = true;
    }

    /// All recorded sends.
    pub fn sent(&self) -> Vec<Notification> {
        self.inner.lock().unwrap().sent.clone()
    }

    /// Recorded sends of one template.
    pub fn sent_with_template(&self, template: NotificationTemplate) -> Vec<Notification> {
        self.inner
            .lock()
            .unwrap()
            .sent
            .iter()
            .filter(|n| n.template == template)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        let mut state = self.inner.lock().unwrap();
        if state.fail {
            return Err(NotifyError::Network("simulated send failure".to_string()));
        }
        state.sent.push(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::ports::Contact;

    fn notification(template: NotificationTemplate) -> Notification {
        Notification::new(
            Contact {
                user_id: UserId::new(),
                email: "pat@example.test".to_string(),
                name: "Pat".to_string(),
            },
            template,
            serde_json::json!({}),
        )
    }

    #[tokio::test]
    async fn records_sends_by_template() {
        let mock = MockNotifier::new();
        mock.send(notification(NotificationTemplate::CallConfirmed))
            .await
            .unwrap();
        mock.send(notification(NotificationTemplate::GroupSessionConfirmed))
            .await
            .unwrap();

        assert_eq!(mock.sent().len(), 2);
        assert_eq!(
            mock.sent_with_template(NotificationTemplate::CallConfirmed)
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn failure_injection_drops_the_send() {
        let mock = MockNotifier::new();
        mock.fail_sends();
        assert!(mock
            .send(notification(NotificationTemplate::CallConfirmed))
            .await
            .is_err());
        assert!(mock.sent().is_empty());
    }
}
