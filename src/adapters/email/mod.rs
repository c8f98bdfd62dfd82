//! Email adapters: the Resend notifier and a configurable mock.

mod mock_notifier;
mod resend_notifier;

pub use mock_notifier::MockNotifier;
pub use resend_notifier::{ResendConfig, ResendNotifier};
