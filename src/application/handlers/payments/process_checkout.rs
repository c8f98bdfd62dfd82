//! Checkout processor - Orchestrates idempotent payment event handling.
//!
//! Coordination layer between the payment processor's webhooks and the four
//! purchase handlers, ensuring each event is processed exactly once.
//!
//! ## Design
//!
//! 1. Check if the event was already processed (idempotency)
//! 2. Dispatch on the purpose tag to the matching purchase handler
//! 3. Record the processing result (success, ignored, or failed)
//!
//! ## Race Condition Handling
//!
//! When multiple deliveries of one event arrive simultaneously:
//! - First to save wins (primary-key constraint on event id)
//! - Others get `AlreadyExists` and return `AlreadyProcessed`

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::payments::{CheckoutEvent, CheckoutMetadata, PurchaseKind, WebhookError};
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository};

/// Handler for one purchase purpose.
///
/// Implementations are stateless with respect to the event stream; all
/// idempotency lives in the processor and in upsert semantics of the writes
/// they perform.
#[async_trait]
pub trait PurchaseHandler: Send + Sync {
    /// The purpose tag this handler processes.
    fn kind(&self) -> PurchaseKind;

    /// Handles the purchase.
    ///
    /// Returns `Ok(())` on success. External side effects (room, payout,
    /// notification) must be fenced internally; only failures of the primary
    /// domain writes should surface as errors.
    async fn handle(
        &self,
        event: &CheckoutEvent,
        metadata: &CheckoutMetadata,
    ) -> Result<(), WebhookError>;
}

/// Routes verified checkout events to purchase handlers by purpose tag.
pub struct PurchaseRouter {
    handlers: Vec<Arc<dyn PurchaseHandler>>,
}

impl PurchaseRouter {
    pub fn new(handlers: Vec<Arc<dyn PurchaseHandler>>) -> Self {
        Self { handlers }
    }

    fn handler_for(&self, kind: PurchaseKind) -> Option<&dyn PurchaseHandler> {
        self.handlers
            .iter()
            .find(|h| h.kind() == kind)
            .map(AsRef::as_ref)
    }

    /// Dispatch an event to its handler.
    ///
    /// Non-checkout event types and purposes without a registered handler
    /// come back as `Ignored` (acknowledged, not processed).
    pub async fn dispatch(&self, event: &CheckoutEvent) -> Result<(), WebhookError> {
        if !event.is_checkout_completed() {
            return Err(WebhookError::Ignored(format!(
                "No handler for event type: {}",
                event.event_type
            )));
        }

        let metadata = event.purchase_metadata()?;
        match self.handler_for(metadata.detail.kind()) {
            Some(handler) => handler.handle(event, &metadata).await,
            None => Err(WebhookError::Ignored(format!(
                "No handler for purchase kind: {}",
                metadata.detail.kind()
            ))),
        }
    }
}

/// Outcome of processing one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutResult {
    /// Event was processed (or deliberately ignored) by this delivery.
    Processed,
    /// Event was already processed by an earlier delivery.
    AlreadyProcessed,
}

/// Processes checkout events with idempotency guarantees.
pub struct IdempotentCheckoutProcessor {
    repository: Arc<dyn WebhookEventRepository>,
    router: PurchaseRouter,
}

impl IdempotentCheckoutProcessor {
    pub fn new(repository: Arc<dyn WebhookEventRepository>, router: PurchaseRouter) -> Self {
        Self { repository, router }
    }

    /// Process a verified event exactly once.
    ///
    /// # Returns
    ///
    /// - `Ok(CheckoutResult::Processed)` - processed (or recorded as ignored)
    /// - `Ok(CheckoutResult::AlreadyProcessed)` - idempotent skip
    /// - `Err(_)` - processing failed; the failure is recorded and the
    ///   processor will redeliver
    pub async fn process(&self, event: CheckoutEvent) -> Result<CheckoutResult, WebhookError> {
        // 1. Check if already processed
        if self.repository.find_by_event_id(&event.id).await?.is_some() {
            tracing::debug!(event_id = %event.id, "Duplicate delivery, skipping");
            return Ok(CheckoutResult::AlreadyProcessed);
        }

        // 2. Dispatch
        let result = self.router.dispatch(&event).await;

        // 3. Build the outcome record
        let payload = serde_json::to_value(&event)
            .map_err(|e| WebhookError::ParseError(format!("Failed to serialize event: {}", e)))?;
        let record = match &result {
            Ok(()) => WebhookEventRecord::success(&event.id, &event.event_type, payload),
            Err(WebhookError::Ignored(reason)) => {
                WebhookEventRecord::ignored(&event.id, &event.event_type, reason, payload)
            }
            Err(e) => WebhookEventRecord::failed(&event.id, &event.event_type, e.to_string(), payload),
        };

        // 4. Save with insert-wins race handling
        match self.repository.save(record).await? {
            SaveResult::Inserted => match result {
                Ok(()) => Ok(CheckoutResult::Processed),
                // Ignored events are still "processed" for idempotency.
                Err(WebhookError::Ignored(_)) => Ok(CheckoutResult::Processed),
                Err(e) => Err(e),
            },
            SaveResult::AlreadyExists => Ok(CheckoutResult::AlreadyProcessed),
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryWebhookEventRepository;
    use crate::domain::foundation::{RecordingId, UserId};
    use crate::domain::payments::CheckoutEventBuilder;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingHandler {
        kind: PurchaseKind,
        calls: AtomicU32,
        fail: bool,
    }

    impl CountingHandler {
        fn new(kind: PurchaseKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                calls: AtomicU32::new(0),
                fail: false,
            })
        }

        fn failing(kind: PurchaseKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                calls: AtomicU32::new(0),
                fail: true,
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PurchaseHandler for CountingHandler {
        fn kind(&self) -> PurchaseKind {
            self.kind
        }

        async fn handle(
            &self,
            _event: &CheckoutEvent,
            _metadata: &CheckoutMetadata,
        ) -> Result<(), WebhookError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(WebhookError::Handler("simulated failure".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn recording_event(id: &str) -> CheckoutEvent {
        CheckoutEventBuilder::new(id)
            .metadata("purpose", "recording")
            .metadata("user_id", UserId::new().to_string())
            .metadata("recording_id", RecordingId::new().to_string())
            .amount_total(1_500)
            .build()
    }

    fn processor_with(
        handler: Arc<CountingHandler>,
    ) -> (IdempotentCheckoutProcessor, Arc<InMemoryWebhookEventRepository>) {
        let repo = Arc::new(InMemoryWebhookEventRepository::new());
        let processor = IdempotentCheckoutProcessor::new(
            repo.clone(),
            PurchaseRouter::new(vec![handler]),
        );
        (processor, repo)
    }

    #[tokio::test]
    async fn processes_new_event_once() {
        let handler = CountingHandler::new(PurchaseKind::Recording);
        let (processor, repo) = processor_with(handler.clone());

        let result = processor.process(recording_event("evt_1")).await.unwrap();

        assert_eq!(result, CheckoutResult::Processed);
        assert_eq!(handler.calls(), 1);
        assert_eq!(repo.count(), 1);
    }

    #[tokio::test]
    async fn duplicate_delivery_is_skipped() {
        let handler = CountingHandler::new(PurchaseKind::Recording);
        let (processor, _repo) = processor_with(handler.clone());

        processor.process(recording_event("evt_dup")).await.unwrap();
        let second = processor.process(recording_event("evt_dup")).await.unwrap();

        assert_eq!(second, CheckoutResult::AlreadyProcessed);
        assert_eq!(handler.calls(), 1);
    }

    #[tokio::test]
    async fn different_events_process_independently() {
        let handler = CountingHandler::new(PurchaseKind::Recording);
        let (processor, _repo) = processor_with(handler.clone());

        processor.process(recording_event("evt_a")).await.unwrap();
        processor.process(recording_event("evt_b")).await.unwrap();

        assert_eq!(handler.calls(), 2);
    }

    #[tokio::test]
    async fn unknown_event_types_are_recorded_as_ignored() {
        let handler = CountingHandler::new(PurchaseKind::Recording);
        let (processor, repo) = processor_with(handler.clone());

        let event = CheckoutEventBuilder::new("evt_other")
            .event_type("invoice.paid")
            .build();
        let result = processor.process(event).await.unwrap();

        assert_eq!(result, CheckoutResult::Processed);
        assert_eq!(handler.calls(), 0);
        assert_eq!(repo.count(), 1);
    }

    #[tokio::test]
    async fn unrouted_purpose_is_recorded_as_ignored() {
        let handler = CountingHandler::new(PurchaseKind::Call);
        let (processor, repo) = processor_with(handler.clone());

        // Recording purchase, but only a call handler is registered.
        let result = processor.process(recording_event("evt_un")).await.unwrap();

        assert_eq!(result, CheckoutResult::Processed);
        assert_eq!(handler.calls(), 0);
        assert_eq!(repo.count(), 1);
    }

    #[tokio::test]
    async fn handler_failure_is_recorded_and_propagated() {
        let handler = CountingHandler::failing(PurchaseKind::Recording);
        let (processor, repo) = processor_with(handler.clone());

        let result = processor.process(recording_event("evt_fail")).await;

        assert!(result.is_err());
        assert_eq!(repo.count(), 1);
    }

    #[tokio::test]
    async fn missing_metadata_is_a_recorded_failure() {
        let handler = CountingHandler::new(PurchaseKind::Recording);
        let (processor, repo) = processor_with(handler.clone());

        let event = CheckoutEventBuilder::new("evt_bad").amount_total(100).build();
        let result = processor.process(event).await;

        assert!(matches!(result, Err(WebhookError::MissingMetadata(_))));
        assert_eq!(handler.calls(), 0);
        assert_eq!(repo.count(), 1);
    }
}
