//! Payment event handlers: the idempotent checkout processor, the purpose
//! router, and the four purchase handlers it dispatches to.

mod call_purchase;
mod process_checkout;
mod recording_purchase;
mod series_purchase;
mod session_registration;

pub use call_purchase::CallPurchaseHandler;
pub use process_checkout::{
    CheckoutResult, IdempotentCheckoutProcessor, PurchaseHandler, PurchaseRouter,
};
pub use recording_purchase::RecordingPurchaseHandler;
pub use series_purchase::SeriesPurchaseHandler;
pub use session_registration::SessionRegistrationHandler;

use crate::domain::foundation::ErrorCode;
use crate::domain::payments::{PurchaseRecord, WebhookError};
use crate::ports::PurchaseRepository;

/// Appends a purchase row, tolerating a duplicate event id.
///
/// If a crash landed between the purchase insert and the event record on a
/// previous delivery, the redelivery hits the unique constraint here; the
/// row already existing is exactly the state we want.
pub(crate) async fn save_purchase_tolerating_duplicate(
    purchases: &dyn PurchaseRepository,
    record: &PurchaseRecord,
) -> Result<(), WebhookError> {
    match purchases.save(record).await {
        Ok(()) => Ok(()),
        Err(e) if e.code == ErrorCode::AlreadyProcessed => {
            tracing::debug!(event_id = %record.event_id, "Purchase row already present");
            Ok(())
        }
        Err(e) => Err(WebhookError::Database(e.to_string())),
    }
}
