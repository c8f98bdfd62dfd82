//! Ports layer: interfaces the application layer depends on and adapters
//! implement.

mod availability_repository;
mod call_repository;
mod catalog_reader;
mod clock;
mod directory_reader;
mod group_session_repository;
mod notifier;
mod participant_repository;
mod payment_gateway;
mod payout_ledger;
mod purchase_repository;
mod room_provisioner;
mod webhook_event_repository;

pub use availability_repository::AvailabilityRepository;
pub use call_repository::CallRepository;
pub use catalog_reader::CatalogReader;
pub use clock::Clock;
pub use directory_reader::{DirectoryReader, PayoutAccount};
pub use group_session_repository::GroupSessionRepository;
pub use notifier::{Contact, Notification, NotificationTemplate, Notifier, NotifyError};
pub use participant_repository::ParticipantRepository;
pub use payment_gateway::{
    CreateRefundRequest, CreateTransferRequest, PaymentError, PaymentErrorCode, PaymentGateway,
    Refund, Transfer,
};
pub use payout_ledger::PayoutLedger;
pub use purchase_repository::PurchaseRepository;
pub use room_provisioner::{
    room_expiry_minutes, CreateRoomRequest, RoomError, RoomProvisioner, VideoRoom,
    MIN_ROOM_EXPIRY_MINUTES, ROOM_GRACE_HOURS,
};
pub use webhook_event_repository::{SaveResult, WebhookEventRecord, WebhookEventRepository};
