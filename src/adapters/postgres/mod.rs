//! PostgreSQL adapter implementations of the repository ports.

mod availability_repository;
mod call_repository;
mod directory_reader;
mod group_session_repository;
mod participant_repository;
mod payout_ledger;
mod purchase_repository;
mod webhook_event_repository;

pub use availability_repository::PostgresAvailabilityRepository;
pub use call_repository::PostgresCallRepository;
pub use directory_reader::{PostgresCatalogReader, PostgresDirectoryReader};
pub use group_session_repository::PostgresGroupSessionRepository;
pub use participant_repository::PostgresParticipantRepository;
pub use payout_ledger::PostgresPayoutLedger;
pub use purchase_repository::PostgresPurchaseRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;
