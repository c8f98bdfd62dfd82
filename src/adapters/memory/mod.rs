//! In-memory adapter implementations.
//!
//! Back the ports with Mutex-guarded maps for integration tests and local
//! development without a database. Semantics mirror the PostgreSQL
//! adapters, including insert-wins and upsert behavior.

mod availability;
mod calls;
mod directory;
mod group_sessions;
mod participants;
mod payout_ledger;
mod purchases;
mod webhook_events;

pub use availability::InMemoryAvailabilityRepository;
pub use calls::InMemoryCallRepository;
pub use directory::{InMemoryCatalog, InMemoryDirectory};
pub use group_sessions::InMemoryGroupSessionRepository;
pub use participants::InMemoryParticipantRepository;
pub use payout_ledger::InMemoryPayoutLedger;
pub use purchases::InMemoryPurchaseRepository;
pub use webhook_events::InMemoryWebhookEventRepository;
