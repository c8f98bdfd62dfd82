//! Shared foundation value objects for the domain layer.
//!
//! Everything here is context-free: identifiers, timestamps, money, error
//! types, and the state machine trait used by entity status enums.

mod errors;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    CallId, GroupSessionId, ParticipantId, PayoutId, PurchaseId, RecordingId, SeriesId, UserId,
};
pub use money::{Money, RevenueSplit};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
