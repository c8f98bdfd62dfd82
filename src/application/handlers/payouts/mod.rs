//! Payout handlers.

mod payout_initiator;

pub use payout_initiator::{PayoutDisposition, PayoutInitiator, PAYOUT_CURRENCY};
