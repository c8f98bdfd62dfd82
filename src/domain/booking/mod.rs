//! Booking context: one-on-one calls.

mod call;

pub use call::{Call, CallDuration, CallStatus};
