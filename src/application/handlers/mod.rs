//! Command and query handlers, one module per context.

pub mod booking;
pub mod lifecycle;
pub mod payments;
pub mod payouts;
pub mod sessions;
