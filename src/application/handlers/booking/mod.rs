//! Booking handlers: the slots read API and call transitions.

mod get_available_slots;
mod update_call_status;

pub use get_available_slots::{
    AvailableSlotsView, GetAvailableSlotsHandler, GetAvailableSlotsQuery,
};
pub use update_call_status::{
    UpdateCallStatusCommand, UpdateCallStatusError, UpdateCallStatusHandler,
};
