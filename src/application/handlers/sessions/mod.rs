//! Group-session handlers: creation with conflict check, host cancellation.

mod cancel_group_session;
mod create_group_session;

pub use cancel_group_session::{
    CancelGroupSessionCommand, CancelGroupSessionError, CancelGroupSessionHandler,
    CancelGroupSessionResult,
};
pub use create_group_session::{
    CreateGroupSessionCommand, CreateGroupSessionError, CreateGroupSessionHandler,
};
