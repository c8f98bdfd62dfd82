//! Video room provisioner port.
//!
//! Allocates time-bounded video rooms for confirmed calls and group
//! sessions. Room provisioning is best-effort from the caller's point of
//! view: failures are logged and the booking proceeds roomless.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::Timestamp;

/// Minimum room lifetime granted from "now", in minutes.
pub const MIN_ROOM_EXPIRY_MINUTES: i64 = 60;

/// Extra room lifetime past the scheduled end, in hours.
pub const ROOM_GRACE_HOURS: i64 = 2;

/// Port for the video room provider.
#[async_trait]
pub trait RoomProvisioner: Send + Sync {
    /// Allocate a room.
    async fn create_room(&self, request: CreateRoomRequest) -> Result<VideoRoom, RoomError>;
}

/// Request to allocate a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    /// Logical reference (call or session id) used to name the room.
    pub reference: String,

    /// Maximum number of participants the room admits.
    pub max_participants: u32,

    /// Minutes until the room expires.
    pub expires_in_minutes: i64,

    /// Whether in-room text chat is enabled.
    pub enable_chat: bool,

    /// Whether the room may be recorded.
    pub enable_recording: bool,
}

/// A provisioned room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRoom {
    /// Provider's room identifier.
    pub id: String,

    /// Join URL handed to participants.
    pub url: String,
}

/// Errors from room provisioning.
#[derive(Debug, Clone, Error)]
pub enum RoomError {
    #[error("Room provider error: {0}")]
    Provider(String),

    #[error("Room provider unreachable: {0}")]
    Network(String),
}

/// Computes the room expiry in minutes from now: `scheduled_end + 2h`,
/// floored at [`MIN_ROOM_EXPIRY_MINUTES`].
pub fn room_expiry_minutes(now: Timestamp, scheduled_end: Timestamp) -> i64 {
    let until_grace_end = scheduled_end
        .plus_hours(ROOM_GRACE_HOURS)
        .duration_since(&now)
        .num_minutes();
    until_grace_end.max(MIN_ROOM_EXPIRY_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Timestamp {
        Timestamp::from_unix_secs(1_717_408_800)
    }

    #[test]
    fn room_provisioner_is_object_safe() {
        fn _accepts_dyn(_provisioner: &dyn RoomProvisioner) {}
    }

    #[test]
    fn expiry_is_grace_period_past_scheduled_end() {
        // Session ends 3 hours from now: expiry = 3h + 2h = 300 minutes.
        let end = now().plus_hours(3);
        assert_eq!(room_expiry_minutes(now(), end), 300);
    }

    #[test]
    fn expiry_is_floored_for_imminent_or_past_ends() {
        // Session already ended: still grant the 60-minute floor.
        let end = now().minus_hours(5);
        assert_eq!(room_expiry_minutes(now(), end), 60);

        // Ends in 30 minutes: 30 + 120 = 150, above the floor.
        let end = now().plus_minutes(30);
        assert_eq!(room_expiry_minutes(now(), end), 150);
    }
}
