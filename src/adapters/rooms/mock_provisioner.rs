//! Mock video room provisioner for testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{CreateRoomRequest, RoomError, RoomProvisioner, VideoRoom};

#[derive(Default)]
struct MockState {
    requests: Vec<CreateRoomRequest>,
    fail: bool,
    next_seq: u32,
}

/// Mock provisioner that mints deterministic room URLs and supports error
/// injection.
#[derive(Default, Clone)]
pub struct MockRoomProvisioner {
    inner: Arc<Mutex<MockState>>,
}

impl MockRoomProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every room creation fail.
    pub fn fail_rooms(&self) {
        self.inner.lock().unwrap().fail = true;
    }

    /// Restore normal behavior.
    pub fn recover(&self) {
        self.inner.lock().unwrap().fail = false;
    }

    /// Recorded room requests.
    pub fn requests(&self) -> Vec<CreateRoomRequest> {
        self.inner.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl RoomProvisioner for MockRoomProvisioner {
    async fn create_room(&self, request: CreateRoomRequest) -> Result<VideoRoom, RoomError> {
        let mut state = self.inner.lock().unwrap();
        if state.fail {
            return Err(RoomError::Network("simulated room failure".to_string()));
        }
        state.next_seq += 1;
        let room = VideoRoom {
            id: format!("room_mock_{}", state.next_seq),
            url: format!("https://rooms.example/{}", request.reference),
        };
        state.requests.push(request);
        Ok(room)
    }
}
