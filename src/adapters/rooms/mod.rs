//! Video room adapters: the Daily.co provisioner and a configurable mock.

mod daily;
mod mock_provisioner;

pub use daily::{DailyConfig, DailyRoomProvisioner};
pub use mock_provisioner::MockRoomProvisioner;
