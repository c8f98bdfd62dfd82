//! Daily.co video room adapter.
//!
//! Implements the `RoomProvisioner` port against the Daily REST API. Rooms
//! are created with a hard expiry so abandoned rooms clean themselves up.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::ports::{Clock, CreateRoomRequest, RoomError, RoomProvisioner, VideoRoom};

/// Daily API configuration.
#[derive(Clone)]
pub struct DailyConfig {
    /// Daily API key.
    api_key: SecretString,

    /// Base URL for the Daily API (default: https://api.daily.co).
    api_base_url: String,
}

impl DailyConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: "https://api.daily.co".to_string(),
        }
    }

    /// Set a custom API base URL (for testing against a stub server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Daily implementation of the `RoomProvisioner` port.
pub struct DailyRoomProvisioner {
    config: DailyConfig,
    http_client: reqwest::Client,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, Deserialize)]
struct DailyRoomResponse {
    id: String,
    url: String,
}

impl DailyRoomProvisioner {
    pub fn new(config: DailyConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
            clock,
        }
    }
}

#[async_trait]
impl RoomProvisioner for DailyRoomProvisioner {
    async fn create_room(&self, request: CreateRoomRequest) -> Result<VideoRoom, RoomError> {
        let expires_at =
            self.clock.now().plus_minutes(request.expires_in_minutes).as_unix_secs();
        let body = serde_json::json!({
            "name": request.reference,
            "privacy": "private",
            "properties": {
                "max_participants": request.max_participants,
                "exp": expires_at,
                "enable_chat": request.enable_chat,
                "enable_recording": if request.enable_recording { "cloud" } else { "off" },
            },
        });

        let url = format!("{}/v1/rooms", self.config.api_base_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| RoomError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoomError::Provider(format!(
                "Daily returned {}: {}",
                status, body
            )));
        }

        let room: DailyRoomResponse = response
            .json()
            .await
            .map_err(|e| RoomError::Provider(format!("Malformed Daily response: {}", e)))?;

        Ok(VideoRoom {
            id: room.id,
            url: room.url,
        })
    }
}
