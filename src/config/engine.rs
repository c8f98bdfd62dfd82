//! Lifecycle engine trigger configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Lifecycle engine trigger configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Shared secret guarding the internal trigger endpoint
    pub trigger_secret: String,
}

impl EngineConfig {
    /// Validate engine configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.trigger_secret.is_empty() {
            return Err(ValidationError::MissingRequired("TRIGGER_SECRET"));
        }
        if self.trigger_secret.len() < 16 {
            return Err(ValidationError::WeakTriggerSecret);
        }
        Ok(())
    }
}
