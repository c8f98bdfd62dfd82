//! Video room provider configuration (Daily)

use serde::Deserialize;

use super::error::ValidationError;

/// Video room provider configuration (Daily)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomsConfig {
    /// Daily API key
    pub daily_api_key: String,
}

impl RoomsConfig {
    /// Validate rooms configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.daily_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("DAILY_API_KEY"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_fails() {
        assert!(RoomsConfig::default().validate().is_err());
    }

    #[test]
    fn present_api_key_passes() {
        let config = RoomsConfig {
            daily_api_key: "dk_xxx".to_string(),
        };
        assert!(config.validate().is_ok());
    }
}
