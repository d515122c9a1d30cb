//! Task store configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Todoist-style REST API settings
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// API token; without it confirmed results are shown as JSON instead
    pub api_token: Option<Secret<String>>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token
            .as_ref()
            .map(|t| t.expose_secret().as_str())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn is_configured(&self) -> bool {
        self.api_token().is_some()
    }

    /// Validate store configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if url::Url::parse(&self.base_url).is_err() {
            return Err(ValidationError::InvalidUrl("store", self.base_url.clone()));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("store"));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.todoist.com/rest/v2".to_string()
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_by_default() {
        let config = StoreConfig::default();
        assert!(!config.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_token_enables_store() {
        let config = StoreConfig {
            api_token: Some(Secret::new("0123abcd".into())),
            ..Default::default()
        };
        assert_eq!(config.api_token(), Some("0123abcd"));
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let config = StoreConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout("store")));
    }
}
