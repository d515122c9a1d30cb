//! Language-model provider configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";

/// OpenAI-compatible completion endpoint settings
#[derive(Debug, Deserialize)]
pub struct OracleConfig {
    /// Provider API key; the assistant cannot extract anything without it
    pub api_key: Option<Secret<String>>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Comma separated models, tried in order
    #[serde(default = "default_models")]
    pub models: String,

    /// Model for the validation passes
    pub validator_model: Option<String>,

    #[serde(default = "default_validator_enabled")]
    pub validator_enabled: bool,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Sent as `HTTP-Referer`
    pub app_url: Option<String>,

    /// Sent as `X-Title`
    pub app_title: Option<String>,
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret().as_str())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn model_list(&self) -> Vec<String> {
        self.models
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The validator model, or `None` when validation is switched off
    pub fn active_validator(&self) -> Option<String> {
        if !self.validator_enabled {
            return None;
        }
        self.validator_model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }

    /// Validate oracle configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if url::Url::parse(&self.base_url).is_err() {
            return Err(ValidationError::InvalidUrl("oracle", self.base_url.clone()));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("oracle"));
        }
        if self.api_key().is_some() && self.model_list().is_empty() {
            return Err(ValidationError::MissingRequired("ORACLE__MODELS"));
        }
        Ok(())
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            models: default_models(),
            validator_model: None,
            validator_enabled: default_validator_enabled(),
            timeout_secs: default_timeout(),
            app_url: None,
            app_title: None,
        }
    }
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_models() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_validator_enabled() -> bool {
    true
}

fn default_timeout() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_list_is_trimmed_and_ordered() {
        let config = OracleConfig {
            models: " first/model , ,second/model".into(),
            ..Default::default()
        };
        assert_eq!(config.model_list(), vec!["first/model", "second/model"]);
    }

    #[test]
    fn test_validator_respects_switch() {
        let mut config = OracleConfig {
            validator_model: Some("checker/model".into()),
            ..Default::default()
        };
        assert_eq!(config.active_validator().as_deref(), Some("checker/model"));

        config.validator_enabled = false;
        assert!(config.active_validator().is_none());
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = OracleConfig {
            api_key: Some(Secret::new("  ".into())),
            models: String::new(),
            ..Default::default()
        };
        assert!(config.api_key().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_key_requires_models() {
        let config = OracleConfig {
            api_key: Some(Secret::new("sk-or-xxx".into())),
            models: " , ".into(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("ORACLE__MODELS"))
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = OracleConfig {
            base_url: "not a url".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidUrl("oracle", _))
        ));
    }
}
