//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `TASKTALK` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use tasktalk::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Home timezone: {}", config.assistant.timezone);
//! ```

mod assistant;
mod error;
mod logging;
mod oracle;
mod store;
mod transcriber;

pub use assistant::AssistantConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::{LogFormat, LoggingConfig};
pub use oracle::OracleConfig;
pub use store::StoreConfig;
pub use transcriber::TranscriberConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment loads; the oracle API
/// key is the only value needed for a useful run.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Conversation, resolver and personalisation settings
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Language-model provider
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Remote task store
    #[serde(default)]
    pub store: StoreConfig,

    /// Voice transcription
    #[serde(default)]
    pub transcriber: TranscriberConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `TASKTALK` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `TASKTALK__ASSISTANT__TIMEZONE=Europe/Berlin` -> `assistant.timezone`
    /// - `TASKTALK__ORACLE__MODELS=a/one,b/two` -> `oracle.models`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TASKTALK")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.assistant.validate()?;
        self.oracle.validate()?;
        self.store.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use std::time::Duration;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "TASKTALK__ASSISTANT__ALLOWED_USER_ID",
        "TASKTALK__ASSISTANT__TIMEZONE",
        "TASKTALK__ASSISTANT__SESSION_TIMEOUT_SECS",
        "TASKTALK__ASSISTANT__PROJECTS",
        "TASKTALK__ORACLE__API_KEY",
        "TASKTALK__ORACLE__MODELS",
        "TASKTALK__STORE__API_TOKEN",
        "TASKTALK__LOGGING__FORMAT",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_with_empty_environment_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.assistant.timezone, "UTC");
        assert_eq!(config.assistant.session_timeout(), Duration::from_secs(180));
        assert!(config.oracle.api_key().is_none());
        assert!(!config.store.is_configured());
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("TASKTALK__ASSISTANT__ALLOWED_USER_ID", "4242");
        env::set_var("TASKTALK__ASSISTANT__TIMEZONE", "Europe/Moscow");
        env::set_var("TASKTALK__ASSISTANT__SESSION_TIMEOUT_SECS", "300");
        env::set_var("TASKTALK__ASSISTANT__PROJECTS", "Work:77,Home:88");
        env::set_var("TASKTALK__ORACLE__API_KEY", "sk-or-xxx");
        env::set_var("TASKTALK__ORACLE__MODELS", "a/one,b/two");
        env::set_var("TASKTALK__STORE__API_TOKEN", "tok");
        env::set_var("TASKTALK__LOGGING__FORMAT", "json");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.assistant.allowed_user_id, Some(4242));
        assert_eq!(config.assistant.timezone, "Europe/Moscow");
        assert_eq!(config.assistant.session_timeout_secs, 300);
        assert_eq!(config.assistant.project_directory().names().count(), 2);
        assert_eq!(config.oracle.api_key(), Some("sk-or-xxx"));
        assert_eq!(config.oracle.model_list(), vec!["a/one", "b/two"]);
        assert!(config.store.is_configured());
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_bad_timezone() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("TASKTALK__ASSISTANT__TIMEZONE", "Nowhere/Land");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTimezone(tz)) if tz == "Nowhere/Land"
        ));
    }
}
