//! Assistant behaviour configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::foundation::UserId;
use crate::domain::projects::ProjectDirectory;

/// Conversation, resolver and personalisation settings
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// The only user allowed to talk to the assistant; unset allows everyone
    pub allowed_user_id: Option<i64>,

    /// Inactivity timeout in seconds
    #[serde(default = "default_session_timeout")]
    pub session_timeout_secs: u64,

    /// Project mapping, `Name:ID,Name2:ID2`
    #[serde(default)]
    pub projects: String,

    /// IANA name of the home timezone
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Active-task cache lifetime in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Minimum fuzzy score (0-100) for a tier-3 match
    #[serde(default = "default_min_fuzzy_score")]
    pub min_fuzzy_score: u8,

    /// Updates matching more tasks than this are refused
    #[serde(default = "default_max_auto_apply_matches")]
    pub max_auto_apply_matches: usize,

    pub agent_role: Option<String>,
    pub user_name: Option<String>,
    pub user_role: Option<String>,
    /// Free-form profile, typically JSON
    pub user_profile: Option<String>,
}

impl AssistantConfig {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn allowed_user(&self) -> Option<UserId> {
        self.allowed_user_id.map(UserId::new)
    }

    pub fn project_directory(&self) -> ProjectDirectory {
        ProjectDirectory::parse(&self.projects)
    }

    /// Validate assistant configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(ValidationError::InvalidTimezone(self.timezone.clone()));
        }
        if self.min_fuzzy_score > 100 {
            return Err(ValidationError::InvalidFuzzyScore(self.min_fuzzy_score));
        }
        if self.max_auto_apply_matches == 0 {
            return Err(ValidationError::InvalidMatchCap);
        }
        if self.session_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("session"));
        }
        Ok(())
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            allowed_user_id: None,
            session_timeout_secs: default_session_timeout(),
            projects: String::new(),
            timezone: default_timezone(),
            cache_ttl_secs: default_cache_ttl(),
            min_fuzzy_score: default_min_fuzzy_score(),
            max_auto_apply_matches: default_max_auto_apply_matches(),
            agent_role: None,
            user_name: None,
            user_role: None,
            user_profile: None,
        }
    }
}

fn default_session_timeout() -> u64 {
    180
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_min_fuzzy_score() -> u8 {
    70
}

fn default_max_auto_apply_matches() -> usize {
    10
}
