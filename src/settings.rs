//! Startup inputs: the application secret pair and service settings.

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::types::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_DURATION};

/// The application secret pair used to derive the config key.
///
/// `app_key` is the key material, `app_id` the salt. `Debug` hides `app_key`.
#[derive(Clone)]
pub struct AppCredentials {
    app_key: String,
    app_id: String,
}

/// Hyphenated 8-4-4-4-12 hex, either case.
static UUID_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("UUID pattern is a valid regex")
});

impl AppCredentials {
    /// Validate and build the secret pair.
    ///
    /// Both values must be non-empty and `app_id` must be UUID-shaped.
    pub fn new(app_key: impl Into<String>, app_id: impl Into<String>) -> Result<Self> {
        let app_key = app_key.into();
        let app_id = app_id.into();
        if app_key.is_empty() {
            return Err(ConfigError::InvalidCredentials("app key is required"));
        }
        if app_id.is_empty() {
            return Err(ConfigError::InvalidCredentials("app id is required"));
        }
        if !UUID_SHAPE.is_match(&app_id) {
            return Err(ConfigError::InvalidCredentials("app id must be a UUID"));
        }
        Ok(Self { app_key, app_id })
    }

    /// Build the pair without validation. The caller vouches for both values.
    pub fn new_unchecked(app_key: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            app_id: app_id.into(),
        }
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("app_key", &"[redacted]")
            .field("app_id", &self.app_id)
            .finish()
    }
}

/// Tunables for `ConfigService`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceSettings {
    /// Maximum number of config keys held in the cache.
    pub cache_capacity: usize,
    /// Default freshness window in milliseconds for cached reads.
    pub cache_duration_ms: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_duration_ms: DEFAULT_CACHE_DURATION.as_millis() as u64,
        }
    }
}

impl ServiceSettings {
    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidSettings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidSettings(
                "cache_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn cache_duration(&self) -> Duration {
        Duration::from_millis(self.cache_duration_ms)
    }
}
