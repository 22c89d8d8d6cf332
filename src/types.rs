//! Config records as stored remotely, and read options.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default freshness window for cached reads (5 minutes).
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(5 * 60);

/// Default number of config keys held in the cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigType {
    Announcement,
    LlmConfig,
    ApiConfig,
    FeatureFlag,
    Custom,
}

/// One row of the remote config table.
///
/// `data` may be sealed (`{ "_enc": "enc:v1:..." }`) when it comes from the
/// store; records handed out by `ConfigService` carry the opened payload
/// unless opening failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub id: String,
    #[serde(rename = "config_key")]
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "config_data", default)]
    pub data: Map<String, Value>,
    #[serde(rename = "config_type", default)]
    pub config_type: Option<ConfigType>,
    #[serde(rename = "is_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConfigRecord {
    /// New active record with a random id, timestamped now.
    pub fn new(key: impl Into<String>, name: impl Into<String>, data: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            key: key.into(),
            name: name.into(),
            description: None,
            data,
            config_type: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_type(mut self, config_type: ConfigType) -> Self {
        self.config_type = Some(config_type);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }
}

/// Options for `ConfigService::get_config`.
#[derive(Debug, Clone, Copy)]
pub struct GetConfigOptions {
    /// Consult the cache before the store. Default: true.
    pub use_cache: bool,
    /// How old a cached entry may be and still count as fresh.
    pub cache_duration: Duration,
}

impl Default for GetConfigOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            cache_duration: DEFAULT_CACHE_DURATION,
        }
    }
}

impl GetConfigOptions {
    pub fn bypass_cache() -> Self {
        Self {
            use_cache: false,
            ..Default::default()
        }
    }
}
