use thiserror::Error;

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Stable error codes exposed to callers.
pub mod codes {
    pub const GET_FAILED: &str = "CONFIG_GET_FAILED";
    pub const NOT_FOUND: &str = "CONFIG_NOT_FOUND";
    pub const INVALID_KEY: &str = "CONFIG_INVALID_KEY";
    pub const INVALID_CREDENTIALS: &str = "CONFIG_INVALID_CREDENTIALS";
    pub const INVALID_SETTINGS: &str = "CONFIG_INVALID_SETTINGS";
    pub const CRYPTO: &str = "CONFIG_CRYPTO";
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config not found: {key}")]
    NotFound { key: String },

    #[error("Failed to fetch config: {source}")]
    FetchFailed {
        #[source]
        source: StoreError,
    },

    #[error("Invalid config key: {0}")]
    InvalidKey(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(&'static str),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] confseal_crypto::CryptoError),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::NotFound { .. } => codes::NOT_FOUND,
            ConfigError::FetchFailed { .. } => codes::GET_FAILED,
            ConfigError::InvalidKey(_) => codes::INVALID_KEY,
            ConfigError::InvalidCredentials(_) => codes::INVALID_CREDENTIALS,
            ConfigError::InvalidSettings(_) => codes::INVALID_SETTINGS,
            ConfigError::Crypto(_) => codes::CRYPTO,
        }
    }
}

impl From<StoreError> for ConfigError {
    fn from(source: StoreError) -> Self {
        ConfigError::FetchFailed { source }
    }
}
