//! The remote config store consumed by `ConfigService`.

use async_trait::async_trait;

use crate::types::{ConfigRecord, ConfigType};

// ============================================================================
// ConfigStore — user-provided backend
// ============================================================================

/// Backend holding the config table.
///
/// Implementations own transport concerns (HTTP, SQL, ...), including any
/// timeout and retry policy. Returned records may carry sealed payloads;
/// opening them is the service's job.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetch one record by key. `Ok(None)` when no (active) record matches.
    async fn fetch_by_key(
        &self,
        config_key: &str,
        active_only: bool,
    ) -> Result<Option<ConfigRecord>, StoreError>;

    /// Fetch every record whose key is in `config_keys`. Missing keys are
    /// simply absent from the result.
    async fn fetch_by_keys(
        &self,
        config_keys: &[String],
        active_only: bool,
    ) -> Result<Vec<ConfigRecord>, StoreError>;

    /// Fetch every record of a type, newest `created_at` first.
    async fn fetch_by_type(
        &self,
        config_type: ConfigType,
        active_only: bool,
    ) -> Result<Vec<ConfigRecord>, StoreError>;
}

/// Broad classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Network or availability problem; a later call may succeed.
    Transient,
    /// The backend rejected the request (auth, permissions, bad query).
    Rejected,
    /// The backend answered with rows that could not be decoded.
    InvalidResponse,
}

/// Store-level error (wraps arbitrary error strings from the backend).
#[derive(Debug, Clone)]
pub struct StoreError {
    pub message: String,
    pub kind: StoreErrorKind,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: StoreErrorKind::Transient,
        }
    }

    pub fn with_kind(message: impl Into<String>, kind: StoreErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StoreError {}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::with_kind(e.to_string(), StoreErrorKind::InvalidResponse)
    }
}
