//! ConfigService — cached, decrypting reads over a `ConfigStore`.
//!
//! Read path: cache → store → open payload with the memoized key → cache.
//! A payload that fails to open (bad tag, malformed envelope) is returned
//! raw instead of failing the read, with a warning logged.

use std::sync::{Arc, OnceLock};

use confseal_crypto::{derive_key, is_config_data_encrypted, CryptoError, PayloadCipher};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::cache::ConfigCache;
use crate::error::{ConfigError, Result};
use crate::settings::{AppCredentials, ServiceSettings};
use crate::store::ConfigStore;
use crate::types::{ConfigRecord, ConfigType, GetConfigOptions};

/// Owns the cache and the derived key for one application.
///
/// Construct once at the composition root and share via `Arc`.
pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
    credentials: AppCredentials,
    settings: ServiceSettings,
    /// Cipher over the derived key; set up on first use.
    cipher: OnceLock<PayloadCipher>,
    cache: Mutex<ConfigCache>,
}

impl ConfigService {
    /// Build a service. `credentials` are used as given; validate them with
    /// `AppCredentials::new` beforehand.
    pub fn new(
        store: Arc<dyn ConfigStore>,
        credentials: AppCredentials,
        settings: ServiceSettings,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self::from_parts(store, credentials, settings))
    }

    pub fn with_defaults(store: Arc<dyn ConfigStore>, credentials: AppCredentials) -> Self {
        Self::from_parts(store, credentials, ServiceSettings::default())
    }

    /// Assemble without validating `settings`.
    fn from_parts(
        store: Arc<dyn ConfigStore>,
        credentials: AppCredentials,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            store,
            credentials,
            cache: Mutex::new(ConfigCache::new(settings.cache_capacity)),
            settings,
            cipher: OnceLock::new(),
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Read options using this service's configured cache duration.
    pub fn default_options(&self) -> GetConfigOptions {
        GetConfigOptions {
            use_cache: true,
            cache_duration: self.settings.cache_duration(),
        }
    }

    fn cipher(&self) -> &PayloadCipher {
        self.cipher.get_or_init(|| {
            debug!("deriving config key");
            let key = derive_key(self.credentials.app_key(), self.credentials.app_id());
            PayloadCipher::from_derived(&key)
        })
    }

    /// Open `record.data` in place; if it cannot be opened leave it as
    /// fetched. Opening only ever fails with an integrity or format error.
    fn open_record(&self, mut record: ConfigRecord) -> ConfigRecord {
        match self.cipher().decrypt(&record.data) {
            Ok(data) => record.data = data,
            Err(e) => {
                warn!(
                    config_key = %record.key,
                    failure = failure_kind(&e),
                    error = %e,
                    "config payload could not be opened; returning it undecrypted"
                );
            }
        }
        record
    }

    /// Fetch one config by key.
    ///
    /// Serves a fresh cache hit when `opts.use_cache` is set; otherwise (or
    /// on a miss) fetches the active record from the store, opens it and
    /// caches the result.
    pub async fn get_config(&self, config_key: &str, opts: GetConfigOptions) -> Result<ConfigRecord> {
        if config_key.is_empty() {
            return Err(ConfigError::InvalidKey("config key must not be empty".into()));
        }

        if opts.use_cache {
            let cache = self.cache.lock();
            if let Some(entry) = cache.get(config_key, opts.cache_duration) {
                debug!(config_key, "config cache hit");
                return Ok(entry.record.clone());
            }
        }
        debug!(config_key, use_cache = opts.use_cache, "fetching config");

        let fetched = self
            .store
            .fetch_by_key(config_key, true)
            .await?
            .ok_or_else(|| ConfigError::NotFound {
                key: config_key.to_string(),
            })?;

        let record = self.open_record(fetched);

        let evicted = self.cache.lock().put(config_key, record.clone());
        if let Some(evicted) = evicted {
            debug!(config_key, evicted = %evicted, "config cache full; evicted oldest entry");
        }
        Ok(record)
    }

    /// Read one field of a config's data.
    ///
    /// A missing field yields `default`. Any failure also yields `default`
    /// when one is supplied, and propagates otherwise.
    pub async fn get_config_value(
        &self,
        config_key: &str,
        field: &str,
        default: Option<Value>,
    ) -> Result<Option<Value>> {
        match self.get_config(config_key, self.default_options()).await {
            Ok(record) => Ok(record.data.get(field).cloned().or(default)),
            Err(e) => match default {
                Some(default) => {
                    debug!(config_key, field, error = %e, "falling back to default value");
                    Ok(Some(default))
                }
                None => Err(e),
            },
        }
    }

    /// The opened data object of a config.
    pub async fn get_config_data(&self, config_key: &str) -> Result<Map<String, Value>> {
        Ok(self
            .get_config(config_key, self.default_options())
            .await?
            .data)
    }

    /// Fetch several configs at once. Bypasses the cache entirely.
    pub async fn get_configs(&self, config_keys: &[String]) -> Result<Vec<ConfigRecord>> {
        let fetched = self.store.fetch_by_keys(config_keys, true).await?;
        Ok(fetched.into_iter().map(|r| self.open_record(r)).collect())
    }

    /// Fetch every active config of a type, newest first. Bypasses the cache.
    pub async fn get_configs_by_type(&self, config_type: ConfigType) -> Result<Vec<ConfigRecord>> {
        let fetched = self.store.fetch_by_type(config_type, true).await?;
        Ok(fetched.into_iter().map(|r| self.open_record(r)).collect())
    }

    /// Drop one cached config, or all of them.
    pub fn clear_cache(&self, config_key: Option<&str>) {
        self.cache.lock().invalidate(config_key);
    }

    /// Number of configs currently cached (fresh or stale).
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Seal a data object for writing back to the store.
    pub fn encrypt_data(&self, data: &Map<String, Value>) -> Result<Map<String, Value>> {
        Ok(self.cipher().encrypt(data)?)
    }

    pub fn is_encrypted(&self, data: &Map<String, Value>) -> bool {
        is_config_data_encrypted(data)
    }
}

fn failure_kind(e: &CryptoError) -> &'static str {
    if e.is_integrity_failure() {
        "integrity"
    } else if e.is_format_failure() {
        "format"
    } else {
        "other"
    }
}
