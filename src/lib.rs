//! Encrypted application config.
//!
//! Config payloads are sealed with AES-256-GCM under a key derived (once)
//! from the application's `app_key`/`app_id` pair. `ConfigService` fronts a
//! remote [`ConfigStore`] with a bounded FIFO cache and opens payloads on the
//! way out; payloads written before encryption existed pass through as-is.
//!
//! ```ignore
//! let store = Arc::new(MemoryConfigStore::new());
//! let creds = AppCredentials::new(app_key, app_id)?;
//! let service = Arc::new(ConfigService::with_defaults(store, creds));
//! let banner = service.get_config("welcome_banner", GetConfigOptions::default()).await?;
//! ```

pub mod cache;
pub mod error;
pub mod service;
pub mod settings;
pub mod store;
pub mod types;

pub use cache::{CacheEntry, ConfigCache};
pub use error::{ConfigError, Result};
pub use service::ConfigService;
pub use settings::{AppCredentials, ServiceSettings};
pub use store::{ConfigStore, MemoryConfigStore, StoreError, StoreErrorKind};
pub use types::{
    ConfigRecord, ConfigType, GetConfigOptions, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_DURATION,
};

pub use confseal_crypto::{
    decrypt_config_data, derive_key, encrypt_config_data, is_config_data_encrypted, CryptoError,
    DerivedKey, PayloadCipher, ENC_FIELD, ENC_PREFIX,
};
