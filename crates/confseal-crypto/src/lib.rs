//! Key derivation and authenticated sealing for application config payloads.

pub mod envelope;
pub mod error;
pub mod kdf;
pub mod types;

pub use envelope::{
    decrypt_config_data, encrypt_config_data, generate_nonce, is_config_data_encrypted,
    PayloadCipher,
};
pub use error::CryptoError;
pub use kdf::{derive_key, derive_key_with_iterations, DerivedKey};
pub use types::{ENC_FIELD, ENC_PREFIX, PBKDF2_ITERATIONS};
