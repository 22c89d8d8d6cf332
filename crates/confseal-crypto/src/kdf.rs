//! PBKDF2-SHA256 key derivation for the config key.

use std::fmt;

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::types::{AES_KEY_LENGTH, PBKDF2_ITERATIONS};

/// A 256-bit key derived from the application secret pair.
///
/// Zeroized on drop. `Debug` never prints key material.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; AES_KEY_LENGTH]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; AES_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; AES_KEY_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([redacted])")
    }
}

/// Derive the config key from `app_key` (key material) and `app_id` (salt).
///
/// PBKDF2-HMAC-SHA256, 100,000 iterations, 32-byte output. This is
/// deliberately slow; callers should derive once and keep the result.
pub fn derive_key(app_key: &str, app_id: &str) -> DerivedKey {
    derive_key_with_iterations(app_key, app_id, PBKDF2_ITERATIONS)
}

/// Same as [`derive_key`] with an explicit iteration count.
///
/// # Arguments
/// * `secret` - Key material (UTF-8 bytes are used as-is)
/// * `salt` - Salt (UTF-8 bytes are used as-is)
/// * `iterations` - PBKDF2 round count
pub fn derive_key_with_iterations(secret: &str, salt: &str, iterations: u32) -> DerivedKey {
    let mut okm = [0u8; AES_KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt.as_bytes(), iterations, &mut okm);
    let key = DerivedKey(okm);
    okm.zeroize();
    key
}
