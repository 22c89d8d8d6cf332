//! AES-256-GCM sealing of config payloads.
//!
//! A sealed payload is a JSON object with a single reserved field:
//! { "_enc": "enc:v1:<hex(nonce:12)>.<hex(ciphertext + tag:16)>" }
//!
//! Payloads without the reserved field (or without the version prefix) were
//! written before encryption existed and decrypt to themselves.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use serde_json::{Map, Value};

use crate::error::CryptoError;
use crate::kdf::DerivedKey;
use crate::types::{
    AES_GCM_NONCE_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH, ENC_FIELD, ENC_PREFIX,
    ENVELOPE_SEPARATOR,
};

/// Generate a random 12-byte nonce for AES-GCM.
pub fn generate_nonce() -> Result<[u8; AES_GCM_NONCE_LENGTH], CryptoError> {
    let mut nonce = [0u8; AES_GCM_NONCE_LENGTH];
    getrandom::getrandom(&mut nonce).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(nonce)
}

/// Returns the envelope string if `data` carries a versioned `_enc` field.
fn sealed_field(data: &Map<String, Value>) -> Option<&str> {
    match data.get(ENC_FIELD) {
        Some(Value::String(s)) if s.starts_with(ENC_PREFIX) => Some(s.as_str()),
        _ => None,
    }
}

/// Whether a payload is sealed with the current envelope version.
pub fn is_config_data_encrypted(data: &Map<String, Value>) -> bool {
    sealed_field(data).is_some()
}

/// Split "<hex nonce>.<hex ciphertext>" (prefix already removed).
fn parse_envelope(body: &str) -> Result<([u8; AES_GCM_NONCE_LENGTH], Vec<u8>), CryptoError> {
    let (nonce_hex, ciphertext_hex) = body
        .split_once(ENVELOPE_SEPARATOR)
        .ok_or(CryptoError::MissingSeparator)?;

    let nonce_bytes =
        hex::decode(nonce_hex).map_err(|_| CryptoError::InvalidHex { part: "nonce" })?;
    let nonce: [u8; AES_GCM_NONCE_LENGTH] = nonce_bytes.as_slice().try_into().map_err(|_| {
        CryptoError::InvalidNonceLength {
            expected: AES_GCM_NONCE_LENGTH,
            got: nonce_bytes.len(),
        }
    })?;

    let ciphertext =
        hex::decode(ciphertext_hex).map_err(|_| CryptoError::InvalidHex { part: "ciphertext" })?;
    if ciphertext.len() < AES_GCM_TAG_LENGTH {
        return Err(CryptoError::DataTooShort);
    }
    Ok((nonce, ciphertext))
}

/// AES-256-GCM sealing bound to one key.
///
/// Holds the expanded cipher so a memoized key is only set up once.
pub struct PayloadCipher {
    cipher: Aes256Gcm,
}

impl PayloadCipher {
    /// Create a cipher from raw key bytes.
    ///
    /// # Arguments
    /// * `key` - 32-byte (256-bit) raw key material
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != AES_KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: AES_KEY_LENGTH,
                got: key.len(),
            });
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Create a cipher from a derived key. Cannot fail on length.
    pub fn from_derived(key: &DerivedKey) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Seal `data` into `{ "_enc": "enc:v1:..." }` under a fresh nonce.
    pub fn encrypt(&self, data: &Map<String, Value>) -> Result<Map<String, Value>, CryptoError> {
        let plaintext =
            serde_json::to_vec(data).map_err(|e| CryptoError::SerializationError(e.to_string()))?;
        let encoded = self.seal_bytes(&plaintext)?;

        let mut wrapped = Map::with_capacity(1);
        wrapped.insert(ENC_FIELD.to_string(), Value::String(encoded));
        Ok(wrapped)
    }

    /// Seal raw bytes into an envelope string ("enc:v1:<nonce>.<ciphertext>").
    ///
    /// `decrypt` only accepts envelopes whose plaintext is a JSON object.
    pub fn seal_bytes(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let nonce_bytes = generate_nonce()?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        Ok(format!(
            "{}{}{}{}",
            ENC_PREFIX,
            hex::encode(nonce_bytes),
            ENVELOPE_SEPARATOR,
            hex::encode(ciphertext)
        ))
    }

    /// Open a sealed payload.
    ///
    /// Unsealed payloads are returned as-is. A sealed payload either opens
    /// to the original object or fails: `IntegrityFailure` on tag mismatch,
    /// a format error when the envelope or its plaintext cannot be parsed.
    /// No other error is returned.
    pub fn decrypt(&self, data: &Map<String, Value>) -> Result<Map<String, Value>, CryptoError> {
        let Some(sealed) = sealed_field(data) else {
            return Ok(data.clone());
        };

        let (nonce_bytes, ciphertext) = parse_envelope(&sealed[ENC_PREFIX.len()..])?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext.as_slice())
            .map_err(|_| CryptoError::IntegrityFailure)?;

        match serde_json::from_slice::<Value>(&plaintext) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(CryptoError::NotAnObject),
            Err(e) => Err(CryptoError::InvalidPlaintext(e.to_string())),
        }
    }
}

/// Seal a config payload with raw key bytes.
///
/// Returns: { "_enc": "enc:v1:<hex(nonce)>.<hex(ciphertext+tag)>" }
pub fn encrypt_config_data(
    data: &Map<String, Value>,
    key: &[u8],
) -> Result<Map<String, Value>, CryptoError> {
    PayloadCipher::new(key)?.encrypt(data)
}

/// Open a config payload with raw key bytes. Unsealed payloads pass through.
pub fn decrypt_config_data(
    data: &Map<String, Value>,
    key: &[u8],
) -> Result<Map<String, Value>, CryptoError> {
    PayloadCipher::new(key)?.decrypt(data)
}
