use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Malformed envelope: missing separator between nonce and ciphertext")]
    MissingSeparator,

    #[error("Malformed envelope: {part} is not valid hex")]
    InvalidHex { part: &'static str },

    #[error("Malformed envelope: nonce must be {expected} bytes, got {got}")]
    InvalidNonceLength { expected: usize, got: usize },

    #[error("Malformed envelope: ciphertext too short")]
    DataTooShort,

    #[error("Decrypted payload is not a JSON object")]
    NotAnObject,

    #[error("Decrypted payload is not valid JSON: {0}")]
    InvalidPlaintext(String),

    #[error("Integrity check failed: authentication tag mismatch")]
    IntegrityFailure,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}

impl CryptoError {
    /// True for a sealed payload whose envelope string cannot be parsed or
    /// whose plaintext is not an object.
    pub fn is_format_failure(&self) -> bool {
        matches!(
            self,
            CryptoError::MissingSeparator
                | CryptoError::InvalidHex { .. }
                | CryptoError::InvalidNonceLength { .. }
                | CryptoError::DataTooShort
                | CryptoError::NotAnObject
                | CryptoError::InvalidPlaintext(_)
        )
    }

    /// True when the authentication tag did not verify.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, CryptoError::IntegrityFailure)
    }
}
