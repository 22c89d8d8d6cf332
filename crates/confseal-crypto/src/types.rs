/// Reserved field inside a config payload that carries the sealed envelope.
pub const ENC_FIELD: &str = "_enc";

/// Version tag prefixed to every envelope string.
///
/// Version 1: AES-256-GCM, key from PBKDF2-SHA256(appKey, appId)
/// Format: "enc:v1:" + hex(nonce:12B) + "." + hex(ciphertext + tag:16B)
pub const ENC_PREFIX: &str = "enc:v1:";

/// Separator between the nonce and ciphertext halves of an envelope.
pub const ENVELOPE_SEPARATOR: char = '.';

/// PBKDF2 iteration count for the config key.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// AES-GCM nonce length in bytes (96 bits per NIST recommendation).
pub const AES_GCM_NONCE_LENGTH: usize = 12;

/// AES-GCM tag length in bytes (128 bits).
pub const AES_GCM_TAG_LENGTH: usize = 16;

/// AES key length in bytes (256 bits).
pub const AES_KEY_LENGTH: usize = 32;
