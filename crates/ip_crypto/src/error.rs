use thiserror::Error;

use crate::transform::TransformError;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Signature verification failed")]
    SignatureVerification,

    #[error("Sealed box encryption failed")]
    SealFailed,

    #[error("Sealed box decryption failed (authentication tag mismatch, possible tampering)")]
    OpenFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}
