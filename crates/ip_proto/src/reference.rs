//! Payload references: the small envelope that actually reaches an inbox.
//!
//! The bulk ciphertext lives at a blob location; the reference carries that
//! location plus everything needed to decrypt and verify it. References are
//! sealed to the recipient's encryption key before posting, so the relay
//! only ever sees opaque bytes.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ip_crypto::endpoint::{Endpoint, OwnEndpoint};
use ip_crypto::sealed_box;
use ip_crypto::sealing::ContentKeys;
use ip_crypto::CryptoError;

use crate::media_type::MediaType;

/// Content type identifier for sealed references. Doubles as the
/// associated data binding the seal to its purpose.
pub const PAYLOAD_REFERENCE_CONTENT_TYPE: &str = "ironpigeon/payloadreference";

#[derive(Debug, Error)]
pub enum ReferenceError {
    /// Key, IV, or digest failed to decode or had the wrong length.
    #[error("Reference key material is malformed: {0}")]
    BadKeyMaterial(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}

/// Pointer to an uploaded ciphertext plus the material to open it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadReference {
    /// Absolute URL of the uploaded ciphertext.
    location: String,
    /// Media type of the decrypted content, not of the blob.
    content_type: MediaType,
    /// Base64 AES-256 key.
    key: String,
    /// Base64 CBC initialisation vector.
    iv: String,
    /// Base64 BLAKE3 digest of the ciphertext.
    digest: String,
    /// When the blob store may delete the ciphertext.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_utc: Option<DateTime<Utc>>,
}

impl PayloadReference {
    pub fn new(
        location: impl Into<String>,
        content_type: MediaType,
        keys: &ContentKeys,
        expires_utc: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            location: location.into(),
            content_type,
            key: URL_SAFE_NO_PAD.encode(keys.key()),
            iv: URL_SAFE_NO_PAD.encode(keys.iv()),
            digest: URL_SAFE_NO_PAD.encode(keys.digest()),
            expires_utc,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn content_type(&self) -> &MediaType {
        &self.content_type
    }

    pub fn expires_utc(&self) -> Option<DateTime<Utc>> {
        self.expires_utc
    }

    /// Rebuild the decryption material carried by this reference.
    pub fn content_keys(&self) -> Result<ContentKeys, ReferenceError> {
        fn decode<const N: usize>(field: &str, value: &str) -> Result<[u8; N], ReferenceError> {
            let bytes = URL_SAFE_NO_PAD
                .decode(value)
                .map_err(|e| ReferenceError::BadKeyMaterial(format!("{field}: {e}")))?;
            bytes.as_slice().try_into().map_err(|_| {
                ReferenceError::BadKeyMaterial(format!(
                    "{field}: expected {N} bytes, got {}",
                    bytes.len()
                ))
            })
        }
        Ok(ContentKeys::new(
            decode::<32>("key", &self.key)?,
            decode::<16>("iv", &self.iv)?,
            decode::<32>("digest", &self.digest)?,
        ))
    }

    /// Seal this reference to a recipient so only they can read it.
    pub fn seal_for(&self, recipient: &Endpoint) -> Result<Vec<u8>, ReferenceError> {
        let json = serde_json::to_vec(self)?;
        Ok(sealed_box::seal_to(
            recipient.encryption_key(),
            &json,
            PAYLOAD_REFERENCE_CONTENT_TYPE.as_bytes(),
        )?)
    }

    /// Open a sealed reference addressed to `own`.
    pub fn open_sealed(own: &OwnEndpoint, sealed: &[u8]) -> Result<Self, ReferenceError> {
        let json = sealed_box::open_with(
            own.agreement_key(),
            sealed,
            PAYLOAD_REFERENCE_CONTENT_TYPE.as_bytes(),
        )?;
        Ok(serde_json::from_slice(&json)?)
    }
}
