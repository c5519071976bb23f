//! Endpoint descriptors
//!
//! An `Endpoint` binds an identity's Ed25519 signing key to the X25519
//! encryption key that identity has approved, plus where it receives
//! payload references. Endpoints are published inside self-signed
//! `AddressBookEntry` envelopes and are immutable once signed.
//!
//! `OwnEndpoint` is the private half: the endpoint together with the secret
//! keys backing it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address_book::{AddressBookEntry, SignatureScheme};
use crate::error::CryptoError;
use crate::keys::{
    AgreementAlgorithm, AgreementKeyPair, PublicKeyBytes, SigningAlgorithm, SigningKeyPair,
};

// ── Endpoint ─────────────────────────────────────────────────────────────────

/// Public half of an identity.
///
/// Field order is the signed serialisation order; do not reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    signing_key: PublicKeyBytes,
    signing_algorithm: SigningAlgorithm,
    encryption_key: PublicKeyBytes,
    encryption_algorithm: AgreementAlgorithm,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message_receiving_endpoint: Option<String>,
}

impl Endpoint {
    pub fn new(
        signing_key: PublicKeyBytes,
        signing_algorithm: SigningAlgorithm,
        encryption_key: PublicKeyBytes,
        encryption_algorithm: AgreementAlgorithm,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CryptoError> {
        if signing_key.0.len() != 32 {
            return Err(CryptoError::InvalidKey("Signing key must be 32 bytes".into()));
        }
        if encryption_key.0.len() != 32 {
            return Err(CryptoError::InvalidKey("Encryption key must be 32 bytes".into()));
        }
        Ok(Self {
            signing_key,
            signing_algorithm,
            encryption_key,
            encryption_algorithm,
            created_at,
            message_receiving_endpoint: None,
        })
    }

    pub fn signing_key(&self) -> &PublicKeyBytes {
        &self.signing_key
    }

    pub fn signing_algorithm(&self) -> SigningAlgorithm {
        self.signing_algorithm
    }

    pub fn encryption_key(&self) -> &PublicKeyBytes {
        &self.encryption_key
    }

    pub fn encryption_algorithm(&self) -> AgreementAlgorithm {
        self.encryption_algorithm
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Inbox URL payload references for this identity are posted to.
    pub fn message_receiving_endpoint(&self) -> Option<&str> {
        self.message_receiving_endpoint.as_deref()
    }

    /// Short identity handle: the signing key's fingerprint. Stable for the
    /// life of the endpoint, safe to log, comparable out of band.
    pub fn fingerprint(&self) -> String {
        self.signing_key.fingerprint()
    }

    /// The exact bytes an address book entry signs.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

// ── Own endpoint ─────────────────────────────────────────────────────────────

/// An endpoint plus the secret keys that back it. Secrets clear on drop via
/// the key pair types.
pub struct OwnEndpoint {
    signing: SigningKeyPair,
    agreement: AgreementKeyPair,
    public: Endpoint,
}

impl OwnEndpoint {
    /// Fresh identity: new Ed25519 and X25519 key pairs.
    pub fn generate() -> Result<Self, CryptoError> {
        let signing = SigningKeyPair::generate()?;
        let agreement = AgreementKeyPair::generate()?;
        let public = Endpoint {
            signing_key: signing.public.clone(),
            signing_algorithm: SigningAlgorithm::Ed25519,
            encryption_key: agreement.public.clone(),
            encryption_algorithm: AgreementAlgorithm::X25519,
            created_at: Utc::now(),
            message_receiving_endpoint: None,
        };
        Ok(Self { signing, agreement, public })
    }

    /// Rebuild an identity from stored secret key bytes.
    pub fn from_secret_bytes(
        signing_secret: &[u8],
        agreement_secret: &[u8],
        created_at: DateTime<Utc>,
        message_receiving_endpoint: Option<String>,
    ) -> Result<Self, CryptoError> {
        let signing = SigningKeyPair::from_bytes(signing_secret)?;
        let agreement = AgreementKeyPair::from_bytes(agreement_secret)?;
        let public = Endpoint {
            signing_key: signing.public.clone(),
            signing_algorithm: SigningAlgorithm::Ed25519,
            encryption_key: agreement.public.clone(),
            encryption_algorithm: AgreementAlgorithm::X25519,
            created_at,
            message_receiving_endpoint,
        };
        Ok(Self { signing, agreement, public })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.public
    }

    pub fn signing_key(&self) -> &SigningKeyPair {
        &self.signing
    }

    pub fn agreement_key(&self) -> &AgreementKeyPair {
        &self.agreement
    }

    /// Record the inbox URL handed back by the relay. Entries sign the
    /// endpoint as it stands, so this must happen before publication.
    pub fn set_message_receiving_endpoint(&mut self, url: impl Into<String>) {
        self.public.message_receiving_endpoint = Some(url.into());
    }

    /// Self-signed entry for publication, canonical scheme.
    pub fn create_address_book_entry(&self) -> Result<AddressBookEntry, CryptoError> {
        AddressBookEntry::sign(&self.public, &self.signing, SignatureScheme::Ed25519)
    }
}
