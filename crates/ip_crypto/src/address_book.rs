//! Self-signed address book entries
//!
//! The publishable form of an `Endpoint`: the endpoint's serialised bytes
//! plus a signature over exactly those bytes by the endpoint's own signing
//! key. Verifying against the *embedded* key proves that whoever controls
//! the signing key also approved the paired encryption key. This prevents
//! an attacker who knows a victim's signing public key from publishing a
//! look-alike entry that swaps in an attacker-held encryption key; without
//! the victim's signing secret no such entry can carry a valid
//! self-signature.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::{Digest, Sha512, Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::endpoint::Endpoint;
use crate::error::CryptoError;
use crate::keys::{PublicKeyBytes, SigningKeyPair};

/// Content type identifier for entries exchanged as blobs.
pub const ADDRESS_BOOK_ENTRY_CONTENT_TYPE: &str = "ironpigeon/addressbookentry";

// ── Errors ───────────────────────────────────────────────────────────────────

/// Why an entry was rejected. A rejected entry is discarded whole; nothing
/// in it is trusted, including the endpoint it claims to carry.
#[derive(Debug, Error)]
pub enum BadEntryError {
    /// The entry's bytes do not decode into an endpoint.
    #[error("Malformed address book entry: {0}")]
    Malformed(String),

    /// The self-signature does not verify against the embedded signing key.
    #[error("Address book entry signature mismatch")]
    SignatureMismatch,
}

// ── Signature schemes ────────────────────────────────────────────────────────

/// Signature flavours an entry may carry. Both are Ed25519 at identical
/// strength; `Ed25519ph` prehashes the message with SHA-512 (the RFC 8032
/// "ph" variant).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    Ed25519,
    Ed25519ph,
}

impl SignatureScheme {
    /// Schemes the tolerant policy tries, in order.
    pub const COMPATIBLE: [SignatureScheme; 2] = [SignatureScheme::Ed25519, SignatureScheme::Ed25519ph];

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Ed25519 => "ed25519",
            Self::Ed25519ph => "ed25519ph",
        }
    }

    /// Case-insensitive lookup; `None` for unrecognised names.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("ed25519") {
            Some(Self::Ed25519)
        } else if name.eq_ignore_ascii_case("ed25519ph") {
            Some(Self::Ed25519ph)
        } else {
            None
        }
    }

    pub(crate) fn sign(self, key: &SigningKeyPair, msg: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            Self::Ed25519 => Ok(key.sign(msg)),
            Self::Ed25519ph => {
                let mut prehash = Sha512::new();
                prehash.update(msg);
                let sig = key
                    .signing_key()
                    .sign_prehashed(prehash, None)
                    .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
                Ok(sig.to_bytes().to_vec())
            }
        }
    }

    /// Verify `sig` over `msg` with `public`. Every failure collapses to
    /// `CryptoError::SignatureVerification`.
    pub fn verify(self, public: &PublicKeyBytes, msg: &[u8], sig: &[u8]) -> Result<(), CryptoError> {
        match self {
            Self::Ed25519 => SigningKeyPair::verify(public.as_bytes(), msg, sig)
                .map_err(|_| CryptoError::SignatureVerification),
            Self::Ed25519ph => {
                let vk = VerifyingKey::from_bytes(
                    public.as_bytes().try_into().map_err(|_| CryptoError::SignatureVerification)?,
                )
                .map_err(|_| CryptoError::SignatureVerification)?;
                let sig = Signature::from_bytes(
                    sig.try_into().map_err(|_| CryptoError::SignatureVerification)?,
                );
                let mut prehash = Sha512::new();
                prehash.update(msg);
                vk.verify_prehashed(prehash, None, &sig)
                    .map_err(|_| CryptoError::SignatureVerification)
            }
        }
    }
}

/// How the verifier picks the scheme to check an entry's signature with.
///
/// `AutoDetectCompatible` exists for entries published without a scheme
/// name, possibly by a newer peer whose default differs from ours. It only
/// widens the choice among `COMPATIBLE` schemes of identical strength; the
/// signature still has to verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationPolicy {
    Explicit(SignatureScheme),
    AutoDetectCompatible,
}

impl VerificationPolicy {
    pub fn verify(self, public: &PublicKeyBytes, msg: &[u8], sig: &[u8]) -> Result<(), CryptoError> {
        match self {
            Self::Explicit(scheme) => scheme.verify(public, msg, sig),
            Self::AutoDetectCompatible => {
                for scheme in SignatureScheme::COMPATIBLE {
                    if scheme.verify(public, msg, sig).is_ok() {
                        return Ok(());
                    }
                }
                Err(CryptoError::SignatureVerification)
            }
        }
    }
}

// ── Address book entry ───────────────────────────────────────────────────────

/// Self-signed envelope around a serialised `Endpoint`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressBookEntry {
    /// Base64url of the endpoint's JSON bytes, exactly as signed.
    pub serialized_endpoint: String,

    /// Scheme the signature was made with. Entries published without one
    /// verify under the tolerant policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_scheme: Option<String>,

    /// Base64url of the 64-byte signature over the serialised endpoint
    /// bytes.
    pub signature: String,
}

impl AddressBookEntry {
    /// Sign `endpoint` with its own signing key.
    ///
    /// A signer whose public half differs from the endpoint's embedded
    /// signing key is rejected; entries are self-signed or they are
    /// nothing.
    pub fn sign(
        endpoint: &Endpoint,
        signer: &SigningKeyPair,
        scheme: SignatureScheme,
    ) -> Result<Self, CryptoError> {
        if signer.public != *endpoint.signing_key() {
            return Err(CryptoError::InvalidKey(
                "Entry must be signed by the endpoint's own signing key".into(),
            ));
        }
        let endpoint_bytes = endpoint.to_bytes()?;
        let sig = scheme.sign(signer, &endpoint_bytes)?;
        Ok(Self {
            serialized_endpoint: URL_SAFE_NO_PAD.encode(&endpoint_bytes),
            signature_scheme: Some(scheme.wire_name().to_string()),
            signature: URL_SAFE_NO_PAD.encode(sig),
        })
    }

    /// Deserialise the enclosed endpoint and check the self-signature.
    ///
    /// Verification uses the signing key found inside the just-deserialised
    /// endpoint, never an externally supplied one. Structural failures come
    /// back as `Malformed`; everything that goes wrong during verification
    /// (bad signature bytes, unrecognised scheme name, library errors)
    /// normalises to `SignatureMismatch`.
    pub fn extract_endpoint(&self) -> Result<Endpoint, BadEntryError> {
        let endpoint_bytes = URL_SAFE_NO_PAD
            .decode(&self.serialized_endpoint)
            .map_err(|e| BadEntryError::Malformed(e.to_string()))?;
        let endpoint =
            Endpoint::from_bytes(&endpoint_bytes).map_err(|e| BadEntryError::Malformed(e.to_string()))?;

        let policy = match &self.signature_scheme {
            Some(name) => VerificationPolicy::Explicit(
                SignatureScheme::from_wire_name(name).ok_or(BadEntryError::SignatureMismatch)?,
            ),
            None => VerificationPolicy::AutoDetectCompatible,
        };
        let sig = URL_SAFE_NO_PAD
            .decode(&self.signature)
            .map_err(|_| BadEntryError::SignatureMismatch)?;
        policy
            .verify(endpoint.signing_key(), &endpoint_bytes, &sig)
            .map_err(|_| BadEntryError::SignatureMismatch)?;
        Ok(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::OwnEndpoint;

    fn own() -> OwnEndpoint {
        OwnEndpoint::generate().unwrap()
    }

    #[test]
    fn round_trip_extracts_identical_endpoint() {
        let own = own();
        let entry = own.create_address_book_entry().unwrap();
        let endpoint = entry.extract_endpoint().unwrap();
        assert_eq!(&endpoint, own.endpoint());
    }

    #[test]
    fn wire_round_trip() {
        let entry = own().create_address_book_entry().unwrap();
        let json = serde_json::to_string(&entry).unwrap();
        let back: AddressBookEntry = serde_json::from_str(&json).unwrap();
        back.extract_endpoint().unwrap();
    }

    #[test]
    fn tampered_signature_is_a_mismatch() {
        let mut entry = own().create_address_book_entry().unwrap();
        let mut sig = URL_SAFE_NO_PAD.decode(&entry.signature).unwrap();
        sig[0] ^= 0x01;
        entry.signature = URL_SAFE_NO_PAD.encode(sig);
        assert!(matches!(entry.extract_endpoint(), Err(BadEntryError::SignatureMismatch)));
    }

    #[test]
    fn tampered_key_material_is_a_mismatch() {
        let mut entry = own().create_address_book_entry().unwrap();
        // Swap one character inside the embedded signing key's base64 value;
        // the endpoint still parses but the signed bytes have changed.
        let mut bytes = URL_SAFE_NO_PAD.decode(&entry.serialized_endpoint).unwrap();
        let needle = b"\"signing_key\":\"";
        let pos = bytes
            .windows(needle.len())
            .position(|w| w == needle)
            .unwrap()
            + needle.len();
        bytes[pos] = if bytes[pos] == b'A' { b'B' } else { b'A' };
        entry.serialized_endpoint = URL_SAFE_NO_PAD.encode(&bytes);
        assert!(matches!(entry.extract_endpoint(), Err(BadEntryError::SignatureMismatch)));
    }

    #[test]
    fn structural_corruption_is_malformed() {
        let mut entry = own().create_address_book_entry().unwrap();
        entry.serialized_endpoint = "%%% not base64 %%%".into();
        assert!(matches!(entry.extract_endpoint(), Err(BadEntryError::Malformed(_))));

        let mut entry = own().create_address_book_entry().unwrap();
        entry.serialized_endpoint = URL_SAFE_NO_PAD.encode(b"{}");
        assert!(matches!(entry.extract_endpoint(), Err(BadEntryError::Malformed(_))));
    }

    #[test]
    fn missing_scheme_name_verifies_tolerantly() {
        let own = own();
        for scheme in SignatureScheme::COMPATIBLE {
            let mut entry =
                AddressBookEntry::sign(own.endpoint(), own.signing_key(), scheme).unwrap();
            entry.signature_scheme = None;
            let endpoint = entry.extract_endpoint().unwrap();
            assert_eq!(&endpoint, own.endpoint());
        }
    }

    #[test]
    fn prehashed_scheme_round_trips_explicitly() {
        let own = own();
        let entry =
            AddressBookEntry::sign(own.endpoint(), own.signing_key(), SignatureScheme::Ed25519ph)
                .unwrap();
        assert_eq!(entry.signature_scheme.as_deref(), Some("ed25519ph"));
        entry.extract_endpoint().unwrap();
    }

    #[test]
    fn wrong_explicit_scheme_is_a_mismatch() {
        let own = own();
        let mut entry =
            AddressBookEntry::sign(own.endpoint(), own.signing_key(), SignatureScheme::Ed25519ph)
                .unwrap();
        entry.signature_scheme = Some("ed25519".into());
        assert!(matches!(entry.extract_endpoint(), Err(BadEntryError::SignatureMismatch)));
    }

    #[test]
    fn unrecognised_scheme_name_is_a_mismatch() {
        let own = own();
        let mut entry = own.create_address_book_entry().unwrap();
        entry.signature_scheme = Some("sha256".into());
        assert!(matches!(entry.extract_endpoint(), Err(BadEntryError::SignatureMismatch)));
    }

    #[test]
    fn scheme_names_match_case_insensitively() {
        let mut entry = own().create_address_book_entry().unwrap();
        entry.signature_scheme = Some("Ed25519".into());
        entry.extract_endpoint().unwrap();
    }

    #[test]
    fn foreign_signer_rejected_at_creation() {
        let own = own();
        let other = SigningKeyPair::generate().unwrap();
        assert!(AddressBookEntry::sign(own.endpoint(), &other, SignatureScheme::Ed25519).is_err());
    }

    #[test]
    fn substituted_encryption_key_cannot_carry_valid_signature() {
        // An attacker replaces the victim's encryption key inside the entry.
        // The signature was made over the victim's original bytes, so the
        // doctored entry must die with a mismatch.
        let victim = own();
        let attacker = own();
        let entry = victim.create_address_book_entry().unwrap();

        let bytes = URL_SAFE_NO_PAD.decode(&entry.serialized_endpoint).unwrap();
        let original = Endpoint::from_bytes(&bytes).unwrap();
        let doctored = Endpoint::new(
            original.signing_key().clone(),
            original.signing_algorithm(),
            attacker.endpoint().encryption_key().clone(),
            original.encryption_algorithm(),
            original.created_at(),
        )
        .unwrap();
        let forged = AddressBookEntry {
            serialized_endpoint: URL_SAFE_NO_PAD.encode(doctored.to_bytes().unwrap()),
            signature_scheme: entry.signature_scheme.clone(),
            signature: entry.signature.clone(),
        };
        assert!(matches!(forged.extract_endpoint(), Err(BadEntryError::SignatureMismatch)));
    }
}
