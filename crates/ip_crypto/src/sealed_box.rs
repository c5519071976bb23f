//! Sealed boxes for payload references
//!
//! Asymmetric side of payload delivery: a reference is sealed so only the
//! recipient named by an endpoint's encryption key can open it. Ephemeral
//! X25519 agreement, HKDF-SHA256, XChaCha20-Poly1305 (192-bit nonce).
//!
//! Wire format:
//!   [ ephemeral public key (32) | nonce (24) | ciphertext + tag ]

use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng as AeadOsRng},
    XChaCha20Poly1305,
};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::keys::{AgreementKeyPair, PublicKeyBytes};

const KDF_INFO: &[u8] = b"ironpigeon-sealed-box-v1";

/// Box key: HKDF-SHA256 over the DH output, salted with both public keys so
/// the key binds this ephemeral sender to this recipient.
fn derive_box_key(
    shared: &[u8; 32],
    ephemeral_pub: &[u8; 32],
    recipient_pub: &[u8; 32],
) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    let mut salt = [0u8; 64];
    salt[..32].copy_from_slice(ephemeral_pub);
    salt[32..].copy_from_slice(recipient_pub);
    let hk = Hkdf::<Sha256>::new(Some(&salt), shared);
    let mut key = Zeroizing::new([0u8; 32]);
    hk.expand(KDF_INFO, &mut *key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(key)
}

/// Seal `plaintext` to `recipient`. `aad` is authenticated, not encrypted.
pub fn seal_to(recipient: &PublicKeyBytes, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let recipient_pub: [u8; 32] = recipient.0.as_slice().try_into()
        .map_err(|_| CryptoError::InvalidKey("Recipient key must be 32 bytes".into()))?;

    let ephemeral = StaticSecret::random_from_rng(OsRng);
    let ephemeral_pub = PublicKey::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(&PublicKey::from(recipient_pub));

    let key = derive_box_key(shared.as_bytes(), ephemeral_pub.as_bytes(), &recipient_pub)?;
    let cipher = XChaCha20Poly1305::new_from_slice(&*key).map_err(|_| CryptoError::SealFailed)?;
    let nonce = XChaCha20Poly1305::generate_nonce(&mut AeadOsRng);
    let ciphertext = cipher
        .encrypt(&nonce, chacha20poly1305::aead::Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::SealFailed)?;

    let mut out = Vec::with_capacity(32 + 24 + ciphertext.len());
    out.extend_from_slice(ephemeral_pub.as_bytes());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Open a sealed box with the recipient's agreement key. Parse and
/// authentication failures all collapse to `OpenFailed`.
pub fn open_with(recipient: &AgreementKeyPair, data: &[u8], aad: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if data.len() < 32 + 24 {
        return Err(CryptoError::OpenFailed);
    }
    let (eph_bytes, rest) = data.split_at(32);
    let (nonce_bytes, ct) = rest.split_at(24);

    let ephemeral_pub: [u8; 32] = eph_bytes.try_into().map_err(|_| CryptoError::OpenFailed)?;
    let recipient_pub: [u8; 32] = recipient.public.0.as_slice().try_into()
        .map_err(|_| CryptoError::InvalidKey("Recipient key must be 32 bytes".into()))?;
    let shared = recipient.diffie_hellman(&PublicKeyBytes(ephemeral_pub.to_vec()))?;

    let key = derive_box_key(&shared, &ephemeral_pub, &recipient_pub)?;
    let cipher = XChaCha20Poly1305::new_from_slice(&*key).map_err(|_| CryptoError::OpenFailed)?;
    let nonce = chacha20poly1305::XNonce::from_slice(nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, chacha20poly1305::aead::Payload { msg: ct, aad })
        .map_err(|_| CryptoError::OpenFailed)?;
    Ok(Zeroizing::new(plaintext))
}
