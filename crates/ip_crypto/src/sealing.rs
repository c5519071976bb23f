//! Content sealing
//!
//! Symmetric side of payload delivery. Every payload is encrypted under a
//! fresh AES-256-CBC key + IV, and the ciphertext is digested with BLAKE3 as
//! it is produced. Opening drives the decryptor through an
//! `AuthenticatedTransform` whose callback compares digests only after the
//! last block, so tampering surfaces as `VerificationFailed` rather than as
//! plausible plaintext.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::RngCore;
use zeroize::ZeroizeOnDrop;

use crate::cipher::{CbcDecryptor, CbcEncryptor, BLOCK_SIZE};
use crate::error::CryptoError;
use crate::transform::{AuthenticatedTransform, BlockTransform, TransformError, Verification};

/// Transforms are fed in chunks of this size; uploads stream at the same
/// granularity.
pub const SEAL_CHUNK: usize = 64 * 1024;

// ── Content keys ─────────────────────────────────────────────────────────────

/// Everything a recipient needs to open one sealed blob. Key and IV are
/// cleared on drop; the digest is not secret.
#[derive(ZeroizeOnDrop)]
pub struct ContentKeys {
    key: [u8; 32],
    iv: [u8; 16],
    #[zeroize(skip)]
    digest: [u8; 32],
}

impl ContentKeys {
    pub fn new(key: [u8; 32], iv: [u8; 16], digest: [u8; 32]) -> Self {
        Self { key, iv, digest }
    }

    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    pub fn iv(&self) -> &[u8; 16] {
        &self.iv
    }

    /// BLAKE3 digest of the full ciphertext.
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }
}

// ── Seal / open ──────────────────────────────────────────────────────────────

/// Encrypt `plaintext` under a fresh key + IV. Returns the ciphertext and
/// the key material a payload reference carries to the recipient.
pub fn seal_content(plaintext: &[u8]) -> Result<(Vec<u8>, ContentKeys), CryptoError> {
    let mut key = [0u8; 32];
    let mut iv = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut key);
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let mut enc = CbcEncryptor::new(&key, &iv);
    let mut hasher = blake3::Hasher::new();
    let mut ciphertext = Vec::with_capacity(plaintext.len() + BLOCK_SIZE);

    let aligned = plaintext.len() / BLOCK_SIZE * BLOCK_SIZE;
    for chunk in plaintext[..aligned].chunks(SEAL_CHUNK) {
        let out = enc.process_block(chunk)?;
        hasher.update(&out);
        ciphertext.extend_from_slice(&out);
    }
    let out = enc.process_final_block(&plaintext[aligned..])?;
    hasher.update(&out);
    ciphertext.extend_from_slice(&out);

    let keys = ContentKeys::new(key, iv, *hasher.finalize().as_bytes());
    Ok((ciphertext, keys))
}

/// Decrypt and verify a sealed blob. Each ciphertext chunk is hashed before
/// it enters the transform, so by the final block the digest covers the
/// whole input and the deferred check can pass judgement. Output exists only
/// if the digest matches; a mismatch fails with `VerificationFailed`.
pub fn open_content(ciphertext: &[u8], keys: &ContentKeys) -> Result<Vec<u8>, CryptoError> {
    let hasher = Arc::new(Mutex::new(blake3::Hasher::new()));
    let expected = blake3::Hash::from(*keys.digest());
    let verification: Verification = {
        let hasher = Arc::clone(&hasher);
        // blake3::Hash comparison is constant-time.
        Box::new(move || {
            if hasher.lock().finalize() == expected {
                Ok(())
            } else {
                Err(TransformError::VerificationFailed)
            }
        })
    };

    let mut transform = AuthenticatedTransform::new(CbcDecryptor::new(keys.key(), keys.iv()), verification);
    let mut plaintext = Vec::with_capacity(ciphertext.len());

    let aligned = ciphertext.len() / SEAL_CHUNK * SEAL_CHUNK;
    for chunk in ciphertext[..aligned].chunks(SEAL_CHUNK) {
        hasher.lock().update(chunk);
        plaintext.extend_from_slice(&transform.process_block(chunk)?);
    }
    hasher.lock().update(&ciphertext[aligned..]);
    plaintext.extend_from_slice(&transform.process_final_block(&ciphertext[aligned..])?);
    Ok(plaintext)
}
