//! ip_crypto — IronPigeon cryptographic primitives and endpoint trust
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize all secret material on drop.
//! - Trust flows from self-signatures: an address book entry is verified
//!   against the signing key embedded in the entry itself, never against
//!   caller-supplied key material.
//! - Integrity checks that can only complete at end-of-stream are deferred,
//!   and the type system makes skipping them impossible.
//!
//! # Module layout
//! - `keys`         — Ed25519 signing + X25519 agreement key pairs
//! - `endpoint`     — public receiving identity + the private `OwnEndpoint`
//! - `address_book` — self-signed publishable entries, tolerant verification
//! - `transform`    — block transform trait + deferred-verification decorator
//! - `cipher`       — AES-256-CBC streaming encryptor/decryptor
//! - `sealing`      — bulk content encryption with BLAKE3 integrity
//! - `sealed_box`   — X25519 + HKDF + XChaCha20-Poly1305 asymmetric seal
//! - `error`        — unified error type

pub mod address_book;
pub mod cipher;
pub mod endpoint;
pub mod error;
pub mod keys;
pub mod sealed_box;
pub mod sealing;
pub mod transform;

pub use error::CryptoError;
