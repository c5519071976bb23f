//! ip_relay — Store-and-forward delivery over untrusted blob relays
//!
//! The relay never sees plaintext or learns who is talking to whom beyond
//! what traffic analysis gives it: uploads are ciphertext blobs, inbox
//! notifications are sealed references. Every operation takes a
//! cancellation token and fails with `Cancelled` rather than leaving work
//! half-done on the wire.
//!
//! # Modules
//! - `config`   — Service URLs, validated at construction
//! - `client`   — Blob upload, inbox creation, notification posting
//! - `fetch`    — `BlobFetcher` seam for pulling ciphertext back down
//! - `channel`  — Payload send/receive built from the pieces above
//! - `progress` — Cumulative upload progress reporting
//! - `cancel`   — Cooperative cancellation tokens
//! - `error`    — Unified error type

pub mod cancel;
pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod progress;

pub use cancel::{never, CancellationToken};
pub use channel::{receive_payload, send_payload};
pub use client::{Expiration, RelayClient, UploadOptions};
pub use config::RelayConfig;
pub use error::RelayError;
pub use fetch::{BlobFetcher, FetchedBlob};
pub use progress::{ProgressFn, ProgressStream};
pub use reqwest::Url;
