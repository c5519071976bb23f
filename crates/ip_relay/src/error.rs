//! Unified error type for relay operations.

use thiserror::Error;

use ip_crypto::CryptoError;
use ip_proto::{PayloadError, ReferenceError};

/// Failures are classified by which relay operation broke, so callers can
/// tell a rejected upload from a dead inbox factory from their own
/// cancellation.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The operation needs a service role this client was never given a
    /// URL for. Raised before any network traffic.
    #[error("Relay is not configured for {0}")]
    NotConfigured(&'static str),

    #[error("Invalid relay URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Blob upload failed: {0}")]
    UploadFailed(String),

    #[error("Inbox creation failed: {0}")]
    InboxCreationFailed(String),

    #[error("Posting notification to inbox failed: {0}")]
    NotificationFailed(String),

    #[error("Blob fetch failed: {0}")]
    FetchFailed(String),

    /// The caller's cancellation signal fired before the operation
    /// completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// The recipient's endpoint does not advertise an inbox URL.
    #[error("Recipient has no message receiving endpoint")]
    NoReceivingEndpoint,

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Payload(#[from] PayloadError),
}
