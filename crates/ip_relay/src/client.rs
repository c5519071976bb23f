//! HTTP client for blob storage relays and inbox factories.

use chrono::{DateTime, Utc};
use reqwest::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Url};
use tokio::io::AsyncRead;
use tracing::{debug, warn};

use ip_proto::{InboxCreationResponse, MediaType, PAYLOAD_REFERENCE_CONTENT_TYPE};

use crate::cancel::{cancelled, CancellationToken};
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::progress::{ProgressFn, ProgressStream};

// ── Upload options ───────────────────────────────────────────────────────────

/// When the relay may garbage-collect an uploaded blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiration {
    #[default]
    Never,
    At(DateTime<Utc>),
}

impl Expiration {
    /// Whole minutes from `now` until expiry, as the relay's
    /// `lifetimeInMinutes` parameter expects. `Never` maps to the largest
    /// representable value; instants already past clamp to zero.
    pub fn lifetime_minutes(self, now: DateTime<Utc>) -> u32 {
        match self {
            Self::Never => u32::MAX,
            Self::At(when) => (when - now).num_minutes().clamp(0, u32::MAX as i64) as u32,
        }
    }

    pub fn expires_utc(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Never => None,
            Self::At(when) => Some(when),
        }
    }
}

#[derive(Clone, Default)]
pub struct UploadOptions {
    /// Media type stored alongside the blob.
    pub content_type: Option<MediaType>,
    /// Encoding of the uploaded bytes (e.g. `gzip`) when the caller
    /// compressed them before sealing.
    pub content_encoding: Option<String>,
    /// Total size when known, so the relay can reject oversize uploads
    /// early instead of mid-stream.
    pub content_length: Option<u64>,
    pub expiration: Expiration,
    /// Invoked with cumulative bytes sent.
    pub progress: Option<ProgressFn>,
}

// ── Client ───────────────────────────────────────────────────────────────────

/// Client for one relay deployment.
///
/// Every network operation takes a cancellation token and checks it before
/// the first byte leaves, so a cancelled call has no remote side effects.
#[derive(Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    config: RelayConfig,
}

impl RelayClient {
    pub fn new(config: RelayConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ironpigeon-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client");
        Self { http, config }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Upload `content` to the configured blob store and return the
    /// absolute URL it can be fetched from.
    pub async fn upload<R>(
        &self,
        content: R,
        options: &UploadOptions,
        cancellation: CancellationToken,
    ) -> Result<Url, RelayError>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let base = self
            .config
            .blob_post_url()
            .ok_or(RelayError::NotConfigured("blob storage"))?;
        if *cancellation.borrow() {
            return Err(RelayError::Cancelled);
        }

        let lifetime = options.expiration.lifetime_minutes(Utc::now());
        let mut url = base.clone();
        url.query_pairs_mut().append_pair("lifetimeInMinutes", &lifetime.to_string());

        let mut request = self
            .http
            .post(url)
            .body(Body::wrap_stream(ProgressStream::new(content, options.progress.clone())));
        if let Some(content_type) = &options.content_type {
            request = request.header(CONTENT_TYPE, content_type.as_str());
        }
        if let Some(encoding) = &options.content_encoding {
            request = request.header(CONTENT_ENCODING, encoding.as_str());
        }
        if let Some(length) = options.content_length {
            request = request.header(CONTENT_LENGTH, length);
        }

        debug!(lifetime_minutes = lifetime, content_length = options.content_length, "uploading blob");
        let run = async {
            let response = request
                .send()
                .await
                .map_err(|e| RelayError::UploadFailed(e.to_string()))?;
            if !response.status().is_success() {
                warn!(status = %response.status(), "blob upload rejected");
                return Err(RelayError::UploadFailed(format!("status {}", response.status())));
            }
            // The body is a JSON string literal holding the blob's URL.
            let location: String = response
                .json()
                .await
                .map_err(|e| RelayError::UploadFailed(e.to_string()))?;
            let location = Url::parse(&location).map_err(|e| {
                RelayError::UploadFailed(format!("relay returned invalid location {location:?}: {e}"))
            })?;
            debug!(location = %location, "blob uploaded");
            Ok(location)
        };
        tokio::select! {
            _ = cancelled(cancellation.clone()) => Err(RelayError::Cancelled),
            result = run => result,
        }
    }

    /// Ask the inbox factory for a fresh inbox.
    pub async fn create_inbox(
        &self,
        cancellation: CancellationToken,
    ) -> Result<InboxCreationResponse, RelayError> {
        let base = self
            .config
            .inbox_factory_url()
            .ok_or(RelayError::NotConfigured("inbox creation"))?;
        if *cancellation.borrow() {
            return Err(RelayError::Cancelled);
        }

        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| RelayError::InboxCreationFailed("factory URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push("create");

        let run = async {
            let response = self
                .http
                .post(url)
                .send()
                .await
                .map_err(|e| RelayError::InboxCreationFailed(e.to_string()))?;
            if !response.status().is_success() {
                warn!(status = %response.status(), "inbox creation rejected");
                return Err(RelayError::InboxCreationFailed(format!(
                    "status {}",
                    response.status()
                )));
            }
            let created: InboxCreationResponse = response
                .json()
                .await
                .map_err(|e| RelayError::InboxCreationFailed(e.to_string()))?;
            debug!(inbox = %created.message_receiving_endpoint, "inbox created");
            Ok(created)
        };
        tokio::select! {
            _ = cancelled(cancellation.clone()) => Err(RelayError::Cancelled),
            result = run => result,
        }
    }

    /// Post a sealed payload reference to a recipient's inbox.
    pub async fn post_notification(
        &self,
        inbox: &Url,
        sealed_reference: Vec<u8>,
        lifetime: Expiration,
        cancellation: CancellationToken,
    ) -> Result<(), RelayError> {
        if *cancellation.borrow() {
            return Err(RelayError::Cancelled);
        }
        let mut url = inbox.clone();
        url.query_pairs_mut()
            .append_pair("lifetimeInMinutes", &lifetime.lifetime_minutes(Utc::now()).to_string());

        let run = async {
            let response = self
                .http
                .post(url)
                .header(CONTENT_TYPE, PAYLOAD_REFERENCE_CONTENT_TYPE)
                .body(sealed_reference)
                .send()
                .await
                .map_err(|e| RelayError::NotificationFailed(e.to_string()))?;
            if !response.status().is_success() {
                warn!(status = %response.status(), inbox = %inbox, "notification rejected");
                return Err(RelayError::NotificationFailed(format!(
                    "status {}",
                    response.status()
                )));
            }
            debug!(inbox = %inbox, "notification posted");
            Ok(())
        };
        tokio::select! {
            _ = cancelled(cancellation.clone()) => Err(RelayError::Cancelled),
            result = run => result,
        }
    }
}
