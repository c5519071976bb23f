//! Fetching uploaded blobs back out of storage.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use tracing::debug;

use crate::cancel::{cancelled, CancellationToken};
use crate::client::RelayClient;
use crate::error::RelayError;

/// A downloaded blob plus whatever media type the store recorded for it.
#[derive(Debug, Clone)]
pub struct FetchedBlob {
    pub content: Bytes,
    pub content_type: Option<String>,
}

/// Source of blob bytes. The seam exists so receiving code can pull from
/// an HTTP store, a cache, or a test double without caring which.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    async fn fetch(
        &self,
        location: &Url,
        cancellation: CancellationToken,
    ) -> Result<FetchedBlob, RelayError>;
}

#[async_trait]
impl BlobFetcher for RelayClient {
    async fn fetch(
        &self,
        location: &Url,
        cancellation: CancellationToken,
    ) -> Result<FetchedBlob, RelayError> {
        if *cancellation.borrow() {
            return Err(RelayError::Cancelled);
        }
        let run = async {
            let response = self
                .http()
                .get(location.clone())
                .send()
                .await
                .map_err(|e| RelayError::FetchFailed(e.to_string()))?;
            if !response.status().is_success() {
                return Err(RelayError::FetchFailed(format!("status {}", response.status())));
            }
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let content = response
                .bytes()
                .await
                .map_err(|e| RelayError::FetchFailed(e.to_string()))?;
            debug!(location = %location, bytes = content.len(), "blob fetched");
            Ok(FetchedBlob { content, content_type })
        };
        tokio::select! {
            _ = cancelled(cancellation.clone()) => Err(RelayError::Cancelled),
            result = run => result,
        }
    }
}
