//! Relay service configuration.
//!
//! Each service role (blob storage, inbox factory) is independently
//! optional; a client configured with neither can still fetch blobs and
//! post notifications, which address absolute URLs. URLs are parsed and
//! validated here, once, so operations never fail on a typo mid-flight.

use reqwest::Url;

use crate::error::RelayError;

#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    blob_post_url: Option<Url>,
    inbox_factory_url: Option<Url>,
}

impl RelayConfig {
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder::default()
    }

    pub(crate) fn blob_post_url(&self) -> Option<&Url> {
        self.blob_post_url.as_ref()
    }

    pub(crate) fn inbox_factory_url(&self) -> Option<&Url> {
        self.inbox_factory_url.as_ref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelayConfigBuilder {
    blob_post_url: Option<String>,
    inbox_factory_url: Option<String>,
}

impl RelayConfigBuilder {
    /// URL blobs are POSTed to.
    pub fn blob_post_url(mut self, url: impl Into<String>) -> Self {
        self.blob_post_url = Some(url.into());
        self
    }

    /// Base URL of the inbox factory service.
    pub fn inbox_factory_url(mut self, url: impl Into<String>) -> Self {
        self.inbox_factory_url = Some(url.into());
        self
    }

    pub fn build(self) -> Result<RelayConfig, RelayError> {
        Ok(RelayConfig {
            blob_post_url: self.blob_post_url.as_deref().map(parse_service_url).transpose()?,
            inbox_factory_url: self.inbox_factory_url.as_deref().map(parse_service_url).transpose()?,
        })
    }
}

/// Absolute http(s) URLs only.
fn parse_service_url(raw: &str) -> Result<Url, RelayError> {
    let url = Url::parse(raw).map_err(|e| RelayError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(RelayError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {:?}", url.scheme()),
        });
    }
    if url.host_str().is_none() {
        return Err(RelayError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}
