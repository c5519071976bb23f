//! End-to-end payload exchange over a relay.
//!
//! Sending: seal the content, upload the ciphertext, then post a sealed
//! reference to the recipient's inbox. The relay stores two opaque blobs
//! and learns nothing else. Receiving runs the same steps backwards, with
//! the ciphertext digest checked before any plaintext is trusted.

use std::io::Cursor;

use reqwest::Url;
use tracing::debug;

use ip_crypto::endpoint::{Endpoint, OwnEndpoint};
use ip_crypto::sealing::{open_content, seal_content};
use ip_proto::{MediaType, Payload, PayloadReference};

use crate::cancel::CancellationToken;
use crate::client::{Expiration, RelayClient, UploadOptions};
use crate::error::RelayError;
use crate::fetch::BlobFetcher;

/// Deliver `payload` to `recipient`, returning the reference that was
/// sealed and posted to their inbox.
pub async fn send_payload(
    client: &RelayClient,
    recipient: &Endpoint,
    payload: &Payload,
    expiration: Expiration,
    cancellation: CancellationToken,
) -> Result<PayloadReference, RelayError> {
    let inbox = recipient
        .message_receiving_endpoint()
        .ok_or(RelayError::NoReceivingEndpoint)?;
    let inbox = Url::parse(inbox).map_err(|e| RelayError::InvalidUrl {
        url: inbox.to_string(),
        reason: e.to_string(),
    })?;

    let (ciphertext, keys) = seal_content(payload.content())?;
    let options = UploadOptions {
        content_type: Some(MediaType::octet_stream()),
        content_encoding: None,
        content_length: Some(ciphertext.len() as u64),
        expiration,
        progress: None,
    };
    let location = client.upload(Cursor::new(ciphertext), &options, cancellation.clone()).await?;

    let reference = PayloadReference::new(
        location.as_str(),
        payload.content_type().clone(),
        &keys,
        expiration.expires_utc(),
    );
    let sealed = reference.seal_for(recipient)?;
    client.post_notification(&inbox, sealed, expiration, cancellation).await?;
    debug!(recipient = %recipient.fingerprint(), location = %location, "payload sent");
    Ok(reference)
}

/// Open a sealed reference from our inbox and pull down the payload it
/// points at.
pub async fn receive_payload(
    fetcher: &dyn BlobFetcher,
    own: &OwnEndpoint,
    sealed_reference: &[u8],
    cancellation: CancellationToken,
) -> Result<Payload, RelayError> {
    let reference = PayloadReference::open_sealed(own, sealed_reference)?;
    let keys = reference.content_keys()?;
    let location = Url::parse(reference.location()).map_err(|e| RelayError::InvalidUrl {
        url: reference.location().to_string(),
        reason: e.to_string(),
    })?;

    let blob = fetcher.fetch(&location, cancellation).await?;
    let content = open_content(&blob.content, &keys)?;
    debug!(location = %location, bytes = content.len(), "payload received");
    Ok(Payload::received(content, reference.content_type().clone(), location.as_str())?)
}
