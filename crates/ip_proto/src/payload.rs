//! Opaque content bytes paired with the media type that describes them.

use bytes::Bytes;
use thiserror::Error;

use crate::media_type::{InvalidMediaType, MediaType};

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Payload content must not be empty")]
    EmptyContent,

    #[error(transparent)]
    InvalidMediaType(#[from] InvalidMediaType),
}

/// The unit of exchange between endpoints.
///
/// `content` is never interpreted here; `content_type` tells the receiving
/// application how to. A payload that arrived through a relay also records
/// the reference location it was fetched from, so the application can see
/// where a message physically came from.
#[derive(Debug, Clone)]
pub struct Payload {
    content: Bytes,
    content_type: MediaType,
    received_from: Option<String>,
}

impl Payload {
    pub fn new(content: impl Into<Bytes>, content_type: MediaType) -> Result<Self, PayloadError> {
        let content = content.into();
        if content.is_empty() {
            return Err(PayloadError::EmptyContent);
        }
        Ok(Self { content, content_type, received_from: None })
    }

    /// A payload reconstructed on the receiving side, tagged with the
    /// location its ciphertext was downloaded from.
    pub fn received(
        content: impl Into<Bytes>,
        content_type: MediaType,
        location: impl Into<String>,
    ) -> Result<Self, PayloadError> {
        let mut payload = Self::new(content, content_type)?;
        payload.received_from = Some(location.into());
        Ok(payload)
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }

    pub fn content_type(&self) -> &MediaType {
        &self.content_type
    }

    /// Where this payload's ciphertext was fetched from, if it came
    /// through a relay.
    pub fn received_from(&self) -> Option<&str> {
        self.received_from.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> MediaType {
        "text/plain".parse().unwrap()
    }

    #[test]
    fn construction_keeps_content_untouched() {
        let content = Bytes::from_static(b"hello there");
        let payload = Payload::new(content.clone(), plain()).unwrap();
        assert_eq!(payload.content(), &content);
        // Bytes clones share the buffer; the payload must not have copied.
        assert_eq!(payload.content().as_ptr(), content.as_ptr());
        assert!(payload.received_from().is_none());
    }

    #[test]
    fn empty_content_rejected() {
        assert!(matches!(
            Payload::new(Bytes::new(), plain()),
            Err(PayloadError::EmptyContent)
        ));
    }

    #[test]
    fn invalid_media_type_converts() {
        fn build() -> Result<Payload, PayloadError> {
            Payload::new(Bytes::from_static(b"x"), "not a media type".parse()?)
        }
        assert!(matches!(build(), Err(PayloadError::InvalidMediaType(_))));
    }

    #[test]
    fn received_records_origin() {
        let payload =
            Payload::received(Bytes::from_static(b"x"), plain(), "https://relay.example/blob/1")
                .unwrap();
        assert_eq!(payload.received_from(), Some("https://relay.example/blob/1"));
    }
}
