//! ip_proto — Wire types and serialisation for IronPigeon messaging
//!
//! Everything a relay or a peer sees on the wire is defined here: payloads,
//! the sealed references that point at them, and the relay's JSON API
//! bodies. All on-wire types serialise to JSON.
//!
//! # Modules
//! - `payload`    — Content bytes + media type (what applications exchange)
//! - `reference`  — Sealed pointer to an uploaded ciphertext
//! - `media_type` — Validated `type/subtype` strings
//! - `api`        — JSON bodies shared with the relay service

pub mod api;
pub mod media_type;
pub mod payload;
pub mod reference;

pub use api::InboxCreationResponse;
pub use media_type::{InvalidMediaType, MediaType};
pub use payload::{Payload, PayloadError};
pub use reference::{PayloadReference, ReferenceError, PAYLOAD_REFERENCE_CONTENT_TYPE};
