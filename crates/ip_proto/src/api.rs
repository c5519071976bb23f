//! API response types shared with the relay service.
//! These map directly to JSON bodies on the wire.

use serde::{Deserialize, Serialize};

/// Body returned by the relay when a new inbox is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxCreationResponse {
    /// URL messages for this inbox are posted to. Goes into the owner's
    /// endpoint before it is published.
    pub message_receiving_endpoint: String,
    /// Secret the owner presents to read or purge the inbox. Absent on
    /// relays that authenticate some other way.
    #[serde(default)]
    pub inbox_owner_code: Option<String>,
}
