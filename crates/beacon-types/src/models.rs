use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message after the decrypt collaborator has finalized it.
/// This layer does not look inside `payload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptedMessage {
    pub id: String,
    /// Newsletter jid the message was delivered from.
    pub from: String,
    pub timestamp: Option<i64>,
    pub payload: Vec<u8>,
}

/// Aggregated count for a single reaction code on a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub count: u64,
    pub code: String,
}

/// One parsed item from a newsletter message or update fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub server_id: String,
    pub views: u64,
    pub reactions: Vec<ReactionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<DecryptedMessage>,
    /// Set instead of `message` when decryption failed and the fetch ran
    /// with partial results enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decrypt_error: Option<String>,
}

/// Flattened description of a newsletter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub id: String,
    pub state: Option<String>,
    pub creation_time: Option<i64>,
    pub name: Option<String>,
    pub name_time: Option<i64>,
    pub description: Option<String>,
    pub description_time: Option<i64>,
    pub invite: Option<String>,
    pub picture: String,
    pub preview: String,
    pub reaction_codes: Option<String>,
    pub subscribers: Option<i64>,
    pub verification: Option<String>,
    pub viewer_metadata: Option<Value>,
}
