//! Collaborators the newsletter layer drives but does not implement.

use std::future::Future;

use beacon_types::BinaryNode;
use beacon_types::models::DecryptedMessage;

use crate::error::{DecryptionError, TransportError};

/// Host that serves newsletter media when no other host is configured.
pub const DEFAULT_MEDIA_HOST: &str = "mmg.whatsapp.net";

/// Request/response exchange over the binary message tree.
///
/// Correlation, timeouts and retries all live behind this trait.
pub trait Transport: Send + Sync {
    /// Fresh correlation id for an outbound `iq`.
    fn generate_message_tag(&self) -> String;

    /// Send `node` and resolve with the response carrying the same id.
    fn query(
        &self,
        node: BinaryNode,
    ) -> impl Future<Output = Result<BinaryNode, TransportError>> + Send;
}

/// The signed-in account, as the decryptor needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    /// Linked identity, when the account has one.
    pub lid: Option<String>,
}

/// Per-message decryption primitive.
///
/// The returned future resolves only after the decrypt side effect has been
/// committed, so the message it yields is final.
pub trait MessageDecryptor: Send + Sync {
    fn decrypt(
        &self,
        node: BinaryNode,
        identity: &Identity,
    ) -> impl Future<Output = Result<DecryptedMessage, DecryptionError>> + Send;
}

/// Turns a media `direct_path` into an absolute URL.
pub trait UrlResolver: Send + Sync {
    fn url_from_direct_path(&self, direct_path: &str) -> String;
}

/// Resolves direct paths against a single media host.
#[derive(Debug, Clone)]
pub struct MediaHostResolver {
    host: String,
}

impl MediaHostResolver {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl Default for MediaHostResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MEDIA_HOST)
    }
}

impl UrlResolver for MediaHostResolver {
    fn url_from_direct_path(&self, direct_path: &str) -> String {
        format!("https://{}{}", self.host, direct_path)
    }
}

/// Produces the encoded profile image uploaded as a newsletter picture.
pub trait PictureEncoder: Send + Sync {
    fn encode(&self, raw: &[u8]) -> Result<Vec<u8>, String>;
}
