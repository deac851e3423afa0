//! Decryptor for unencrypted newsletter deliveries.

use beacon_types::BinaryNode;
use beacon_types::models::DecryptedMessage;

use crate::error::DecryptionError;
use crate::transport::{Identity, MessageDecryptor};

/// Decryptor for newsletter deliveries, which arrive unencrypted in a
/// `plaintext` child. Messages without one are reported as failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextDecryptor;

impl MessageDecryptor for PlaintextDecryptor {
    async fn decrypt(
        &self,
        node: BinaryNode,
        _identity: &Identity,
    ) -> Result<DecryptedMessage, DecryptionError> {
        let server_id = node.attr("server_id").unwrap_or_default();

        let Some(payload) = node.child("plaintext").and_then(BinaryNode::bytes) else {
            return Err(DecryptionError {
                server_id: server_id.to_string(),
                reason: "message has no plaintext content".into(),
            });
        };

        Ok(DecryptedMessage {
            id: node.attr("id").unwrap_or(server_id).to_string(),
            from: node.attr("from").unwrap_or_default().to_string(),
            timestamp: node.attr("t").and_then(|t| t.parse().ok()),
            payload: payload.to_vec(),
        })
    }
}
