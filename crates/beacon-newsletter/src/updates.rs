//! Parsing of newsletter message and update fetches.
//!
//! ```text
//! initial:      <iq><messages jid=..><message server_id=..>..</message>..</messages></iq>
//! incremental:  <iq><message_updates><messages><message ..>..</message>..</messages></message_updates></iq>
//! ```
//!
//! Each `message` carries an optional `<views_count count=..>` and an
//! optional `<reactions>` list of `<reaction code=.. count=..>`.

use beacon_types::BinaryNode;
use beacon_types::models::{ReactionRecord, UpdateRecord};
use futures_util::future::{join_all, try_join_all};
use tracing::{debug, trace, warn};

use crate::coerce;
use crate::error::{DecryptionError, Result};
use crate::transport::{Identity, MessageDecryptor};

/// Which shape of fetch response is being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Bulk history fetch. Messages are decrypted.
    Initial,
    /// Delta fetch of views and reactions only.
    Incremental,
}

/// What a failed decrypt does to the rest of an `Initial` batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecryptFailurePolicy {
    /// Fail the whole fetch, returning no records.
    #[default]
    AbortBatch,
    /// Keep every record; failed ones carry `decrypt_error` instead of a message.
    Partial,
}

/// Parse a fetch response into update records, in document order.
///
/// In [`FetchMode::Initial`] every message is decrypted concurrently and the
/// call completes once all of them have.
pub async fn parse_updates<D: MessageDecryptor>(
    response: &BinaryNode,
    mode: FetchMode,
    decryptor: &D,
    identity: &Identity,
    policy: DecryptFailurePolicy,
) -> Result<Vec<UpdateRecord>> {
    let Some(collection) = message_collection(response, mode) else {
        debug!(?mode, "fetch response has no messages node");
        return Ok(Vec::new());
    };

    let nodes = collection.all_children();
    let records: Vec<UpdateRecord> = match mode {
        FetchMode::Incremental => nodes.iter().map(summarize).collect(),
        FetchMode::Initial => {
            let origin = collection.attr("jid");
            let tasks = nodes
                .iter()
                .map(|node| decrypt_record(node, origin, decryptor, identity));

            match policy {
                DecryptFailurePolicy::AbortBatch => try_join_all(tasks).await?,
                DecryptFailurePolicy::Partial => join_all(tasks)
                    .await
                    .into_iter()
                    .zip(nodes)
                    .map(|(outcome, node)| {
                        outcome.unwrap_or_else(|err| {
                            warn!(server_id = %err.server_id, "keeping undecrypted record: {}", err.reason);
                            UpdateRecord {
                                decrypt_error: Some(err.reason),
                                ..summarize(node)
                            }
                        })
                    })
                    .collect(),
            }
        }
    };

    debug!(?mode, count = records.len(), "parsed newsletter fetch");
    Ok(records)
}

/// The `messages` node holding one child per fetched message.
pub fn message_collection(response: &BinaryNode, mode: FetchMode) -> Option<&BinaryNode> {
    match mode {
        FetchMode::Initial => response.child("messages"),
        FetchMode::Incremental => response.child("message_updates")?.child("messages"),
    }
}

/// Server id, views and reactions of one `message` node. No decryption.
pub fn summarize(node: &BinaryNode) -> UpdateRecord {
    let views = coerce::count_attr(node.child("views_count").and_then(|v| v.attr("count")));

    let reactions = node
        .child("reactions")
        .map(|list| {
            list.children("reaction")
                .map(|r| ReactionRecord {
                    count: coerce::count_attr(r.attr("count")),
                    code: r.attr("code").unwrap_or_default().to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    UpdateRecord {
        server_id: node.attr("server_id").unwrap_or_default().to_string(),
        views,
        reactions,
        message: None,
        decrypt_error: None,
    }
}

async fn decrypt_record<D: MessageDecryptor>(
    node: &BinaryNode,
    origin: Option<&str>,
    decryptor: &D,
    identity: &Identity,
) -> std::result::Result<UpdateRecord, DecryptionError> {
    let mut record = summarize(node);

    let mut raw = node.clone();
    if let Some(jid) = origin {
        raw.set_attr("from", jid);
    }

    trace!(server_id = %record.server_id, "decrypting fetched message");
    record.message = Some(decryptor.decrypt(raw, identity).await?);
    Ok(record)
}
