//! Scripted collaborators shared by the unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use beacon_types::BinaryNode;
use beacon_types::models::DecryptedMessage;
use serde_json::Value;

use crate::error::{DecryptionError, TransportError};
use crate::transport::{Identity, MessageDecryptor, Transport};

/// Replays queued responses in order and records every node sent.
/// An exhausted queue answers with an empty `iq`.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<BinaryNode, TransportError>>>,
    sent: Mutex<Vec<BinaryNode>>,
    tags: AtomicU64,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, node: BinaryNode) {
        self.responses.lock().unwrap().push_back(Ok(node));
    }

    pub fn fail(&self, err: TransportError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn sent(&self) -> Vec<BinaryNode> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn generate_message_tag(&self) -> String {
        format!("tag-{}", self.tags.fetch_add(1, Ordering::Relaxed) + 1)
    }

    async fn query(&self, node: BinaryNode) -> Result<BinaryNode, TransportError> {
        self.sent.lock().unwrap().push(node);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(BinaryNode::new("iq")))
    }
}

/// Echoes each node's `plaintext` bytes, failing for listed server ids.
#[derive(Default)]
pub struct EchoDecryptor {
    failing: HashSet<String>,
    seen_from: Mutex<Vec<Option<String>>>,
}

impl EchoDecryptor {
    pub fn failing_on(ids: &[&str]) -> Self {
        Self {
            failing: ids.iter().map(|s| s.to_string()).collect(),
            seen_from: Mutex::default(),
        }
    }

    /// `from` attribute of every node handed to `decrypt`, in call order.
    pub fn seen_from(&self) -> Vec<Option<String>> {
        self.seen_from.lock().unwrap().clone()
    }
}

impl MessageDecryptor for EchoDecryptor {
    async fn decrypt(
        &self,
        node: BinaryNode,
        _identity: &Identity,
    ) -> Result<DecryptedMessage, DecryptionError> {
        let server_id = node.attr("server_id").unwrap_or_default().to_string();
        self.seen_from
            .lock()
            .unwrap()
            .push(node.attr("from").map(str::to_string));

        // yield so sibling decrypts interleave
        tokio::task::yield_now().await;

        if self.failing.contains(&server_id) {
            return Err(DecryptionError {
                server_id,
                reason: "no session".into(),
            });
        }

        Ok(DecryptedMessage {
            id: server_id,
            from: node.attr("from").unwrap_or_default().to_string(),
            timestamp: None,
            payload: node
                .child("plaintext")
                .and_then(BinaryNode::bytes)
                .unwrap_or_default()
                .to_vec(),
        })
    }
}

/// Takes a fixed time per server id and records the order decrypts finish in.
pub struct DelayedDecryptor {
    delays: HashMap<String, Duration>,
    finished: Mutex<Vec<String>>,
}

impl DelayedDecryptor {
    pub fn new(delays: &[(&str, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|(id, ms)| (id.to_string(), Duration::from_millis(*ms)))
                .collect(),
            finished: Mutex::default(),
        }
    }

    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }
}

impl MessageDecryptor for DelayedDecryptor {
    async fn decrypt(
        &self,
        node: BinaryNode,
        _identity: &Identity,
    ) -> Result<DecryptedMessage, DecryptionError> {
        let server_id = node.attr("server_id").unwrap_or_default().to_string();
        let delay = self.delays.get(&server_id).copied().unwrap_or_default();
        tokio::time::sleep(delay).await;

        self.finished.lock().unwrap().push(server_id.clone());
        Ok(DecryptedMessage {
            id: server_id,
            from: node.attr("from").unwrap_or_default().to_string(),
            timestamp: None,
            payload: Vec::new(),
        })
    }
}

pub fn identity() -> Identity {
    Identity {
        id: "15550001111:3@s.whatsapp.net".into(),
        lid: None,
    }
}

/// `iq` response whose `result` child carries `json`.
pub fn result_node(json: &Value) -> BinaryNode {
    BinaryNode::new("iq")
        .with_attr("type", "result")
        .with_children(vec![
            BinaryNode::new("result").with_bytes(json.to_string().into_bytes()),
        ])
}

/// A fetched `message` node with optional views and reactions.
pub fn message_node(server_id: &str, views: Option<&str>, reactions: &[(&str, &str)]) -> BinaryNode {
    let mut children = vec![BinaryNode::new("plaintext").with_bytes(server_id.as_bytes().to_vec())];
    if let Some(count) = views {
        children.push(BinaryNode::new("views_count").with_attr("count", count));
    }
    if !reactions.is_empty() {
        children.push(
            BinaryNode::new("reactions").with_children(
                reactions
                    .iter()
                    .map(|(code, count)| {
                        BinaryNode::new("reaction")
                            .with_attr("code", *code)
                            .with_attr("count", *count)
                    })
                    .collect(),
            ),
        );
    }

    BinaryNode::new("message")
        .with_attr("server_id", server_id)
        .with_children(children)
}
