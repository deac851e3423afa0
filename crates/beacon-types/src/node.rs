use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Node attributes, kept ordered so captures and test fixtures compare stably.
pub type Attrs = BTreeMap<String, String>;

/// One node of the binary message tree exchanged with the transport.
///
/// The transport owns the binary encoding; this is the decoded shape the
/// newsletter layer builds requests from and walks responses with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryNode {
    pub tag: String,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default, skip_serializing_if = "NodeContent::is_empty")]
    pub content: NodeContent,
}

/// Payload of a node: nothing, nested nodes, or raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeContent {
    #[default]
    Empty,
    Children(Vec<BinaryNode>),
    /// Raw bytes, base64 in the serde representation.
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
}

impl NodeContent {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Children(children) => children.is_empty(),
            Self::Bytes(bytes) => bytes.is_empty(),
        }
    }
}

impl BinaryNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Attrs::new(),
            content: NodeContent::Empty,
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<BinaryNode>) -> Self {
        self.content = NodeContent::Children(children);
        self
    }

    pub fn with_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.content = NodeContent::Bytes(bytes.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Every child node in document order. Byte or empty content yields none.
    pub fn all_children(&self) -> &[BinaryNode] {
        match &self.content {
            NodeContent::Children(children) => children,
            _ => &[],
        }
    }

    /// First child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&BinaryNode> {
        self.all_children().iter().find(|c| c.tag == tag)
    }

    /// All children with the given tag, in document order.
    pub fn children<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a BinaryNode> + 'a {
        self.all_children().iter().filter(move |c| c.tag == tag)
    }

    /// Byte content, if this node carries any.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.content {
            NodeContent::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}
