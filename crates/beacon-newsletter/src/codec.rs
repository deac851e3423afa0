//! Outbound `iq` envelopes for structured queries and newsletter commands.
//!
//! ```text
//! <iq id=.. type=get to=s.whatsapp.net xmlns=w:mex>
//!     <query query_id=..>{"variables":{..}}</query>
//! </iq>
//!
//! <iq id=.. type=get|set to=<jid> xmlns=newsletter>
//!     ..children..
//! </iq>
//! ```

use beacon_types::BinaryNode;
use beacon_types::api::QueryRequest;
use serde_json::{Map, Value};

/// Server endpoint every structured query is addressed to.
pub const S_WHATSAPP_NET: &str = "s.whatsapp.net";

/// Namespace of structured queries.
pub const MEX_NAMESPACE: &str = "w:mex";

/// Namespace of newsletter-scoped commands.
pub const NEWSLETTER_NAMESPACE: &str = "newsletter";

/// Variable merged into newsletter-scoped queries.
const NEWSLETTER_ID_FIELD: &str = "newsletter_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IqType {
    Get,
    Set,
}

impl IqType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
        }
    }
}

/// How a structured query's variables are assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    /// Variables are sent exactly as given.
    Generic,
    /// `newsletter_id` is merged in ahead of the given variables.
    /// Without a jid the field is left out entirely.
    Newsletter { jid: Option<String> },
}

impl QueryKind {
    pub fn newsletter(jid: impl Into<String>) -> Self {
        Self::Newsletter {
            jid: Some(jid.into()),
        }
    }

    /// `request` with this kind's variables applied.
    fn resolve(&self, request: &QueryRequest) -> QueryRequest {
        let variables = match self {
            Self::Generic => request.variables.clone(),
            Self::Newsletter { jid } => {
                let mut merged = Map::new();
                if let Some(jid) = jid {
                    merged.insert(NEWSLETTER_ID_FIELD.into(), Value::from(jid.as_str()));
                }
                // caller-supplied keys win, matching object-spread order
                merged.extend(request.variables.clone());
                merged
            }
        };
        QueryRequest::new(request.query_id.as_str(), variables)
    }
}

/// Build a `w:mex` structured query envelope.
pub fn build_mex_query(message_tag: String, kind: &QueryKind, request: &QueryRequest) -> BinaryNode {
    let resolved = kind.resolve(request);

    BinaryNode::new("iq")
        .with_attr("id", message_tag)
        .with_attr("type", IqType::Get.as_str())
        .with_attr("to", S_WHATSAPP_NET)
        .with_attr("xmlns", MEX_NAMESPACE)
        .with_children(vec![
            BinaryNode::new("query")
                .with_attr("query_id", resolved.query_id.as_str())
                .with_bytes(resolved.body().to_string().into_bytes()),
        ])
}

/// Build a `newsletter` namespace envelope addressed to `to`.
pub fn build_newsletter_iq(
    message_tag: String,
    to: &str,
    iq_type: IqType,
    content: Vec<BinaryNode>,
) -> BinaryNode {
    BinaryNode::new("iq")
        .with_attr("id", message_tag)
        .with_attr("type", iq_type.as_str())
        .with_attr("xmlns", NEWSLETTER_NAMESPACE)
        .with_attr("to", to)
        .with_children(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body_of(node: &BinaryNode) -> Value {
        let bytes = node.child("query").and_then(BinaryNode::bytes).unwrap();
        serde_json::from_slice(bytes).unwrap()
    }

    fn vars(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn generic_query_envelope() {
        let req = QueryRequest::new("6388546374527196", Map::new());
        let node = build_mex_query("tag-1".into(), &QueryKind::Generic, &req);

        assert_eq!(node.tag, "iq");
        assert_eq!(node.attr("id"), Some("tag-1"));
        assert_eq!(node.attr("type"), Some("get"));
        assert_eq!(node.attr("to"), Some("s.whatsapp.net"));
        assert_eq!(node.attr("xmlns"), Some("w:mex"));
        assert_eq!(
            node.child("query").and_then(|q| q.attr("query_id")),
            Some("6388546374527196")
        );
        assert_eq!(body_of(&node), json!({ "variables": {} }));
    }

    #[test]
    fn newsletter_query_merges_id() {
        let req = QueryRequest::new("7150902998257522", vars(json!({ "updates": { "name": "N" } })));
        let node = build_mex_query("t".into(), &QueryKind::newsletter("1@newsletter"), &req);

        assert_eq!(
            body_of(&node),
            json!({ "variables": { "newsletter_id": "1@newsletter", "updates": { "name": "N" } } })
        );
    }

    #[test]
    fn newsletter_query_without_jid_omits_id() {
        let req = QueryRequest::new("6996806640408138", vars(json!({ "input": {} })));
        let node = build_mex_query("t".into(), &QueryKind::Newsletter { jid: None }, &req);
        assert_eq!(body_of(&node), json!({ "variables": { "input": {} } }));
    }

    #[test]
    fn explicit_variable_overrides_merged_id() {
        let req = QueryRequest::new("q", vars(json!({ "newsletter_id": "other@newsletter" })));
        let node = build_mex_query("t".into(), &QueryKind::newsletter("1@newsletter"), &req);
        assert_eq!(body_of(&node)["variables"]["newsletter_id"], "other@newsletter");
    }

    #[test]
    fn newsletter_iq_envelope() {
        let node = build_newsletter_iq(
            "t".into(),
            "1@newsletter",
            IqType::Set,
            vec![BinaryNode::new("live_updates")],
        );
        assert_eq!(node.attr("type"), Some("set"));
        assert_eq!(node.attr("xmlns"), Some("newsletter"));
        assert_eq!(node.attr("to"), Some("1@newsletter"));
        assert!(node.child("live_updates").is_some());
    }
}
