//! Projection of newsletter metadata payloads into [`MetadataRecord`].

use beacon_types::BinaryNode;
use beacon_types::models::MetadataRecord;
use serde::Deserialize;
use serde_json::Value;

use crate::coerce::{deserialize_lenient, deserialize_lenient_int};
use crate::error::{NewsletterError, Result};
use crate::transport::UrlResolver;

/// Which query produced the metadata payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSource {
    /// Metadata fetch, payload under `xwa2_newsletter`.
    Fetch,
    /// Newsletter creation, payload under `xwa2_newsletter_create`.
    Create,
}

#[derive(Debug, Default, Deserialize)]
struct MetadataEnvelope {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    data: Option<MetadataData>,
}

#[derive(Debug, Default, Deserialize)]
struct MetadataData {
    #[serde(default, rename = "xwa2_newsletter", deserialize_with = "deserialize_lenient")]
    fetched: Option<NewsletterPayload>,
    #[serde(default, rename = "xwa2_newsletter_create", deserialize_with = "deserialize_lenient")]
    created: Option<NewsletterPayload>,
}

impl MetadataEnvelope {
    fn fetched(&self) -> Option<&NewsletterPayload> {
        self.data.as_ref()?.fetched.as_ref()
    }

    fn created(&self) -> Option<&NewsletterPayload> {
        self.data.as_ref()?.created.as_ref()
    }
}

// Every nested field is read leniently: a value of the wrong type is `None`.

#[derive(Debug, Default, Deserialize)]
struct NewsletterPayload {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    state: Option<StatePayload>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    thread_metadata: Option<ThreadMetadata>,
    #[serde(default)]
    viewer_metadata: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct StatePayload {
    #[serde(default, rename = "type", deserialize_with = "deserialize_lenient")]
    kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ThreadMetadata {
    #[serde(default, deserialize_with = "deserialize_lenient_int")]
    creation_time: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    name: Option<TextField>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    description: Option<TextField>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    invite: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    picture: Option<MediaRef>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    preview: Option<MediaRef>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    settings: Option<Settings>,
    #[serde(default, deserialize_with = "deserialize_lenient_int")]
    subscribers_count: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    verification: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TextField {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    text: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_int")]
    update_time: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct MediaRef {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    direct_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Settings {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    reaction_codes: Option<ReactionCodes>,
}

#[derive(Debug, Default, Deserialize)]
struct ReactionCodes {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    value: Option<String>,
}

/// Project the `result` payload of a metadata or create response.
///
/// Nested fields that are absent or of the wrong type come back as `None`.
/// Only malformed JSON or a newsletter without an `id` is an error.
pub fn project(
    response: &BinaryNode,
    source: MetadataSource,
    urls: &dyn UrlResolver,
) -> Result<MetadataRecord> {
    // an absent result parses as empty input and fails the same way
    let bytes = response
        .child("result")
        .and_then(BinaryNode::bytes)
        .unwrap_or_default();
    let envelope: MetadataEnvelope = serde_json::from_slice(bytes)?;

    let payload = match source {
        MetadataSource::Fetch => envelope.fetched(),
        MetadataSource::Create => envelope.created(),
    };
    let payload = payload.ok_or(NewsletterError::MissingField("id"))?;
    let id = payload.id.clone().ok_or(NewsletterError::MissingField("id"))?;

    let thread = payload.thread_metadata.as_ref();
    let name = thread.and_then(|t| t.name.as_ref());
    let description = thread.and_then(|t| t.description.as_ref());
    let direct_path = |media: Option<&MediaRef>| {
        urls.url_from_direct_path(media.and_then(|m| m.direct_path.as_deref()).unwrap_or_default())
    };

    Ok(MetadataRecord {
        id,
        state: payload.state.as_ref().and_then(|s| s.kind.clone()),
        creation_time: thread.and_then(|t| t.creation_time),
        name: name.and_then(|n| n.text.clone()),
        name_time: name.and_then(|n| n.update_time),
        description: description.and_then(|d| d.text.clone()),
        description_time: description.and_then(|d| d.update_time),
        invite: thread.and_then(|t| t.invite.clone()),
        picture: direct_path(thread.and_then(|t| t.picture.as_ref())),
        preview: direct_path(thread.and_then(|t| t.preview.as_ref())),
        reaction_codes: thread
            .and_then(|t| t.settings.as_ref())
            .and_then(|s| s.reaction_codes.as_ref())
            .and_then(|r| r.value.clone()),
        subscribers: thread.and_then(|t| t.subscribers_count),
        verification: thread.and_then(|t| t.verification.clone()),
        viewer_metadata: payload.viewer_metadata.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::result_node;
    use crate::transport::MediaHostResolver;
    use serde_json::json;

    fn full_payload() -> Value {
        json!({
            "id": "120363000000000000@newsletter",
            "state": { "type": "ACTIVE" },
            "thread_metadata": {
                "creation_time": "1690000000",
                "name": { "text": "X", "update_time": "1000" },
                "description": { "text": "about", "update_time": 2000 },
                "invite": "0029Va",
                "picture": { "direct_path": "/v/pic" },
                "preview": { "direct_path": "/v/prev" },
                "settings": { "reaction_codes": { "value": "ALL" } },
                "subscribers_count": "42",
                "verification": "VERIFIED"
            },
            "viewer_metadata": { "mute": "OFF", "role": "SUBSCRIBER" }
        })
    }

    fn fetch(payload: Value) -> BinaryNode {
        result_node(&json!({ "data": { "xwa2_newsletter": payload } }))
    }

    #[test]
    fn projects_every_field() {
        let record = project(&fetch(full_payload()), MetadataSource::Fetch, &MediaHostResolver::default()).unwrap();

        assert_eq!(record.id, "120363000000000000@newsletter");
        assert_eq!(record.state.as_deref(), Some("ACTIVE"));
        assert_eq!(record.creation_time, Some(1_690_000_000));
        assert_eq!(record.name.as_deref(), Some("X"));
        assert_eq!(record.name_time, Some(1000));
        assert_eq!(record.description.as_deref(), Some("about"));
        assert_eq!(record.description_time, Some(2000));
        assert_eq!(record.invite.as_deref(), Some("0029Va"));
        assert_eq!(record.picture, "https://mmg.whatsapp.net/v/pic");
        assert_eq!(record.preview, "https://mmg.whatsapp.net/v/prev");
        assert_eq!(record.reaction_codes.as_deref(), Some("ALL"));
        assert_eq!(record.subscribers, Some(42));
        assert_eq!(record.verification.as_deref(), Some("VERIFIED"));
        assert_eq!(record.viewer_metadata, Some(json!({ "mute": "OFF", "role": "SUBSCRIBER" })));
    }

    #[test]
    fn missing_nested_fields_are_absent() {
        let payload = json!({
            "id": "1@newsletter",
            "thread_metadata": { "name": { "text": "X", "update_time": "1000" } }
        });
        let record = project(&fetch(payload), MetadataSource::Fetch, &MediaHostResolver::default()).unwrap();

        assert_eq!(record.name.as_deref(), Some("X"));
        assert_eq!(record.name_time, Some(1000));
        assert_eq!(record.description, None);
        assert_eq!(record.description_time, None);
        assert_eq!(record.subscribers, None);
        assert_eq!(record.state, None);
        // empty direct path still goes through the resolver
        assert_eq!(record.picture, "https://mmg.whatsapp.net");
    }

    #[test]
    fn create_source_reads_its_own_key() {
        let response = result_node(&json!({
            "data": { "xwa2_newsletter_create": { "id": "2@newsletter" } }
        }));
        let urls = MediaHostResolver::default();

        let record = project(&response, MetadataSource::Create, &urls).unwrap();
        assert_eq!(record.id, "2@newsletter");

        assert!(matches!(
            project(&response, MetadataSource::Fetch, &urls),
            Err(NewsletterError::MissingField("id"))
        ));
    }

    #[test]
    fn malformed_payload_is_a_parse_error() {
        let response = BinaryNode::new("iq")
            .with_children(vec![BinaryNode::new("result").with_bytes(b"[1,".to_vec())]);
        assert!(matches!(
            project(&response, MetadataSource::Fetch, &MediaHostResolver::default()),
            Err(NewsletterError::Parse(_))
        ));

        let no_result = BinaryNode::new("iq");
        assert!(matches!(
            project(&no_result, MetadataSource::Fetch, &MediaHostResolver::default()),
            Err(NewsletterError::Parse(_))
        ));
    }

    #[test]
    fn projection_is_idempotent() {
        let response = fetch(full_payload());
        let urls = MediaHostResolver::default();
        let first = project(&response, MetadataSource::Fetch, &urls).unwrap();
        let second = project(&response, MetadataSource::Fetch, &urls).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn mismatched_nested_types_project_to_none() {
        let payload = json!({
            "id": "1@newsletter",
            "state": "ACTIVE",
            "thread_metadata": {
                "name": { "text": "X", "update_time": "1000" },
                "description": "plain string",
                "picture": { "direct_path": 17 },
                "settings": { "reaction_codes": { "value": ["ALL"] } },
                "verification": true,
                "invite": 29
            }
        });
        let record = project(&fetch(payload), MetadataSource::Fetch, &MediaHostResolver::default()).unwrap();

        assert_eq!(record.id, "1@newsletter");
        assert_eq!(record.name.as_deref(), Some("X"));
        assert_eq!(record.name_time, Some(1000));
        assert_eq!(record.state, None);
        assert_eq!(record.description, None);
        assert_eq!(record.verification, None);
        assert_eq!(record.invite, None);
        assert_eq!(record.reaction_codes, None);
        assert_eq!(record.picture, "https://mmg.whatsapp.net");
    }

    #[test]
    fn non_object_payload_is_missing_not_malformed() {
        let urls = MediaHostResolver::default();
        for payload in [json!("1@newsletter"), json!({ "id": 1 })] {
            assert!(matches!(
                project(&fetch(payload), MetadataSource::Fetch, &urls),
                Err(NewsletterError::MissingField("id"))
            ));
        }
    }
}
