//! Newsletter commands built on the query executor and fetch parsers.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use beacon_types::api::QueryRequest;
use beacon_types::models::{MetadataRecord, UpdateRecord};
use beacon_types::{Attrs, BinaryNode};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::codec::{IqType, QueryKind, S_WHATSAPP_NET, build_newsletter_iq};
use crate::config::NewsletterConfig;
use crate::error::{NewsletterError, Result};
use crate::executor::{check_errors, execute, send_query};
use crate::ids::{query_id, result_key};
use crate::metadata::{MetadataSource, project};
use crate::transport::{
    Identity, MediaHostResolver, MessageDecryptor, PictureEncoder, Transport, UrlResolver,
};
use crate::updates::{DecryptFailurePolicy, FetchMode, parse_updates};

/// `after` cursor sent when the caller gives none.
const DEFAULT_AFTER: &str = "100";

/// `since` cursor sent when the caller gives none.
const DEFAULT_SINCE: &str = "0";

/// Terms-of-service notice accepted before creating a newsletter.
const CREATE_TOS_NOTICE: &str = "20601218";

/// A numeric parameter as it travels on the wire: always a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireNumber(String);

impl WireNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! wire_number_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for WireNumber {
            fn from(n: $ty) -> Self {
                Self(n.to_string())
            }
        })*
    };
}

wire_number_from_int!(u8, u16, u32, u64, usize, i32, i64);

impl From<&str> for WireNumber {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

impl From<String> for WireNumber {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

/// How a newsletter is addressed in a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLookup {
    /// By invite code.
    Invite(String),
    /// By newsletter jid.
    Jid(String),
}

impl MessageLookup {
    fn kind(&self) -> &'static str {
        match self {
            Self::Invite(_) => "invite",
            Self::Jid(_) => "jid",
        }
    }

    fn key(&self) -> &str {
        match self {
            Self::Invite(key) | Self::Jid(key) => key,
        }
    }
}

/// Role the metadata is fetched as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewRole {
    #[default]
    Guest,
    Subscriber,
    Admin,
    Owner,
}

impl ViewRole {
    fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "GUEST",
            Self::Subscriber => "SUBSCRIBER",
            Self::Admin => "ADMIN",
            Self::Owner => "OWNER",
        }
    }
}

/// Newsletter commands over a transport and a message decryptor.
pub struct NewsletterClient<T, D> {
    transport: T,
    decryptor: D,
    identity: Identity,
    urls: Arc<dyn UrlResolver>,
    pictures: Option<Arc<dyn PictureEncoder>>,
    decrypt_policy: DecryptFailurePolicy,
}

impl<T: Transport, D: MessageDecryptor> NewsletterClient<T, D> {
    pub fn new(transport: T, decryptor: D, identity: Identity) -> Self {
        Self {
            transport,
            decryptor,
            identity,
            urls: Arc::new(MediaHostResolver::default()),
            pictures: None,
            decrypt_policy: DecryptFailurePolicy::default(),
        }
    }

    /// Client with the media host and decrypt policy taken from `config`.
    pub fn from_config(transport: T, decryptor: D, identity: Identity, config: &NewsletterConfig) -> Self {
        Self::new(transport, decryptor, identity)
            .with_url_resolver(MediaHostResolver::new(config.media_host.as_str()))
            .with_decrypt_policy(config.decrypt_policy)
    }

    pub fn with_url_resolver(mut self, urls: impl UrlResolver + 'static) -> Self {
        self.urls = Arc::new(urls);
        self
    }

    pub fn with_picture_encoder(mut self, encoder: impl PictureEncoder + 'static) -> Self {
        self.pictures = Some(Arc::new(encoder));
        self
    }

    pub fn with_decrypt_policy(mut self, policy: DecryptFailurePolicy) -> Self {
        self.decrypt_policy = policy;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Every newsletter the account is subscribed to, as the server returns it.
    pub async fn fetch_all_subscribed(&self) -> Result<Value> {
        execute(
            &self.transport,
            &QueryKind::Generic,
            &QueryRequest::new(query_id::SUBSCRIBED, Map::new()),
            Some(result_key::SUBSCRIBED),
        )
        .await
    }

    /// Ask for live view/reaction updates. Returns the granted subscription
    /// attributes, e.g. its `duration`.
    pub async fn subscribe_live_updates(&self, jid: &str) -> Result<Option<Attrs>> {
        let response = self
            .newsletter_iq(jid, IqType::Set, vec![BinaryNode::new("live_updates")])
            .await?;
        Ok(response.child("live_updates").map(|node| node.attrs.clone()))
    }

    pub async fn follow(&self, jid: &str) -> Result<()> {
        self.mutate(jid, query_id::FOLLOW, Map::new()).await
    }

    pub async fn unfollow(&self, jid: &str) -> Result<()> {
        self.mutate(jid, query_id::UNFOLLOW, Map::new()).await
    }

    pub async fn mute(&self, jid: &str) -> Result<()> {
        self.mutate(jid, query_id::MUTE, Map::new()).await
    }

    pub async fn unmute(&self, jid: &str) -> Result<()> {
        self.mutate(jid, query_id::UNMUTE, Map::new()).await
    }

    pub async fn update_name(&self, jid: &str, name: &str) -> Result<()> {
        self.update_field(jid, "name", Value::from(name)).await
    }

    pub async fn update_description(&self, jid: &str, description: &str) -> Result<()> {
        self.update_field(jid, "description", Value::from(description)).await
    }

    /// Encode `raw` with the configured picture encoder and upload it.
    pub async fn update_picture(&self, jid: &str, raw: &[u8]) -> Result<()> {
        let encoder = self
            .pictures
            .as_ref()
            .ok_or_else(|| NewsletterError::Picture("no picture encoder configured".into()))?;
        let image = encoder.encode(raw).map_err(NewsletterError::Picture)?;

        self.update_field(jid, "picture", Value::from(BASE64.encode(image))).await
    }

    pub async fn remove_picture(&self, jid: &str) -> Result<()> {
        self.update_field(jid, "picture", Value::from("")).await
    }

    /// Fetch message history, decrypting every message.
    pub async fn fetch_messages(
        &self,
        lookup: &MessageLookup,
        count: impl Into<WireNumber>,
        after: Option<WireNumber>,
    ) -> Result<Vec<UpdateRecord>> {
        let count: WireNumber = count.into();
        let key_attr = match lookup {
            MessageLookup::Invite(_) => "key",
            MessageLookup::Jid(_) => "jid",
        };
        let request = BinaryNode::new("messages")
            .with_attr("type", lookup.kind())
            .with_attr(key_attr, lookup.key())
            .with_attr("count", count.0)
            .with_attr("after", cursor(after, DEFAULT_AFTER));

        let response = self.newsletter_iq(S_WHATSAPP_NET, IqType::Get, vec![request]).await?;
        parse_updates(
            &response,
            FetchMode::Initial,
            &self.decryptor,
            &self.identity,
            self.decrypt_policy,
        )
        .await
    }

    /// Fetch view and reaction changes since a point in time.
    pub async fn fetch_updates(
        &self,
        jid: &str,
        count: impl Into<WireNumber>,
        after: Option<WireNumber>,
        since: Option<WireNumber>,
    ) -> Result<Vec<UpdateRecord>> {
        let count: WireNumber = count.into();
        let request = BinaryNode::new("message_updates")
            .with_attr("count", count.0)
            .with_attr("after", cursor(after, DEFAULT_AFTER))
            .with_attr("since", cursor(since, DEFAULT_SINCE));

        let response = self.newsletter_iq(jid, IqType::Get, vec![request]).await?;
        parse_updates(
            &response,
            FetchMode::Incremental,
            &self.decryptor,
            &self.identity,
            self.decrypt_policy,
        )
        .await
    }

    pub async fn metadata(&self, lookup: &MessageLookup, role: ViewRole) -> Result<MetadataRecord> {
        let variables = json!({
            "input": {
                "key": lookup.key(),
                "type": lookup.kind().to_ascii_uppercase(),
                "view_role": role.as_str(),
            },
            "fetch_viewer_metadata": true,
            "fetch_full_image": true,
            "fetch_creation_time": true,
        });

        let response = send_query(
            &self.transport,
            &QueryKind::Newsletter { jid: None },
            &QueryRequest::new(query_id::METADATA, into_map(variables)),
        )
        .await?;
        check_errors(&response)?;
        project(&response, MetadataSource::Fetch, self.urls.as_ref())
    }

    pub async fn create(&self, name: &str, description: Option<&str>) -> Result<MetadataRecord> {
        let notice = BinaryNode::new("iq")
            .with_attr("id", self.transport.generate_message_tag())
            .with_attr("type", IqType::Set.as_str())
            .with_attr("to", S_WHATSAPP_NET)
            .with_attr("xmlns", "tos")
            .with_children(vec![
                BinaryNode::new("notice")
                    .with_attr("id", CREATE_TOS_NOTICE)
                    .with_attr("stage", "5"),
            ]);
        self.transport.query(notice).await?;

        let variables = json!({
            "input": { "name": name, "description": description, "settings": null }
        });
        let response = send_query(
            &self.transport,
            &QueryKind::Newsletter { jid: None },
            &QueryRequest::new(query_id::CREATE, into_map(variables)),
        )
        .await?;
        check_errors(&response)?;

        let record = project(&response, MetadataSource::Create, self.urls.as_ref())?;
        info!(id = %record.id, "created newsletter");
        Ok(record)
    }

    async fn newsletter_iq(&self, to: &str, iq_type: IqType, content: Vec<BinaryNode>) -> Result<BinaryNode> {
        let node = build_newsletter_iq(self.transport.generate_message_tag(), to, iq_type, content);
        Ok(self.transport.query(node).await?)
    }

    /// Fire a newsletter-scoped query; only transport failures surface.
    async fn mutate(&self, jid: &str, query_id: &str, variables: Map<String, Value>) -> Result<()> {
        debug!(jid, query_id, "newsletter mutation");
        send_query(
            &self.transport,
            &QueryKind::newsletter(jid),
            &QueryRequest::new(query_id, variables),
        )
        .await?;
        Ok(())
    }

    async fn update_field(&self, jid: &str, field: &str, value: Value) -> Result<()> {
        let mut updates = Map::new();
        updates.insert(field.into(), value);
        updates.insert("settings".into(), Value::Null);

        let mut variables = Map::new();
        variables.insert("updates".into(), Value::Object(updates));
        self.mutate(jid, query_id::JOB_MUTATION, variables).await
    }
}

fn cursor(value: Option<WireNumber>, default: &str) -> String {
    value.map_or_else(|| default.to_string(), |n| n.0)
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
