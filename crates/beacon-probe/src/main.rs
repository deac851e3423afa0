//! Offline decoder for captured newsletter responses.
//!
//! ```text
//! beacon-probe messages  capture.json     # initial fetch, plaintext delivery
//! beacon-probe updates   capture.json     # incremental fetch
//! beacon-probe metadata  capture.json     # xwa2_newsletter payload
//! beacon-probe created   capture.json     # xwa2_newsletter_create payload
//! beacon-probe result    capture.json [key]
//! ```
//!
//! A capture is the serde JSON form of the response `BinaryNode`.

use anyhow::{Context, bail};
use serde_json::Value;
use tracing::info;

use beacon_newsletter::{
    FetchMode, Identity, MediaHostResolver, MetadataSource, NewsletterConfig, PlaintextDecryptor,
    parse_updates, project, unwrap_result,
};
use beacon_types::BinaryNode;

const USAGE: &str = "usage: beacon-probe <messages|updates|metadata|created|result> <capture.json> [result-key]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging on stderr, stdout carries the decoded output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beacon=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(mode), Some(path)) = (args.next(), args.next()) else {
        bail!(USAGE);
    };
    let result_key = args.next();

    // Config
    let config = NewsletterConfig::from_env();
    let identity = Identity {
        id: std::env::var("BEACON_SELF_JID").unwrap_or_default(),
        lid: std::env::var("BEACON_SELF_LID").ok(),
    };
    let urls = MediaHostResolver::new(config.media_host.as_str());

    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let response: BinaryNode =
        serde_json::from_str(&raw).with_context(|| format!("{path} is not a captured node"))?;
    info!("Loaded {} capture from {}", response.tag, path);

    let output: Value = match mode.as_str() {
        "messages" | "updates" => {
            let fetch = if mode == "messages" {
                FetchMode::Initial
            } else {
                FetchMode::Incremental
            };
            let records = parse_updates(
                &response,
                fetch,
                &PlaintextDecryptor,
                &identity,
                config.decrypt_policy,
            )
            .await?;
            serde_json::to_value(records)?
        }
        "metadata" => serde_json::to_value(project(&response, MetadataSource::Fetch, &urls)?)?,
        "created" => serde_json::to_value(project(&response, MetadataSource::Create, &urls)?)?,
        "result" => unwrap_result(&response, result_key.as_deref())?,
        other => bail!("unknown mode '{other}'\n{USAGE}"),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
