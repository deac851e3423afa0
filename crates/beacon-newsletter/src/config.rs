//! Environment-driven settings.

use std::time::Duration;

use tracing::warn;

use crate::transport::DEFAULT_MEDIA_HOST;
use crate::updates::DecryptFailurePolicy;

/// Delay before the auto-follow task runs, when not configured.
pub const DEFAULT_AUTO_FOLLOW_DELAY: Duration = Duration::from_secs(90);

/// Runtime settings for the newsletter layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsletterConfig {
    /// Newsletters followed once shortly after startup.
    pub auto_follow: Vec<String>,
    pub auto_follow_delay: Duration,
    pub decrypt_policy: DecryptFailurePolicy,
    pub media_host: String,
}

impl Default for NewsletterConfig {
    fn default() -> Self {
        Self {
            auto_follow: Vec::new(),
            auto_follow_delay: DEFAULT_AUTO_FOLLOW_DELAY,
            decrypt_policy: DecryptFailurePolicy::default(),
            media_host: DEFAULT_MEDIA_HOST.into(),
        }
    }
}

impl NewsletterConfig {
    /// Read `BEACON_*` variables from the process environment.
    /// Unset or invalid values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(list) = lookup("BEACON_AUTO_FOLLOW") {
            config.auto_follow = list
                .split(',')
                .map(str::trim)
                .filter(|jid| !jid.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(raw) = lookup("BEACON_AUTO_FOLLOW_DELAY_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.auto_follow_delay = Duration::from_secs(secs),
                Err(e) => warn!("Ignoring BEACON_AUTO_FOLLOW_DELAY_SECS '{}': {}", raw, e),
            }
        }

        if let Some(raw) = lookup("BEACON_DECRYPT_POLICY") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "abort" => config.decrypt_policy = DecryptFailurePolicy::AbortBatch,
                "partial" => config.decrypt_policy = DecryptFailurePolicy::Partial,
                _ => warn!("Ignoring BEACON_DECRYPT_POLICY '{}': expected abort or partial", raw),
            }
        }

        if let Some(host) = lookup("BEACON_MEDIA_HOST").filter(|h| !h.trim().is_empty()) {
            config.media_host = host.trim().to_string();
        }

        config
    }
}
