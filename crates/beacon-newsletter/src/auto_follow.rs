//! One-shot follow task run shortly after startup.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::NewsletterClient;
use crate::config::NewsletterConfig;
use crate::transport::{MessageDecryptor, Transport};

/// Best-effort startup task that follows a fixed set of newsletters once,
/// after a delay.
///
/// Targets are followed in order. The first failure ends the run and is
/// dropped; nothing is retried and nothing is reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoFollow {
    targets: Vec<String>,
    delay: Duration,
}

impl AutoFollow {
    pub fn new(targets: Vec<String>, delay: Duration) -> Self {
        Self { targets, delay }
    }

    pub fn from_config(config: &NewsletterConfig) -> Self {
        Self::new(config.auto_follow.clone(), config.auto_follow_delay)
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Run in the background. Cancelling `shutdown` stops the task at any point.
    pub fn spawn<T, D>(
        self,
        client: Arc<NewsletterClient<T, D>>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()>
    where
        T: Transport + 'static,
        D: MessageDecryptor + 'static,
    {
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => debug!("auto-follow cancelled"),
                _ = self.run(&client) => {}
            }
        })
    }

    async fn run<T: Transport, D: MessageDecryptor>(&self, client: &NewsletterClient<T, D>) {
        if self.targets.is_empty() {
            return;
        }

        tokio::time::sleep(self.delay).await;

        for jid in &self.targets {
            if let Err(e) = client.follow(jid).await {
                debug!(jid = %jid, "auto-follow stopped: {}", e);
                return;
            }
        }
        debug!(count = self.targets.len(), "auto-follow finished");
    }
}
