//! Fan-out publishing
//!
//! Delivers one rendered artifact to every configured destination platform.
//! Each destination gets exactly one attempt per run (validate caption,
//! upload media, create post) under its own timeout; a failure anywhere in
//! one destination's attempt becomes a failed outcome for that destination
//! alone and never aborts a sibling. Retries belong to the next scheduled
//! invocation, not this one.

use std::time::Duration;

use futures::future::join_all;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::platforms::{bluesky::BlueskyClient, mastodon::MastodonClient, Platform};
use crate::types::{PublishOutcome, RenderedArtifact};

pub struct FanoutPublisher {
    platforms: Vec<Box<dyn Platform>>,
    /// Per-destination budget covering upload and post together
    timeout: Duration,
}

impl FanoutPublisher {
    pub fn new(platforms: Vec<Box<dyn Platform>>, timeout: Duration) -> Self {
        Self { platforms, timeout }
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    pub fn platform_names(&self) -> Vec<String> {
        self.platforms.iter().map(|p| p.name().to_string()).collect()
    }

    /// Attempt delivery to every destination concurrently and report one
    /// outcome per destination, in configuration order.
    pub async fn publish(
        &self,
        artifact: &RenderedArtifact,
        caption: &str,
    ) -> Vec<PublishOutcome> {
        let attempts = self.platforms.iter().map(|platform| {
            let platform_name = platform.name().to_string();
            async move {
                info!("Publishing to {}", platform_name);

                let attempt = publish_one(platform.as_ref(), artifact, caption);
                match tokio::time::timeout(self.timeout, attempt).await {
                    Ok(Ok(post_id)) => {
                        info!("Published to {}: {}", platform_name, post_id);
                        PublishOutcome::succeeded(platform_name, post_id)
                    }
                    Ok(Err(e)) => {
                        warn!("Failed to publish to {}: {}", platform_name, e);
                        PublishOutcome::failed(platform_name, e.to_string())
                    }
                    Err(_) => {
                        let detail =
                            format!("timed out after {}s", self.timeout.as_secs());
                        warn!("Publishing to {} {}", platform_name, detail);
                        PublishOutcome::failed(platform_name, detail)
                    }
                }
            }
        });

        join_all(attempts).await
    }
}

/// One destination's full attempt: caption validation, media upload, post.
async fn publish_one(
    platform: &dyn Platform,
    artifact: &RenderedArtifact,
    caption: &str,
) -> Result<String> {
    platform.validate_caption(caption)?;
    let handle = platform.upload_media(artifact).await?;
    platform.create_post(caption, &[handle]).await
}

/// Build and authenticate destination adapters from configuration.
///
/// A destination that cannot be built or authenticated is reported as a
/// failed outcome and dropped; its siblings still run. Credentials problems
/// on one platform therefore never block the others, mirroring the fan-out's
/// own isolation.
pub async fn create_platforms(
    config: &Config,
) -> (Vec<Box<dyn Platform>>, Vec<PublishOutcome>) {
    let mut platforms: Vec<Box<dyn Platform>> = Vec::new();
    let mut failures = Vec::new();

    if let Some(mastodon_config) = &config.mastodon {
        if mastodon_config.enabled {
            info!("Creating Mastodon platform client");
            match build_mastodon(mastodon_config).await {
                Ok(client) => platforms.push(client),
                Err(e) => {
                    warn!("Skipping Mastodon: {}", e);
                    failures.push(PublishOutcome::failed("mastodon", e.to_string()));
                }
            }
        }
    }

    if let Some(bluesky_config) = &config.bluesky {
        if bluesky_config.enabled {
            info!("Creating Bluesky platform client");
            match build_bluesky(bluesky_config).await {
                Ok(client) => platforms.push(client),
                Err(e) => {
                    warn!("Skipping Bluesky: {}", e);
                    failures.push(PublishOutcome::failed("bluesky", e.to_string()));
                }
            }
        }
    }

    if platforms.is_empty() && failures.is_empty() {
        warn!("No platforms are enabled in configuration");
    } else {
        info!("Created {} platform client(s)", platforms.len());
    }

    (platforms, failures)
}

async fn build_mastodon(
    config: &crate::config::MastodonConfig,
) -> Result<Box<dyn Platform>> {
    let mut client = MastodonClient::from_config(config)?;
    client.authenticate().await?;
    Ok(Box::new(client))
}

async fn build_bluesky(config: &crate::config::BlueskyConfig) -> Result<Box<dyn Platform>> {
    let mut client = BlueskyClient::from_config(config).await?;
    client.authenticate().await?;
    Ok(Box::new(client))
}
