//! Mastodon platform implementation
//!
//! Uses the megalodon library, so any Fediverse instance that speaks the
//! Mastodon API (Pleroma, GoToSocial, Akkoma, ...) works as a destination.

use std::io::Write;

use async_trait::async_trait;
use megalodon::megalodon::PostStatusInputOptions;
use megalodon::{entities, Megalodon, SNS};

use crate::config::MastodonConfig;
use crate::error::{PlatformError, Result};
use crate::platforms::Platform;
use crate::types::{MediaHandle, RenderedArtifact};

/// Mastodon destination client
pub struct MastodonClient {
    client: Box<dyn Megalodon + Send + Sync>,
    #[allow(dead_code)]
    instance_url: String,
    /// Character limit for captions (instance-specific)
    character_limit: usize,
}

impl std::fmt::Debug for MastodonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MastodonClient")
            .field("instance_url", &self.instance_url)
            .field("character_limit", &self.character_limit)
            .finish_non_exhaustive()
    }
}

impl MastodonClient {
    /// Create a client for `instance_url` authenticated by `access_token`.
    ///
    /// The character limit starts at the Mastodon default (500) and is
    /// replaced with the instance's own limit during `authenticate`.
    pub fn new(instance_url: String, access_token: String) -> Result<Self> {
        let client = megalodon::generator(
            SNS::Mastodon,
            instance_url.clone(),
            Some(access_token),
            None,
        )
        .map_err(|e| {
            PlatformError::Authentication(format!("Failed to create Mastodon client: {:?}", e))
        })?;

        Ok(Self {
            client,
            instance_url,
            character_limit: 500,
        })
    }

    /// Build a client from configuration, reading the access token from the
    /// configured token file.
    pub fn from_config(config: &MastodonConfig) -> Result<Self> {
        let token_path = config.expand_token_file_path()?;

        let token = std::fs::read_to_string(&token_path)
            .map_err(|e| {
                PlatformError::Authentication(format!(
                    "Failed to read Mastodon token file {}: {}",
                    token_path.display(),
                    e
                ))
            })?
            .trim()
            .to_string();

        if token.is_empty() {
            return Err(
                PlatformError::Authentication("Mastodon token file is empty".to_string()).into(),
            );
        }

        Self::new(normalize_instance_url(&config.instance), token)
    }

    /// Query instance metadata for the caption character limit.
    pub async fn fetch_instance_info(&mut self) -> Result<()> {
        let response = self
            .client
            .get_instance()
            .await
            .map_err(|e| map_megalodon_error(e, "fetch instance info"))?;

        let limit = response.json.configuration.statuses.max_characters;
        self.character_limit = limit as usize;

        Ok(())
    }
}

#[async_trait]
impl Platform for MastodonClient {
    async fn authenticate(&mut self) -> Result<()> {
        self.client
            .verify_account_credentials()
            .await
            .map_err(|e| map_megalodon_error(e, "authenticate"))?;

        // Non-default instances commonly raise the 500-character default;
        // pick up whatever this one allows.
        self.fetch_instance_info().await
    }

    async fn upload_media(&self, artifact: &RenderedArtifact) -> Result<MediaHandle> {
        // megalodon uploads from a path, so stage the artifact in a temp file
        // carrying the right extension.
        let mut staged = tempfile::Builder::new()
            .suffix(&format!(".{}", artifact.media_type.extension()))
            .tempfile()
            .map_err(|e| {
                PlatformError::Upload(format!("Failed to stage media for upload: {}", e))
            })?;
        staged.write_all(&artifact.bytes).map_err(|e| {
            PlatformError::Upload(format!("Failed to stage media for upload: {}", e))
        })?;
        staged.flush().map_err(|e| {
            PlatformError::Upload(format!("Failed to stage media for upload: {}", e))
        })?;

        let path = staged.path().to_string_lossy().to_string();
        let response = self
            .client
            .upload_media(path, None)
            .await
            .map_err(|e| map_megalodon_error(e, "upload media"))?;

        let media_id = match response.json {
            entities::UploadMedia::Attachment(attachment) => attachment.id,
            entities::UploadMedia::AsyncAttachment(attachment) => attachment.id,
        };

        Ok(MediaHandle::new(media_id))
    }

    async fn create_post(&self, caption: &str, media: &[MediaHandle]) -> Result<String> {
        self.validate_caption(caption)?;

        let options = PostStatusInputOptions {
            media_ids: Some(media.iter().map(|m| m.id.clone()).collect()),
            ..Default::default()
        };

        let response = self
            .client
            .post_status(caption.to_string(), Some(&options))
            .await
            .map_err(|e| map_megalodon_error(e, "post status"))?;

        let post_id = match response.json {
            megalodon::megalodon::PostStatusOutput::Status(status) => status.id,
            megalodon::megalodon::PostStatusOutput::ScheduledStatus(scheduled) => scheduled.id,
        };

        Ok(post_id)
    }

    fn name(&self) -> &str {
        "mastodon"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(self.character_limit)
    }

    fn is_configured(&self) -> bool {
        // Client construction already required an instance URL and token.
        true
    }
}

fn normalize_instance_url(instance: &str) -> String {
    if instance.starts_with("http://") || instance.starts_with("https://") {
        instance.to_string()
    } else {
        format!("https://{}", instance)
    }
}

/// Map megalodon errors to PlatformError by HTTP status where one is present
/// in the message, falling back to keyword classification.
fn map_megalodon_error(error: megalodon::error::Error, context: &str) -> PlatformError {
    let error_str = error.to_string();
    let error_lower = error_str.to_lowercase();

    match extract_http_status(&error_str) {
        Some(401) | Some(403) => PlatformError::Authentication(format!(
            "Mastodon authentication failed ({}): {}",
            context, error_str
        )),
        Some(413) | Some(422) => PlatformError::Validation(format!(
            "Mastodon rejected the request ({}): {}",
            context, error_str
        )),
        Some(429) => PlatformError::RateLimit(format!(
            "Mastodon rate limit exceeded ({}): {}",
            context, error_str
        )),
        Some(500..=599) => PlatformError::Network(format!(
            "Mastodon server error ({}): {}",
            context, error_str
        )),
        Some(_) => {
            PlatformError::Network(format!("Mastodon HTTP error ({}): {}", context, error_str))
        }
        None => {
            if error_lower.contains("unauthorized")
                || error_lower.contains("forbidden")
                || error_lower.contains("token")
            {
                PlatformError::Authentication(format!(
                    "Mastodon authentication failed ({}): {}",
                    context, error_str
                ))
            } else if error_lower.contains("rate limit")
                || error_lower.contains("too many requests")
            {
                PlatformError::RateLimit(format!(
                    "Mastodon rate limit exceeded ({}): {}",
                    context, error_str
                ))
            } else if error_lower.contains("validation") || error_lower.contains("unprocessable") {
                PlatformError::Validation(format!(
                    "Mastodon validation failed ({}): {}",
                    context, error_str
                ))
            } else if context == "upload media" {
                PlatformError::Upload(format!("Mastodon upload failed: {}", error_str))
            } else {
                PlatformError::Network(format!("Mastodon error ({}): {}", context, error_str))
            }
        }
    }
}

/// Extract an HTTP status code from an error message, if one is present.
fn extract_http_status(error_str: &str) -> Option<u16> {
    let prefixes = ["HTTP ", "status ", "code: ", "status_code: "];

    for prefix in &prefixes {
        if let Some(pos) = error_str.find(prefix) {
            let after_prefix = &error_str[pos + prefix.len()..];
            if let Some(code_str) = after_prefix.get(0..3) {
                if let Ok(code) = code_str.parse::<u16>() {
                    if (100..=599).contains(&code) {
                        return Some(code);
                    }
                }
            }
        }
    }

    None
}
