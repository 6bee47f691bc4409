//! Bluesky platform implementation

use async_trait::async_trait;
use bsky_sdk::api::app::bsky::embed::images::{ImageData, MainData};
use bsky_sdk::api::app::bsky::feed::post::{RecordData, RecordEmbedRefs};
use bsky_sdk::api::types::string::Datetime;
use bsky_sdk::api::types::{BlobRef, Union};
use bsky_sdk::BskyAgent;

use crate::config::BlueskyConfig;
use crate::error::{PlatformError, Result};
use crate::platforms::Platform;
use crate::types::{MediaHandle, RenderedArtifact};

pub struct BlueskyClient {
    agent: BskyAgent,
    handle: String,
    app_password: String,
    authenticated: bool,
}

impl BlueskyClient {
    /// Create a new Bluesky client for `handle` using an app password.
    pub async fn new(handle: String, app_password: String) -> Result<Self> {
        let agent = BskyAgent::builder()
            .build()
            .await
            .map_err(|e| PlatformError::Authentication(format!("Failed to create agent: {}", e)))?;

        Ok(Self {
            agent,
            handle,
            app_password,
            authenticated: false,
        })
    }

    /// Build a client from configuration, reading the app password from the
    /// configured password file.
    pub async fn from_config(config: &BlueskyConfig) -> Result<Self> {
        let password_path = config.expand_password_file_path()?;

        let password = std::fs::read_to_string(&password_path)
            .map_err(|e| {
                PlatformError::Authentication(format!(
                    "Failed to read Bluesky password file {}: {}",
                    password_path.display(),
                    e
                ))
            })?
            .trim()
            .to_string();

        if password.is_empty() {
            return Err(PlatformError::Authentication(
                "Bluesky password file is empty".to_string(),
            )
            .into());
        }

        Self::new(config.handle.clone(), password).await
    }
}

#[async_trait]
impl Platform for BlueskyClient {
    async fn authenticate(&mut self) -> Result<()> {
        tracing::debug!("Creating Bluesky session for handle: {}", self.handle);

        self.agent
            .login(&self.handle, &self.app_password)
            .await
            .map_err(|e| map_bluesky_error(e, "authentication"))?;

        self.authenticated = true;
        tracing::debug!("Bluesky session created");

        Ok(())
    }

    async fn upload_media(&self, artifact: &RenderedArtifact) -> Result<MediaHandle> {
        if !self.authenticated {
            return Err(PlatformError::Authentication("Not authenticated".to_string()).into());
        }

        tracing::debug!("Uploading {} bytes to Bluesky", artifact.len());

        let response = self
            .agent
            .api
            .com
            .atproto
            .repo
            .upload_blob(artifact.bytes.clone())
            .await
            .map_err(|e| map_bluesky_error(e, "upload blob"))?;

        // The blob reference must survive the generic media-handle contract,
        // so it travels serialized and is decoded again in create_post.
        let blob_json = serde_json::to_string(&response.data.blob).map_err(|e| {
            PlatformError::Upload(format!("Failed to serialize blob reference: {}", e))
        })?;

        Ok(MediaHandle::new(blob_json))
    }

    async fn create_post(&self, caption: &str, media: &[MediaHandle]) -> Result<String> {
        if !self.authenticated {
            return Err(PlatformError::Authentication("Not authenticated".to_string()).into());
        }

        self.validate_caption(caption)?;

        let mut images = Vec::with_capacity(media.len());
        for handle in media {
            let blob: BlobRef = serde_json::from_str(&handle.id).map_err(|e| {
                PlatformError::Posting(format!("Invalid blob reference in media handle: {}", e))
            })?;
            images.push(
                ImageData {
                    alt: caption.to_string(),
                    aspect_ratio: None,
                    image: blob,
                }
                .into(),
            );
        }

        let embed = if images.is_empty() {
            None
        } else {
            Some(Union::Refs(RecordEmbedRefs::AppBskyEmbedImagesMain(
                Box::new(MainData { images }.into()),
            )))
        };

        let record = RecordData {
            created_at: Datetime::now(),
            embed,
            entities: None,
            facets: None,
            labels: None,
            langs: None,
            reply: None,
            tags: None,
            text: caption.to_string(),
        };

        let response = self
            .agent
            .create_record(record)
            .await
            .map_err(|e| map_bluesky_error(e, "create record"))?;

        let at_uri = response.uri.to_string();
        tracing::debug!("Posted to Bluesky: {}", at_uri);

        Ok(at_uri)
    }

    fn name(&self) -> &str {
        "bluesky"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(300)
    }

    fn is_configured(&self) -> bool {
        !self.handle.is_empty() && !self.app_password.is_empty()
    }
}

/// Map Bluesky/AT Protocol errors to PlatformError by inspecting the error
/// message for XRPC status codes and AT Protocol error codes.
fn map_bluesky_error<E: std::fmt::Display + std::fmt::Debug>(
    error: E,
    context: &str,
) -> PlatformError {
    let error_msg = format!("{}", error);
    let debug_msg = format!("{:?}", error);

    if error_msg.contains("401")
        || error_msg.contains("403")
        || error_msg.contains("AuthenticationRequired")
        || error_msg.contains("InvalidToken")
        || error_msg.contains("ExpiredToken")
        || debug_msg.contains("Unauthorized")
        || debug_msg.contains("Forbidden")
    {
        return PlatformError::Authentication(format!(
            "Bluesky authentication failed during {}: {}",
            context, error_msg
        ));
    }

    if error_msg.contains("InvalidCredentials")
        || error_msg.contains("AccountNotFound")
        || (context == "authentication" && error_msg.contains("invalid"))
    {
        return PlatformError::Authentication(format!(
            "Invalid Bluesky credentials: {}. Check your handle and app password.",
            error_msg
        ));
    }

    if error_msg.contains("400")
        || error_msg.contains("InvalidRequest")
        || error_msg.contains("InvalidRecord")
        || error_msg.contains("BlobTooLarge")
        || debug_msg.contains("BadRequest")
    {
        return PlatformError::Validation(format!(
            "Bluesky rejected the request during {}: {}",
            context, error_msg
        ));
    }

    if error_msg.contains("429")
        || error_msg.contains("RateLimitExceeded")
        || debug_msg.contains("RateLimit")
    {
        return PlatformError::RateLimit(format!(
            "Bluesky rate limit exceeded during {}: {}",
            context, error_msg
        ));
    }

    if error_msg.contains("connection")
        || error_msg.contains("network")
        || error_msg.contains("timeout")
        || error_msg.contains("unreachable")
        || debug_msg.contains("Connect")
        || debug_msg.contains("Timeout")
    {
        return PlatformError::Network(format!(
            "Network error while talking to Bluesky during {}: {}",
            context, error_msg
        ));
    }

    if context == "upload blob" {
        return PlatformError::Upload(format!("Bluesky upload failed: {}", error_msg));
    }

    PlatformError::Posting(format!(
        "Bluesky operation failed during {}: {}",
        context, error_msg
    ))
}
