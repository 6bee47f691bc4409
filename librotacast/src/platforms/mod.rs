//! Destination platform abstraction and implementations
//!
//! Each destination exposes the same two-step capability contract: upload the
//! rendered media, then create a post referencing it. Implementations own
//! their authentication and wire protocol entirely; the rest of the system
//! only ever sees success or failure plus an error-detail string.

use async_trait::async_trait;

use crate::error::{PlatformError, Result};
use crate::types::{MediaHandle, RenderedArtifact};

pub mod bluesky;
pub mod mastodon;

// Mock platform is available for all builds (not just tests) to support
// integration tests
pub mod mock;

/// Capability contract every destination platform must satisfy.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Establish a session / verify credentials. Called once before the
    /// fan-out; an adapter that fails here is dropped from the run with a
    /// reported outcome rather than aborting its siblings.
    async fn authenticate(&mut self) -> Result<()>;

    /// Upload the rendered artifact to the platform's media storage.
    ///
    /// # Errors
    ///
    /// `PlatformError::Upload` when the platform rejects the media,
    /// `PlatformError::Network` on transport failures.
    async fn upload_media(&self, artifact: &RenderedArtifact) -> Result<MediaHandle>;

    /// Create a post with the caption and previously uploaded media.
    ///
    /// Returns the platform-specific post id (e.g., a status id for
    /// Mastodon, an AT URI for Bluesky).
    async fn create_post(&self, caption: &str, media: &[MediaHandle]) -> Result<String>;

    /// Check the caption against platform-specific rules before posting.
    fn validate_caption(&self, caption: &str) -> Result<()> {
        if caption.trim().is_empty() {
            return Err(PlatformError::Validation("Caption cannot be empty".to_string()).into());
        }
        if let Some(limit) = self.character_limit() {
            let count = caption.chars().count();
            if count > limit {
                return Err(PlatformError::Validation(format!(
                    "Caption exceeds {}'s {} character limit (current: {} characters)",
                    self.name(),
                    limit,
                    count
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Lowercase platform identifier (e.g., "mastodon", "bluesky")
    fn name(&self) -> &str;

    /// Maximum caption length, or `None` when the platform has no hard limit
    fn character_limit(&self) -> Option<usize>;

    /// Whether the adapter has everything it needs to authenticate
    fn is_configured(&self) -> bool;
}
