//! Core types for Rotacast

use serde::{Deserialize, Serialize};

/// Supported media types for rendered artifacts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MediaType {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl MediaType {
    /// Parse from a MIME string (e.g., "image/jpeg")
    pub fn from_mime_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Get the MIME type string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }

    /// Get the typical file extension for this media type
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The rendered image payload produced once per run.
///
/// Read-only after construction. Every destination adapter consumes the same
/// byte slice, so the payload is re-readable per adapter by construction.
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
}

impl RenderedArtifact {
    pub fn new(bytes: Vec<u8>, media_type: MediaType) -> Self {
        Self { bytes, media_type }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Platform-specific reference to uploaded media.
///
/// - For Mastodon: the media attachment id.
/// - For Bluesky: a serialized blob reference plus the CDN URL when known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaHandle {
    pub id: String,
    pub url: Option<String>,
}

impl MediaHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: None,
        }
    }

    pub fn with_url(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: Some(url.into()),
        }
    }
}

/// Result of publishing to a single destination platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishOutcome {
    /// Platform name (e.g., "mastodon", "bluesky")
    pub platform: String,
    /// Whether the post was created
    pub success: bool,
    /// Platform-specific post ID (if successful)
    pub post_id: Option<String>,
    /// Error message (if failed)
    pub error: Option<String>,
}

impl PublishOutcome {
    pub fn succeeded(platform: impl Into<String>, post_id: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            success: true,
            post_id: Some(post_id.into()),
            error: None,
        }
    }

    pub fn failed(platform: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            success: false,
            post_id: None,
            error: Some(error.into()),
        }
    }
}

/// Run-level report surfaced to the operator. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Catalog index of the selected item
    pub selected: usize,
    /// Caption that was (or would be) published
    pub caption: String,
    /// Source asset locator of the selected item
    pub image_url: String,
    /// Whether this was a dry run (rendered locally, nothing published)
    pub dry_run: bool,
    /// Identifiers still pending in the current cycle after this run
    pub remaining: usize,
    /// Per-destination outcomes (empty in dry-run mode)
    pub outcomes: Vec<PublishOutcome>,
    /// When the run finished (Unix timestamp)
    pub finished_at: i64,
}

impl RunReport {
    /// Destinations that rejected the post. A report with failed destinations
    /// is still a successful run: selection, rendering and persistence all
    /// completed, and re-delivery is the next invocation's concern.
    pub fn failed_destinations(&self) -> impl Iterator<Item = &PublishOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_mime_str() {
        assert_eq!(MediaType::from_mime_str("image/jpeg"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_mime_str("image/jpg"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_mime_str("IMAGE/PNG"), Some(MediaType::Png));
        assert_eq!(MediaType::from_mime_str("image/webp"), Some(MediaType::WebP));
        assert_eq!(MediaType::from_mime_str("text/plain"), None);
    }

    #[test]
    fn test_media_type_as_str_and_extension() {
        assert_eq!(MediaType::Jpeg.as_str(), "image/jpeg");
        assert_eq!(MediaType::Jpeg.extension(), "jpg");
        assert_eq!(MediaType::Gif.extension(), "gif");
        assert_eq!(format!("{}", MediaType::Png), "image/png");
    }

    #[test]
    fn test_artifact_accessors() {
        let artifact = RenderedArtifact::new(vec![0xFF, 0xD8, 0xFF], MediaType::Jpeg);
        assert_eq!(artifact.len(), 3);
        assert!(!artifact.is_empty());
    }

    #[test]
    fn test_media_handle_constructors() {
        let handle = MediaHandle::new("12345");
        assert_eq!(handle.id, "12345");
        assert_eq!(handle.url, None);

        let handle = MediaHandle::with_url("abc", "https://cdn.example/abc.jpg");
        assert_eq!(handle.url.as_deref(), Some("https://cdn.example/abc.jpg"));
    }

    #[test]
    fn test_publish_outcome_constructors() {
        let ok = PublishOutcome::succeeded("mastodon", "109");
        assert!(ok.success);
        assert_eq!(ok.post_id.as_deref(), Some("109"));
        assert_eq!(ok.error, None);

        let bad = PublishOutcome::failed("bluesky", "upload rejected");
        assert!(!bad.success);
        assert_eq!(bad.post_id, None);
        assert_eq!(bad.error.as_deref(), Some("upload rejected"));
    }

    #[test]
    fn test_publish_outcome_serialization() {
        let outcome = PublishOutcome::failed("mastodon", "HTTP 500");
        let json = serde_json::to_string(&outcome).unwrap();
        let back: PublishOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back.platform, outcome.platform);
        assert_eq!(back.success, outcome.success);
        assert_eq!(back.error, outcome.error);
    }

    #[test]
    fn test_run_report_failed_destinations() {
        let report = RunReport {
            selected: 2,
            caption: "old bridge, 1934".to_string(),
            image_url: "https://example.org/2.tif".to_string(),
            dry_run: false,
            remaining: 4,
            outcomes: vec![
                PublishOutcome::succeeded("mastodon", "1"),
                PublishOutcome::failed("bluesky", "timeout"),
            ],
            finished_at: 1_700_000_000,
        };

        let failed: Vec<_> = report.failed_destinations().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].platform, "bluesky");
    }
}
