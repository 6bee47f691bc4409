//! Image rendering
//!
//! Turns a source-asset locator into the publishable artifact: fetch the
//! asset over HTTP, stretch its contrast, resize it to fit the configured
//! bounding box, and encode it as JPEG. The run blocks on this step and a
//! failure here is fatal to the run; nothing is published partially.
//!
//! The [`Render`] trait is the seam the orchestrator depends on, so tests can
//! substitute a canned renderer for the network-backed one.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops::FilterType, DynamicImage, ExtendedColorType, ImageEncoder, RgbImage};
use tracing::debug;

use crate::config::RenderConfig;
use crate::error::{RenderError, Result};
use crate::types::{MediaType, RenderedArtifact};

/// Percentage of the darkest pixels clipped to black during the stretch.
const STRETCH_LOWER_PCT: f32 = 2.0;
/// Percentage of the brightest pixels clipped to white during the stretch.
const STRETCH_UPPER_PCT: f32 = 0.5;

#[async_trait]
pub trait Render: Send + Sync {
    async fn render(&self, locator: &str) -> Result<RenderedArtifact>;
}

/// Production renderer: HTTP fetch + transform + JPEG encode.
pub struct ImageRenderer {
    client: reqwest::Client,
    max_dimension: u32,
    jpeg_quality: u8,
    timeout_secs: u64,
}

impl ImageRenderer {
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RenderError::Fetch(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_dimension: config.max_dimension,
            jpeg_quality: config.jpeg_quality,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl Render for ImageRenderer {
    async fn render(&self, locator: &str) -> Result<RenderedArtifact> {
        debug!(locator, "Fetching source asset");

        let response = self.client.get(locator).send().await.map_err(|e| {
            if e.is_timeout() {
                RenderError::Timeout(self.timeout_secs)
            } else {
                RenderError::Fetch(format!("{}: {}", locator, e))
            }
        })?;

        if !response.status().is_success() {
            return Err(RenderError::Fetch(format!(
                "HTTP {} fetching {}",
                response.status(),
                locator
            ))
            .into());
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                RenderError::Timeout(self.timeout_secs)
            } else {
                RenderError::Fetch(format!("{}: {}", locator, e))
            }
        })?;

        let source = image::load_from_memory(&bytes)
            .map_err(|e| RenderError::Decode(e.to_string()))?;

        let processed = transform(source, self.max_dimension);
        let encoded = encode_jpeg(&processed, self.jpeg_quality)?;

        debug!(
            bytes = encoded.len(),
            width = processed.width(),
            height = processed.height(),
            "Rendered artifact"
        );

        Ok(RenderedArtifact::new(encoded, MediaType::Jpeg))
    }
}

/// Contrast stretch then bounded resize. Pure; exercised directly by tests.
fn transform(source: DynamicImage, max_dimension: u32) -> RgbImage {
    let mut rgb = source.to_rgb8();
    stretch_contrast(&mut rgb, STRETCH_LOWER_PCT, STRETCH_UPPER_PCT);

    let (width, height) = rgb.dimensions();
    if width.max(height) <= max_dimension {
        // Sources smaller than the bounding box are published as-is.
        return rgb;
    }

    DynamicImage::ImageRgb8(rgb)
        .resize(max_dimension, max_dimension, FilterType::Lanczos3)
        .to_rgb8()
}

/// Linear contrast stretch over the luma histogram: the darkest `lower_pct`
/// percent of pixels clip to black, the brightest `upper_pct` percent to
/// white, and everything between is remapped across the full range.
fn stretch_contrast(image: &mut RgbImage, lower_pct: f32, upper_pct: f32) {
    let total = (image.width() as u64) * (image.height() as u64);
    if total == 0 {
        return;
    }

    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[luma(pixel.0) as usize] += 1;
    }

    let lower_clip = ((total as f64) * (lower_pct as f64) / 100.0) as u64;
    let upper_clip = ((total as f64) * (upper_pct as f64) / 100.0) as u64;

    let mut low = 0u32;
    let mut cumulative = 0u64;
    for (intensity, count) in histogram.iter().enumerate() {
        cumulative += count;
        if cumulative > lower_clip {
            low = intensity as u32;
            break;
        }
    }

    let mut high = 255u32;
    cumulative = 0;
    for (intensity, count) in histogram.iter().enumerate().rev() {
        cumulative += count;
        if cumulative > upper_clip {
            high = intensity as u32;
            break;
        }
    }

    if high <= low {
        // Degenerate histogram (flat image); nothing to stretch.
        return;
    }

    let range = high - low;
    let mut lut = [0u8; 256];
    for (intensity, entry) in lut.iter_mut().enumerate() {
        let value = intensity as u32;
        *entry = if value <= low {
            0
        } else if value >= high {
            255
        } else {
            (((value - low) * 255 + range / 2) / range) as u8
        };
    }

    for pixel in image.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = lut[*channel as usize];
        }
    }
}

fn luma(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb;
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Canned renderer for integration tests (available in all builds, like the
/// mock platform, so downstream crates can drive the orchestrator without a
/// network).
pub struct MockRenderer {
    artifact: Option<RenderedArtifact>,
    error: Option<String>,
}

impl MockRenderer {
    /// Renderer that always yields the given bytes as a JPEG artifact.
    pub fn returning(bytes: Vec<u8>) -> Self {
        Self {
            artifact: Some(RenderedArtifact::new(bytes, MediaType::Jpeg)),
            error: None,
        }
    }

    /// Renderer that always fails with a fetch error.
    pub fn failing(detail: &str) -> Self {
        Self {
            artifact: None,
            error: Some(detail.to_string()),
        }
    }
}

#[async_trait]
impl Render for MockRenderer {
    async fn render(&self, _locator: &str) -> Result<RenderedArtifact> {
        match (&self.artifact, &self.error) {
            (Some(artifact), _) => Ok(artifact.clone()),
            (None, Some(detail)) => Err(RenderError::Fetch(detail.clone()).into()),
            (None, None) => Err(RenderError::Fetch("mock renderer unset".to_string()).into()),
        }
    }
}
