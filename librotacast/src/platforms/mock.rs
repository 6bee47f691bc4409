//! Mock platform implementation for testing
//!
//! A configurable destination that can simulate success, failure at either
//! publishing step, and network latency, without credentials or network
//! access. Used by the publisher and orchestrator tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{PlatformError, Result};
use crate::platforms::Platform;
use crate::types::{MediaHandle, RenderedArtifact};

/// Configuration for mock platform behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Platform name (e.g., "mock-mastodon")
    pub name: String,

    /// Whether authentication should succeed
    pub auth_succeeds: bool,

    /// Whether media upload should succeed
    pub upload_succeeds: bool,

    /// Whether post creation should succeed
    pub post_succeeds: bool,

    /// Delay before completing each operation (simulates network latency)
    pub delay: Duration,

    /// Character limit for caption validation
    pub character_limit: Option<usize>,

    /// Whether the platform reports itself as configured
    pub is_configured: bool,

    /// Number of times upload_media has been called
    pub upload_call_count: Arc<Mutex<usize>>,

    /// Number of times create_post has been called
    pub post_call_count: Arc<Mutex<usize>>,

    /// Captions that have been posted (for verification)
    pub posted_captions: Arc<Mutex<Vec<String>>>,

    /// Media byte lengths that have been uploaded (for verification)
    pub uploaded_sizes: Arc<Mutex<Vec<usize>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            auth_succeeds: true,
            upload_succeeds: true,
            post_succeeds: true,
            delay: Duration::from_millis(0),
            character_limit: None,
            is_configured: true,
            upload_call_count: Arc::new(Mutex::new(0)),
            post_call_count: Arc::new(Mutex::new(0)),
            posted_captions: Arc::new(Mutex::new(Vec::new())),
            uploaded_sizes: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock platform for testing
pub struct MockPlatform {
    config: MockConfig,
    authenticated: bool,
}

impl MockPlatform {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            authenticated: false,
        }
    }

    /// A platform where every step succeeds (pre-authenticated)
    pub fn success(name: &str) -> Self {
        let mut platform = Self::new(MockConfig {
            name: name.to_string(),
            ..Default::default()
        });
        platform.authenticated = true;
        platform
    }

    /// A platform whose authenticate call fails
    pub fn auth_failure(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            auth_succeeds: false,
            ..Default::default()
        })
    }

    /// A platform whose media upload fails (pre-authenticated)
    pub fn upload_failure(name: &str) -> Self {
        let mut platform = Self::new(MockConfig {
            name: name.to_string(),
            upload_succeeds: false,
            ..Default::default()
        });
        platform.authenticated = true;
        platform
    }

    /// A platform whose post creation fails (pre-authenticated)
    pub fn post_failure(name: &str) -> Self {
        let mut platform = Self::new(MockConfig {
            name: name.to_string(),
            post_succeeds: false,
            ..Default::default()
        });
        platform.authenticated = true;
        platform
    }

    /// A platform that sleeps before each operation (pre-authenticated)
    pub fn with_delay(name: &str, delay: Duration) -> Self {
        let mut platform = Self::new(MockConfig {
            name: name.to_string(),
            delay,
            ..Default::default()
        });
        platform.authenticated = true;
        platform
    }

    /// A platform with a caption character limit (pre-authenticated)
    pub fn with_limit(name: &str, limit: usize) -> Self {
        let mut platform = Self::new(MockConfig {
            name: name.to_string(),
            character_limit: Some(limit),
            ..Default::default()
        });
        platform.authenticated = true;
        platform
    }

    pub fn upload_call_count(&self) -> usize {
        *self.config.upload_call_count.lock().unwrap()
    }

    pub fn post_call_count(&self) -> usize {
        *self.config.post_call_count.lock().unwrap()
    }

    pub fn posted_captions(&self) -> Vec<String> {
        self.config.posted_captions.lock().unwrap().clone()
    }

    pub fn uploaded_sizes(&self) -> Vec<usize> {
        self.config.uploaded_sizes.lock().unwrap().clone()
    }

    /// Shared handles into this mock's call records, usable after the
    /// platform itself has been boxed and moved into a publisher.
    pub fn probes(&self) -> MockProbes {
        MockProbes {
            upload_call_count: self.config.upload_call_count.clone(),
            post_call_count: self.config.post_call_count.clone(),
            posted_captions: self.config.posted_captions.clone(),
            uploaded_sizes: self.config.uploaded_sizes.clone(),
        }
    }
}

/// Observation handles for a boxed [`MockPlatform`].
#[derive(Clone)]
pub struct MockProbes {
    upload_call_count: Arc<Mutex<usize>>,
    post_call_count: Arc<Mutex<usize>>,
    posted_captions: Arc<Mutex<Vec<String>>>,
    uploaded_sizes: Arc<Mutex<Vec<usize>>>,
}

impl MockProbes {
    pub fn upload_call_count(&self) -> usize {
        *self.upload_call_count.lock().unwrap()
    }

    pub fn post_call_count(&self) -> usize {
        *self.post_call_count.lock().unwrap()
    }

    pub fn posted_captions(&self) -> Vec<String> {
        self.posted_captions.lock().unwrap().clone()
    }

    pub fn uploaded_sizes(&self) -> Vec<usize> {
        self.uploaded_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn authenticate(&mut self) -> Result<()> {
        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        if self.config.auth_succeeds {
            self.authenticated = true;
            Ok(())
        } else {
            Err(PlatformError::Authentication("Mock authentication failed".to_string()).into())
        }
    }

    async fn upload_media(&self, artifact: &RenderedArtifact) -> Result<MediaHandle> {
        *self.config.upload_call_count.lock().unwrap() += 1;

        if !self.authenticated {
            return Err(PlatformError::Authentication("Not authenticated".to_string()).into());
        }

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        if self.config.upload_succeeds {
            self.config
                .uploaded_sizes
                .lock()
                .unwrap()
                .push(artifact.len());
            Ok(MediaHandle::new(format!("{}:media-1", self.config.name)))
        } else {
            Err(PlatformError::Upload("Mock upload failed".to_string()).into())
        }
    }

    async fn create_post(&self, caption: &str, media: &[MediaHandle]) -> Result<String> {
        *self.config.post_call_count.lock().unwrap() += 1;

        if !self.authenticated {
            return Err(PlatformError::Authentication("Not authenticated".to_string()).into());
        }

        self.validate_caption(caption)?;

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        if self.config.post_succeeds {
            self.config
                .posted_captions
                .lock()
                .unwrap()
                .push(caption.to_string());
            Ok(format!(
                "{}:post-{}",
                self.config.name,
                media.len()
            ))
        } else {
            Err(PlatformError::Posting("Mock posting failed".to_string()).into())
        }
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn character_limit(&self) -> Option<usize> {
        self.config.character_limit
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured
    }
}
