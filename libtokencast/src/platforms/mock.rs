//! Mock platform implementation for testing
//!
//! Configurable double simulating successes, classified failures, media
//! upload flows, and latency. Used by dispatcher and pipeline tests to
//! verify routing without credentials or network access.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::error::{PlatformError, Result};
use crate::platforms::{Platform, ResolvedMedia};
use crate::types::MediaItem;

/// Configuration for mock platform behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Platform name (e.g. "telegram", "mock-twitter")
    pub name: String,

    /// Whether posting should succeed
    pub post_succeeds: bool,

    /// Error to return on posting failure
    pub post_error: Option<PlatformError>,

    /// Whether the platform uploads media before posting
    pub requires_media_upload: bool,

    /// Whether media uploads succeed
    pub upload_succeeds: bool,

    /// Delay before completing operations (simulates network latency)
    pub delay: Duration,

    /// Whether the platform is configured
    pub is_configured: bool,

    /// Number of times post has been called
    pub post_call_count: Arc<Mutex<usize>>,

    /// Number of times upload_media has been called
    pub upload_call_count: Arc<Mutex<usize>>,

    /// Text that has been posted (for verification)
    pub posted_content: Arc<Mutex<Vec<String>>>,

    /// Media that accompanied each post (for verification)
    pub posted_media: Arc<Mutex<Vec<Vec<ResolvedMedia>>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            post_succeeds: true,
            post_error: None,
            requires_media_upload: false,
            upload_succeeds: true,
            delay: Duration::from_millis(0),
            is_configured: true,
            post_call_count: Arc::new(Mutex::new(0)),
            upload_call_count: Arc::new(Mutex::new(0)),
            posted_content: Arc::new(Mutex::new(Vec::new())),
            posted_media: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock platform for testing
pub struct MockPlatform {
    config: MockConfig,
}

impl MockPlatform {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Create a mock platform that always succeeds
    pub fn success(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            ..Default::default()
        })
    }

    /// Create a mock platform that fails posting with the given error
    pub fn post_failure(name: &str, error: PlatformError) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            post_succeeds: false,
            post_error: Some(error),
            ..Default::default()
        })
    }

    /// Create a mock platform that uploads media before posting
    pub fn with_media_upload(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            requires_media_upload: true,
            ..Default::default()
        })
    }

    /// Create a mock platform whose media uploads fail
    pub fn upload_failure(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            requires_media_upload: true,
            upload_succeeds: false,
            ..Default::default()
        })
    }

    /// Create a mock platform with a delay
    pub fn with_delay(name: &str, delay: Duration) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            delay,
            ..Default::default()
        })
    }

    /// Create a mock platform that is not configured
    pub fn not_configured(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            is_configured: false,
            ..Default::default()
        })
    }

    pub fn post_call_count(&self) -> usize {
        *self.config.post_call_count.lock().unwrap()
    }

    pub fn upload_call_count(&self) -> usize {
        *self.config.upload_call_count.lock().unwrap()
    }

    pub fn posted_content(&self) -> Vec<String> {
        self.config.posted_content.lock().unwrap().clone()
    }

    pub fn posted_media(&self) -> Vec<Vec<ResolvedMedia>> {
        self.config.posted_media.lock().unwrap().clone()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured
    }

    fn requires_media_upload(&self) -> bool {
        self.config.requires_media_upload
    }

    async fn upload_media(&self, media: &MediaItem) -> Result<String> {
        *self.config.upload_call_count.lock().unwrap() += 1;

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        if self.config.upload_succeeds {
            Ok(format!("{}-media-{}", self.config.name, media.url))
        } else {
            Err(PlatformError::MediaUpload("mock upload failed".to_string()).into())
        }
    }

    async fn post(&self, text: &str, media: &[ResolvedMedia]) -> Result<String> {
        *self.config.post_call_count.lock().unwrap() += 1;

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        if self.config.post_succeeds {
            self.config
                .posted_content
                .lock()
                .unwrap()
                .push(text.to_string());
            self.config
                .posted_media
                .lock()
                .unwrap()
                .push(media.to_vec());

            let post_id = format!("{}:mock-{}", self.config.name, uuid::Uuid::new_v4());
            Ok(post_id)
        } else {
            let error = self
                .config
                .post_error
                .clone()
                .unwrap_or_else(|| PlatformError::Delivery("mock posting failed".to_string()));
            Err(error.into())
        }
    }
}
