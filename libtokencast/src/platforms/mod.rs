//! Platform adapters
//!
//! One adapter per social platform, each a thin translation of "post text
//! plus optional media" onto that platform's API shape. Adapters raise
//! classifiable [`PlatformError`]s; policy (truncation, rate limiting, media
//! filtering) lives in the dispatcher, not here.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{secret_from_env, Config};
use crate::error::{PlatformError, Result};
use crate::types::MediaItem;

pub mod discord;
pub mod telegram;
pub mod twitter;

// Mock platform is available for all builds (not just tests) to support
// integration tests
pub mod mock;

/// A media item ready for the post call: the original reference plus the
/// platform-side media ID when the platform required an upload first.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMedia {
    pub item: MediaItem,
    pub media_id: Option<String>,
}

impl ResolvedMedia {
    /// Media posted directly by URL, no platform-side upload.
    pub fn by_url(item: MediaItem) -> Self {
        Self {
            item,
            media_id: None,
        }
    }

    /// Media uploaded ahead of the post call.
    pub fn uploaded(item: MediaItem, media_id: impl Into<String>) -> Self {
        Self {
            item,
            media_id: Some(media_id.into()),
        }
    }
}

/// Platform trait for unified posting
#[async_trait]
pub trait Platform: Send + Sync {
    /// Lowercase platform identifier (e.g. "twitter", "telegram")
    fn name(&self) -> &str;

    /// Whether the adapter has the credentials it needs to post.
    fn is_configured(&self) -> bool;

    /// Whether media must be uploaded to the platform before the post call
    /// can reference it. When true, the dispatcher uploads every item via
    /// [`Platform::upload_media`] and fails the post if any upload fails.
    fn requires_media_upload(&self) -> bool {
        false
    }

    /// Upload one media item, returning the platform-side media ID.
    ///
    /// # Errors
    ///
    /// Default implementation: the platform does not upload media.
    async fn upload_media(&self, media: &MediaItem) -> Result<String> {
        let _ = media;
        Err(
            PlatformError::NotSupported(format!("{} does not upload media", self.name()))
                .into(),
        )
    }

    /// Post text (with already-resolved media) and return the
    /// platform-specific post ID. An empty ID means the platform accepted
    /// the call without producing one (permissive no-op).
    ///
    /// # Errors
    ///
    /// Returns a [`PlatformError`] the dispatcher classifies:
    /// `Authentication` for rejected credentials, `Throttled` for the
    /// platform's own 429s, `Delivery` for everything else.
    async fn post(&self, text: &str, media: &[ResolvedMedia]) -> Result<String>;
}

/// Map an HTTP status from a platform API onto the error variant the
/// dispatcher classifies.
pub(crate) fn classify_status(
    platform: &str,
    status: reqwest::StatusCode,
    detail: &str,
) -> PlatformError {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        PlatformError::Authentication(format!("{} returned {}: {}", platform, status, detail))
    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        PlatformError::Throttled(format!("{} returned {}: {}", platform, status, detail))
    } else {
        PlatformError::Delivery(format!("{} returned {}: {}", platform, status, detail))
    }
}

/// Create platform adapters for all enabled platforms in the configuration.
///
/// Platforms with missing credentials are skipped with a warning rather than
/// failing the whole set, except Discord: an uninitialized Discord adapter
/// is still constructed so its configured no-op/strict policy applies.
pub fn create_platforms(config: &Config) -> Result<Vec<std::sync::Arc<dyn Platform>>> {
    let mut platforms: Vec<std::sync::Arc<dyn Platform>> = Vec::new();

    if let Some(twitter_config) = &config.twitter {
        if twitter_config.enabled {
            match secret_from_env(&twitter_config.bearer_token_env) {
                Some(token) => {
                    info!("Creating Twitter platform client");
                    platforms.push(std::sync::Arc::new(twitter::TwitterPlatform::new(token)));
                }
                None => {
                    warn!(
                        "Twitter enabled but {} is not set, skipping",
                        twitter_config.bearer_token_env
                    );
                }
            }
        }
    }

    if let Some(telegram_config) = &config.telegram {
        if telegram_config.enabled {
            match secret_from_env(&telegram_config.bot_token_env) {
                Some(token) => {
                    info!("Creating Telegram platform client");
                    platforms.push(std::sync::Arc::new(telegram::TelegramPlatform::new(
                        token,
                        telegram_config.chat_id.clone(),
                    )));
                }
                None => {
                    warn!(
                        "Telegram enabled but {} is not set, skipping",
                        telegram_config.bot_token_env
                    );
                }
            }
        }
    }

    if let Some(discord_config) = &config.discord {
        if discord_config.enabled {
            let token = secret_from_env(&discord_config.bot_token_env);
            if token.is_none() {
                warn!(
                    "Discord enabled but {} is not set",
                    discord_config.bot_token_env
                );
            }
            info!("Creating Discord platform client");
            platforms.push(std::sync::Arc::new(discord::DiscordPlatform::new(
                token,
                discord_config.channel_id.clone(),
                discord_config.strict,
            )));
        }
    }

    Ok(platforms)
}
