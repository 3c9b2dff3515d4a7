//! Static posting rules per platform
//!
//! The registry maps a platform identifier to the rules the dispatcher
//! enforces: maximum post length, allowed media kinds, and the rate-limit
//! quota. Rules are immutable once the registry is built.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::types::MediaKind;

/// Posting quota within a fixed time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuota {
    /// Number of posts admitted per window
    pub quota: u32,
    /// Window length in minutes
    pub window_minutes: u32,
}

/// Posting rules for one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRule {
    pub platform: String,
    pub max_post_length: usize,
    pub allowed_media: Vec<MediaKind>,
    pub rate_limit: RateQuota,
}

impl PlatformRule {
    fn validate(&self) -> Result<()> {
        if self.platform.trim().is_empty() {
            return Err(ConfigError::MissingField("rule.platform".to_string()).into());
        }
        if self.max_post_length == 0 {
            return Err(invalid_field(&self.platform, "max_post_length"));
        }
        if self.rate_limit.quota == 0 {
            return Err(invalid_field(&self.platform, "rate_limit.quota"));
        }
        if self.rate_limit.window_minutes == 0 {
            return Err(invalid_field(&self.platform, "rate_limit.window_minutes"));
        }
        Ok(())
    }
}

fn invalid_field(platform: &str, field: &str) -> crate::error::TokencastError {
    ConfigError::InvalidField {
        field: format!("{}.{}", platform, field),
        reason: "must be a positive integer".to_string(),
    }
    .into()
}

/// Immutable platform-id to posting-rules table.
pub struct PlatformRegistry {
    rules: HashMap<String, PlatformRule>,
}

impl PlatformRegistry {
    /// Build a registry from explicit rules, rejecting non-positive limits.
    pub fn from_rules(rules: Vec<PlatformRule>) -> Result<Self> {
        let mut map = HashMap::new();
        for rule in rules {
            rule.validate()?;
            map.insert(rule.platform.clone(), rule);
        }
        Ok(Self { rules: map })
    }

    /// Registry with the stock rules for the supported platforms.
    pub fn builtin() -> Self {
        let all_media = vec![MediaKind::Image, MediaKind::Video, MediaKind::Gif];
        let rules = vec![
            PlatformRule {
                platform: "twitter".to_string(),
                max_post_length: 280,
                allowed_media: all_media.clone(),
                rate_limit: RateQuota {
                    quota: 300,
                    window_minutes: 180,
                },
            },
            PlatformRule {
                platform: "telegram".to_string(),
                max_post_length: 4096,
                allowed_media: all_media.clone(),
                rate_limit: RateQuota {
                    quota: 20,
                    window_minutes: 60,
                },
            },
            PlatformRule {
                platform: "discord".to_string(),
                max_post_length: 2000,
                allowed_media: all_media,
                rate_limit: RateQuota {
                    quota: 5,
                    window_minutes: 1,
                },
            },
        ];

        // Stock rules are known-valid
        Self::from_rules(rules).expect("builtin rules are valid")
    }

    /// Look up the rules for a platform. `None` means the platform is not
    /// supported at all.
    pub fn rule(&self, platform: &str) -> Option<&PlatformRule> {
        self.rules.get(platform)
    }

    /// Iterate over the registered platform identifiers.
    pub fn platforms(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}
