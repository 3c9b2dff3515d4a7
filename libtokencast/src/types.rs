//! Core types for Tokencast

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PlatformError;

/// A market metric that may arrive as a JSON number or a numeric string
/// (collectors emit both, e.g. `12345.6` and `"$12,345.60"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    /// Numeric view of the metric. Text values are parsed leniently with
    /// currency symbols and thousands separators stripped.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            MetricValue::Text(s) => s
                .trim()
                .trim_start_matches('$')
                .replace(',', "")
                .parse()
                .ok(),
        }
    }

    /// Render for prompt embedding: large numeric values get a K/M/B
    /// suffix, everything else passes through as-is.
    pub fn compact(&self) -> String {
        match self.as_f64() {
            Some(v) => compact_number(v),
            None => match self {
                MetricValue::Text(s) => s.clone(),
                MetricValue::Number(n) => n.to_string(),
            },
        }
    }
}

fn compact_number(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", v / 1e3)
    } else {
        format!("{}", v)
    }
}

/// Collector-reported sentiment for a token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl From<&str> for Sentiment {
    /// Lenient mapping used at the source boundary: anything the collector
    /// reports outside the known set lands on `Neutral`.
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One market-data snapshot for a token, as handed over by a token source.
///
/// `symbol` and `name` are required before generation is attempted; the
/// remaining fields are whatever the collector managed to capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub price: Option<MetricValue>,
    #[serde(default)]
    pub volume_24h: Option<MetricValue>,
    #[serde(default)]
    pub market_cap: Option<MetricValue>,
    #[serde(default)]
    pub sentiment: Sentiment,
    #[serde(default)]
    pub events: Vec<String>,
    /// Free-form narrative metadata from the collector's name analysis.
    #[serde(default)]
    pub narrative: Option<String>,
}

impl TokenRecord {
    /// Minimal record with just the required fields.
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            price: None,
            volume_24h: None,
            market_cap: None,
            sentiment: Sentiment::Neutral,
            events: Vec::new(),
            narrative: None,
        }
    }
}

/// Where a generated message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSource {
    /// Language-model output.
    Model,
    /// Deterministic template used when the model call failed.
    Fallback,
}

impl MessageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSource::Model => "model",
            MessageSource::Fallback => "fallback",
        }
    }
}

/// A candidate promotional message.
///
/// Text is bounded against the platform limit at dispatch time, not here;
/// generation is allowed to overproduce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMessage {
    pub text: String,
    pub source: MessageSource,
}

impl GeneratedMessage {
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: MessageSource::Model,
        }
    }

    pub fn fallback(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: MessageSource::Fallback,
        }
    }
}

/// Media kinds a platform rule can allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Gif,
}

/// A media reference attached to a post (hosted URL plus its kind).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    pub kind: MediaKind,
}

/// Failure classification on a [`PostOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    UnsupportedPlatform,
    RateLimited,
    MediaUploadFailed,
    AuthFailed,
    PlatformThrottled,
    DeliveryFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedPlatform => "unsupported_platform",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::MediaUploadFailed => "media_upload_failed",
            ErrorKind::AuthFailed => "auth_failed",
            ErrorKind::PlatformThrottled => "platform_throttled",
            ErrorKind::DeliveryFailed => "delivery_failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unsupported_platform" => Some(ErrorKind::UnsupportedPlatform),
            "rate_limited" => Some(ErrorKind::RateLimited),
            "media_upload_failed" => Some(ErrorKind::MediaUploadFailed),
            "auth_failed" => Some(ErrorKind::AuthFailed),
            "platform_throttled" => Some(ErrorKind::PlatformThrottled),
            "delivery_failed" => Some(ErrorKind::DeliveryFailed),
            _ => None,
        }
    }
}

impl From<&PlatformError> for ErrorKind {
    fn from(error: &PlatformError) -> Self {
        match error {
            PlatformError::Unsupported(_) => ErrorKind::UnsupportedPlatform,
            PlatformError::RateLimited(_) => ErrorKind::RateLimited,
            PlatformError::MediaUpload(_) => ErrorKind::MediaUploadFailed,
            PlatformError::Authentication(_) => ErrorKind::AuthFailed,
            PlatformError::Throttled(_) => ErrorKind::PlatformThrottled,
            PlatformError::Delivery(_) | PlatformError::NotSupported(_) => {
                ErrorKind::DeliveryFailed
            }
        }
    }
}

/// Result of one dispatch attempt to one platform.
///
/// Ephemeral: the dispatcher returns it, the pipeline layer decides whether
/// to persist it as a [`PostRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostOutcome {
    pub platform: String,
    pub success: bool,
    pub error: Option<ErrorKind>,
    /// Platform-specific post ID (if the platform reported one)
    pub platform_post_id: Option<String>,
}

impl PostOutcome {
    pub fn delivered(platform: impl Into<String>, post_id: Option<String>) -> Self {
        Self {
            platform: platform.into(),
            success: true,
            error: None,
            platform_post_id: post_id,
        }
    }

    pub fn failed(platform: impl Into<String>, error: ErrorKind) -> Self {
        Self {
            platform: platform.into(),
            success: false,
            error: Some(error),
            platform_post_id: None,
        }
    }
}

/// A generated message as stored by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub token_symbol: String,
    pub text: String,
    pub source: MessageSource,
    pub created_at: i64,
    pub posted: bool,
}

impl StoredMessage {
    pub fn from_message(token_symbol: impl Into<String>, message: &GeneratedMessage) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            token_symbol: token_symbol.into(),
            text: message.text.clone(),
            source: message.source,
            created_at: chrono::Utc::now().timestamp(),
            posted: false,
        }
    }
}

/// Per-platform delivery record for a stored message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: Option<i64>,
    pub message_id: String,
    pub platform: String,
    pub platform_post_id: Option<String>,
    pub posted_at: Option<i64>,
    pub success: bool,
    pub error_kind: Option<ErrorKind>,
}

impl PostRecord {
    pub fn from_outcome(message_id: impl Into<String>, outcome: &PostOutcome, now: i64) -> Self {
        Self {
            id: None,
            message_id: message_id.into(),
            platform: outcome.platform.clone(),
            platform_post_id: outcome.platform_post_id.clone(),
            posted_at: outcome.success.then_some(now),
            success: outcome.success,
            error_kind: outcome.error,
        }
    }
}
