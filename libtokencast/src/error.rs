//! Error types for Tokencast

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TokencastError>;

#[derive(Error, Debug)]
pub enum TokencastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Invalid input: {0}")]
    Validation(String),
}

impl TokencastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TokencastError::Validation(_) => 3,
            TokencastError::Platform(PlatformError::Authentication(_)) => 2,
            TokencastError::Platform(_) => 1,
            TokencastError::Config(_) => 1,
            TokencastError::Database(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised by platform adapters and the dispatcher.
///
/// The dispatcher flattens these into [`crate::types::ErrorKind`] values on
/// the returned outcome; adapters pick the variant that lets that
/// classification stay faithful (401/403 responses map to `Authentication`,
/// 429 responses to `Throttled`, everything else to `Delivery`).
#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Unsupported platform: {0}")]
    Unsupported(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Media upload failed: {0}")]
    MediaUpload(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Platform throttled the request: {0}")]
    Throttled(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Not supported: {0}")]
    NotSupported(String),
}

/// Typed failure classes for the language-model call.
///
/// These never cross the generator boundary: every variant degrades to the
/// deterministic fallback message. They exist so the failure class can be
/// logged and asserted on in tests.
#[derive(Error, Debug, Clone)]
pub enum ModelError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("empty completion")]
    Empty,

    #[error("network error: {0}")]
    Network(String),
}

impl ModelError {
    /// Short class label used in log fields.
    pub fn class(&self) -> &'static str {
        match self {
            ModelError::Timeout(_) => "timeout",
            ModelError::Auth(_) => "auth",
            ModelError::RateLimited(_) => "rate-limited",
            ModelError::Malformed(_) => "malformed",
            ModelError::Empty => "empty",
            ModelError::Network(_) => "network",
        }
    }
}
