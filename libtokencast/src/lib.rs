//! Tokencast - token market snapshots to social platforms
//!
//! This library turns collected crypto-token market data into short
//! promotional posts via a language-model API and distributes them across
//! social platforms under per-platform posting rules.

pub mod config;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod generator;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod platforms;
pub mod rate_limiter;
pub mod registry;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use dispatcher::Dispatcher;
pub use error::{Result, TokencastError};
pub use generator::ContentGenerator;
pub use pipeline::{PromoPipeline, RunReport};
pub use rate_limiter::RateLimiter;
pub use registry::{PlatformRegistry, PlatformRule, RateQuota};
pub use types::{
    ErrorKind, GeneratedMessage, MessageSource, PostOutcome, Sentiment, TokenRecord,
};
