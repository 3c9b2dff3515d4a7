//! Language-model client abstraction
//!
//! The generator talks to the model through the [`LanguageModel`] trait so
//! tests can swap in a double. The production implementation is the
//! chat-completions client in [`xai`].

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ModelError;

pub mod xai;

// Mock model is available for all builds (not just tests) to support
// integration tests
pub mod mock;

/// One completion request: a fixed system role plus the built user prompt.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub timeout: Duration,
}

/// A text-completion backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Request a completion and return its raw text.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] classifying the failure (timeout, auth,
    /// provider rate limit, malformed response, network). Callers are
    /// expected to degrade, not propagate.
    async fn complete(&self, request: &CompletionRequest)
        -> std::result::Result<String, ModelError>;

    /// Identifier for logs (e.g. "grok-2").
    fn name(&self) -> &str;
}
