//! Mock language model for testing
//!
//! Configurable double used by generator and pipeline tests to exercise
//! success, every failure class, and latency without touching the network.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::error::ModelError;
use crate::model::{CompletionRequest, LanguageModel};

pub struct MockModel {
    reply: std::result::Result<String, ModelError>,
    delay: Duration,
    /// Prompts the mock has been called with (for verification)
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockModel {
    /// Mock that replies with fixed text.
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            delay: Duration::from_millis(0),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Mock that fails every call with the given error.
    pub fn failing(error: ModelError) -> Self {
        Self {
            reply: Err(error),
            delay: Duration::from_millis(0),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Mock that simulates a timing-out call.
    pub fn timing_out() -> Self {
        Self::failing(ModelError::Timeout(Duration::from_secs(30)))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<String, ModelError> {
        self.requests.lock().unwrap().push(request.clone());

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        self.reply.clone()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            system_prompt: "system".to_string(),
            user_prompt: "user".to_string(),
            temperature: 0.7,
            timeout: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn test_mock_replies() {
        let model = MockModel::replying("$ABC: all quiet. stack?");
        let text = model.complete(&request()).await.unwrap();
        assert_eq!(text, "$ABC: all quiet. stack?");
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_fails() {
        let model = MockModel::failing(ModelError::Auth("401".to_string()));
        let err = model.complete(&request()).await.unwrap_err();
        assert_eq!(err.class(), "auth");
    }

    #[tokio::test]
    async fn test_mock_records_prompts() {
        let model = MockModel::replying("ok");
        model.complete(&request()).await.unwrap();

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].user_prompt, "user");
    }
}
