//! xAI chat-completions client
//!
//! Thin reqwest client for the OpenAI-compatible `/chat/completions`
//! endpoint. Response handling is deliberately strict: a 2xx with no usable
//! choice text is a malformed response, not a success.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::{secret_from_env, ModelConfig};
use crate::error::{ConfigError, ModelError, Result};
use crate::model::{CompletionRequest, LanguageModel};

pub struct XaiClient {
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl XaiClient {
    pub fn new(api_key: SecretString, base_url: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    /// Build a client from configuration, reading the API key from the
    /// configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns a config error when the key variable is unset or blank.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let api_key = secret_from_env(&config.api_key_env)
            .ok_or_else(|| ConfigError::MissingField(config.api_key_env.clone()))?;

        Ok(Self::new(
            api_key,
            config.base_url.clone(),
            config.model.clone(),
        ))
    }

    fn classify_send_error(&self, error: reqwest::Error, request: &CompletionRequest) -> ModelError {
        if error.is_timeout() {
            ModelError::Timeout(request.timeout)
        } else {
            ModelError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl LanguageModel for XaiClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<String, ModelError> {
        let body = ChatRequestBody {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(request.timeout)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e, request))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ModelError::Auth(format!("provider returned {}", status)));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::RateLimited(format!(
                "provider returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(ModelError::Network(format!("provider returned {}", status)));
        }

        let parsed: ChatResponseBody = response
            .json()
            .await
            .map_err(|e| ModelError::Malformed(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ModelError::Malformed("response has no choices".to_string()))?;

        if text.trim().is_empty() {
            return Err(ModelError::Empty);
        }

        Ok(text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_stripped() {
        let client = XaiClient::new(
            SecretString::from("test-key".to_string()),
            "https://api.x.ai/v1/".to_string(),
            "grok-2".to_string(),
        );
        assert_eq!(client.base_url, "https://api.x.ai/v1");
    }

    #[test]
    fn test_name_reports_model() {
        let client = XaiClient::new(
            SecretString::from("test-key".to_string()),
            "https://api.x.ai/v1".to_string(),
            "grok-2".to_string(),
        );
        assert_eq!(client.name(), "grok-2");
    }

    #[test]
    fn test_response_body_parsing() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"$ABC: looks lively. ape?"}}]}"#;
        let parsed: ChatResponseBody = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(
            parsed.choices[0].message.content,
            "$ABC: looks lively. ape?"
        );
    }

    #[test]
    fn test_response_body_without_choices() {
        let parsed: ChatResponseBody = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = ModelConfig {
            base_url: "https://api.x.ai/v1".to_string(),
            model: "grok-2".to_string(),
            api_key_env: "TOKENCAST_TEST_NO_SUCH_KEY".to_string(),
        };
        assert!(XaiClient::from_config(&config).is_err());
    }
}
