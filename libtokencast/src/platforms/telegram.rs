//! Telegram platform adapter
//!
//! Routes by the first media item's kind: images go through `sendPhoto`,
//! videos through `sendVideo`, anything else falls back to a plain
//! `sendMessage`. The text always travels along, as a caption when media is
//! attached. Telegram accepts hosted URLs directly, so no upload step.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::error::{PlatformError, Result};
use crate::platforms::{classify_status, Platform, ResolvedMedia};
use crate::types::MediaKind;

const API_BASE: &str = "https://api.telegram.org";

pub struct TelegramPlatform {
    http: reqwest::Client,
    bot_token: SecretString,
    chat_id: String,
    api_base: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<SentMessage>,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: i64,
}

impl TelegramPlatform {
    pub fn new(bot_token: SecretString, chat_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token,
            chat_id,
            api_base: API_BASE.to_string(),
        }
    }

    /// Override the API endpoint (integration tests point this at a local
    /// server).
    pub fn with_endpoint(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base,
            self.bot_token.expose_secret(),
            method
        )
    }

    async fn call(&self, method: &str, body: serde_json::Value) -> Result<String> {
        let response = self
            .http
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| PlatformError::Delivery(format!("telegram: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(classify_status("telegram", status, &detail).into());
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Delivery(format!("telegram response: {}", e)))?;

        if !parsed.ok {
            return Err(PlatformError::Delivery(format!(
                "telegram rejected {}: {}",
                method,
                parsed.description.unwrap_or_else(|| "no description".to_string())
            ))
            .into());
        }

        Ok(parsed
            .result
            .map(|m| m.message_id.to_string())
            .unwrap_or_default())
    }
}

#[async_trait]
impl Platform for TelegramPlatform {
    fn name(&self) -> &str {
        "telegram"
    }

    fn is_configured(&self) -> bool {
        !self.bot_token.expose_secret().is_empty() && !self.chat_id.is_empty()
    }

    async fn post(&self, text: &str, media: &[ResolvedMedia]) -> Result<String> {
        match media.first() {
            Some(first) if first.item.kind == MediaKind::Image => {
                self.call(
                    "sendPhoto",
                    json!({
                        "chat_id": self.chat_id,
                        "photo": first.item.url,
                        "caption": text,
                    }),
                )
                .await
            }
            Some(first) if first.item.kind == MediaKind::Video => {
                self.call(
                    "sendVideo",
                    json!({
                        "chat_id": self.chat_id,
                        "video": first.item.url,
                        "caption": text,
                    }),
                )
                .await
            }
            _ => {
                self.call(
                    "sendMessage",
                    json!({
                        "chat_id": self.chat_id,
                        "text": text,
                    }),
                )
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform() -> TelegramPlatform {
        TelegramPlatform::new(
            SecretString::from("123:abc".to_string()),
            "@promochannel".to_string(),
        )
    }

    #[test]
    fn test_method_url_embeds_token() {
        let url = platform().method_url("sendMessage");
        assert_eq!(url, "https://api.telegram.org/bot123:abc/sendMessage");
    }

    #[test]
    fn test_is_configured_requires_chat_id() {
        let p = TelegramPlatform::new(SecretString::from("123:abc".to_string()), String::new());
        assert!(!p.is_configured());
        assert!(platform().is_configured());
    }

    #[test]
    fn test_api_response_parsing() {
        let parsed: ApiResponse =
            serde_json::from_str(r#"{"ok":true,"result":{"message_id":42,"date":0}}"#).unwrap();
        assert!(parsed.ok);
        assert_eq!(parsed.result.unwrap().message_id, 42);
    }

    #[test]
    fn test_api_error_response_parsing() {
        let parsed: ApiResponse =
            serde_json::from_str(r#"{"ok":false,"description":"Bad Request: chat not found"}"#)
                .unwrap();
        assert!(!parsed.ok);
        assert_eq!(
            parsed.description.as_deref(),
            Some("Bad Request: chat not found")
        );
    }

    #[test]
    fn test_does_not_require_media_upload() {
        assert!(!platform().requires_media_upload());
    }
}
