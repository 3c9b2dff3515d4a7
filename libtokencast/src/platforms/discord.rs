//! Discord platform adapter
//!
//! Sends the text to one configured channel via the REST messages endpoint.
//! Misconfiguration handling is policy-driven: in permissive mode (the
//! default) an uninitialized client or missing channel makes posting a
//! silent no-op; in strict mode both are hard errors.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::error::{PlatformError, Result};
use crate::platforms::{classify_status, Platform, ResolvedMedia};

const API_BASE: &str = "https://discord.com/api/v10";

pub struct DiscordPlatform {
    http: reqwest::Client,
    bot_token: Option<SecretString>,
    channel_id: Option<String>,
    strict: bool,
    api_base: String,
}

#[derive(Deserialize)]
struct MessageResponse {
    id: String,
}

impl DiscordPlatform {
    pub fn new(bot_token: Option<SecretString>, channel_id: Option<String>, strict: bool) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token,
            channel_id,
            strict,
            api_base: API_BASE.to_string(),
        }
    }

    /// Override the API endpoint (integration tests point this at a local
    /// server).
    pub fn with_endpoint(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Platform for DiscordPlatform {
    fn name(&self) -> &str {
        "discord"
    }

    fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.channel_id.is_some()
    }

    async fn post(&self, text: &str, _media: &[ResolvedMedia]) -> Result<String> {
        let Some(token) = &self.bot_token else {
            if self.strict {
                return Err(PlatformError::Authentication(
                    "Discord client not initialized".to_string(),
                )
                .into());
            }
            warn!("Discord client not initialized, skipping post");
            return Ok(String::new());
        };

        let Some(channel_id) = &self.channel_id else {
            if self.strict {
                return Err(
                    PlatformError::Delivery("no Discord channel configured".to_string()).into(),
                );
            }
            warn!("No Discord channel configured, skipping post");
            return Ok(String::new());
        };

        let response = self
            .http
            .post(format!("{}/channels/{}/messages", self.api_base, channel_id))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bot {}", token.expose_secret()),
            )
            .json(&json!({ "content": text }))
            .send()
            .await
            .map_err(|e| PlatformError::Delivery(format!("discord: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(classify_status("discord", status, &detail).into());
        }

        let parsed: MessageResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Delivery(format!("discord response: {}", e)))?;

        Ok(parsed.id)
    }
}
