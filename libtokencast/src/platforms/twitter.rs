//! Twitter/X platform adapter
//!
//! Text posts go straight to the v2 tweet endpoint. Posts with media use
//! the upload-then-attach flow: each item is fetched from its hosted URL,
//! uploaded to the v1.1 media endpoint, and the returned media IDs are
//! attached to the tweet.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};
use crate::platforms::{classify_status, Platform, ResolvedMedia};
use crate::types::MediaItem;

const API_BASE: &str = "https://api.twitter.com";
const UPLOAD_BASE: &str = "https://upload.twitter.com";

pub struct TwitterPlatform {
    http: reqwest::Client,
    bearer_token: SecretString,
    api_base: String,
    upload_base: String,
}

#[derive(Serialize)]
struct TweetRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<TweetMedia>,
}

#[derive(Serialize)]
struct TweetMedia {
    media_ids: Vec<String>,
}

#[derive(Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}

#[derive(Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

impl TwitterPlatform {
    pub fn new(bearer_token: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            bearer_token,
            api_base: API_BASE.to_string(),
            upload_base: UPLOAD_BASE.to_string(),
        }
    }

    /// Override the API endpoints (integration tests point these at a local
    /// server).
    pub fn with_endpoints(mut self, api_base: String, upload_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.upload_base = upload_base.trim_end_matches('/').to_string();
        self
    }

    /// Fetch the media bytes from the hosted URL.
    async fn fetch_media(&self, media: &MediaItem) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(&media.url)
            .send()
            .await
            .map_err(|e| PlatformError::MediaUpload(format!("fetch {}: {}", media.url, e)))?;

        if !response.status().is_success() {
            return Err(PlatformError::MediaUpload(format!(
                "fetch {} returned {}",
                media.url,
                response.status()
            ))
            .into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PlatformError::MediaUpload(format!("fetch {}: {}", media.url, e)))?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Platform for TwitterPlatform {
    fn name(&self) -> &str {
        "twitter"
    }

    fn is_configured(&self) -> bool {
        !self.bearer_token.expose_secret().is_empty()
    }

    fn requires_media_upload(&self) -> bool {
        true
    }

    async fn upload_media(&self, media: &MediaItem) -> Result<String> {
        let bytes = self.fetch_media(media).await?;

        let part = reqwest::multipart::Part::bytes(bytes);
        let form = reqwest::multipart::Form::new().part("media", part);

        let response = self
            .http
            .post(format!("{}/1.1/media/upload.json", self.upload_base))
            .bearer_auth(self.bearer_token.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| PlatformError::MediaUpload(format!("upload: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                PlatformError::MediaUpload(format!("upload returned {}", status)).into(),
            );
        }

        let parsed: MediaUploadResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::MediaUpload(format!("upload response: {}", e)))?;

        Ok(parsed.media_id_string)
    }

    async fn post(&self, text: &str, media: &[ResolvedMedia]) -> Result<String> {
        let media_ids: Vec<String> = media
            .iter()
            .filter_map(|m| m.media_id.clone())
            .collect();

        let body = TweetRequest {
            text,
            media: if media_ids.is_empty() {
                None
            } else {
                Some(TweetMedia { media_ids })
            },
        };

        let response = self
            .http
            .post(format!("{}/2/tweets", self.api_base))
            .bearer_auth(self.bearer_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| PlatformError::Delivery(format!("twitter: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(classify_status("twitter", status, &detail).into());
        }

        let parsed: TweetResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Delivery(format!("twitter response: {}", e)))?;

        Ok(parsed.data.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_media_upload() {
        let platform = TwitterPlatform::new(SecretString::from("token".to_string()));
        assert!(platform.requires_media_upload());
        assert_eq!(platform.name(), "twitter");
        assert!(platform.is_configured());
    }

    #[test]
    fn test_tweet_request_serialization_without_media() {
        let body = TweetRequest {
            text: "$ABC: quiet day. stack?",
            media: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"text":"$ABC: quiet day. stack?"}"#);
    }

    #[test]
    fn test_tweet_request_serialization_with_media() {
        let body = TweetRequest {
            text: "caption",
            media: Some(TweetMedia {
                media_ids: vec!["123".to_string(), "456".to_string()],
            }),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(
            json,
            r#"{"text":"caption","media":{"media_ids":["123","456"]}}"#
        );
    }

    #[test]
    fn test_upload_response_parsing() {
        let parsed: MediaUploadResponse =
            serde_json::from_str(r#"{"media_id":710511363345354753,"media_id_string":"710511363345354753"}"#)
                .unwrap();
        assert_eq!(parsed.media_id_string, "710511363345354753");
    }

    #[test]
    fn test_tweet_response_parsing() {
        let parsed: TweetResponse =
            serde_json::from_str(r#"{"data":{"id":"1460323737035677698","text":"hi"}}"#).unwrap();
        assert_eq!(parsed.data.id, "1460323737035677698");
    }
}
