//! Message dispatch across platforms
//!
//! The dispatcher owns delivery policy: platform rule lookup, hard length
//! truncation, rate-limit admission, media filtering and upload ordering,
//! and outcome classification. It never returns an error; every failure
//! mode becomes a [`PostOutcome`] the caller inspects. The core performs no
//! automatic retries; upstream callers decide what to do with `RateLimited`
//! or `PlatformThrottled` outcomes.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::platforms::{Platform, ResolvedMedia};
use crate::rate_limiter::RateLimiter;
use crate::registry::PlatformRegistry;
use crate::types::{ErrorKind, GeneratedMessage, MediaItem, PostOutcome};

pub struct Dispatcher {
    registry: Arc<PlatformRegistry>,
    limiter: RateLimiter,
    platforms: HashMap<String, Arc<dyn Platform>>,
}

impl Dispatcher {
    pub fn new(registry: Arc<PlatformRegistry>, platforms: Vec<Arc<dyn Platform>>) -> Self {
        let limiter = RateLimiter::new(registry.clone());
        let platforms = platforms
            .into_iter()
            .map(|p| (p.name().to_string(), p))
            .collect();

        Self {
            registry,
            limiter,
            platforms,
        }
    }

    /// Post one message to one platform at the current wall-clock time.
    pub async fn post(
        &self,
        message: &GeneratedMessage,
        platform: &str,
        media: &[MediaItem],
    ) -> PostOutcome {
        self.post_at(message, platform, media, chrono::Utc::now().timestamp())
            .await
    }

    /// Post one message to one platform, with an explicit timestamp for the
    /// rate-limit window.
    ///
    /// Step order is load-bearing: unknown platforms and rate-limit denials
    /// are decided before any adapter traffic, and media uploads complete
    /// before the post call so a partially-uploaded set is never referenced.
    /// Admission consumes quota even if the adapter later fails; the unit is
    /// not refunded.
    pub async fn post_at(
        &self,
        message: &GeneratedMessage,
        platform: &str,
        media: &[MediaItem],
        now: i64,
    ) -> PostOutcome {
        let Some(rule) = self.registry.rule(platform) else {
            warn!(platform, "unsupported platform");
            return PostOutcome::failed(platform, ErrorKind::UnsupportedPlatform);
        };
        let Some(adapter) = self.platforms.get(platform) else {
            warn!(platform, "no adapter registered");
            return PostOutcome::failed(platform, ErrorKind::UnsupportedPlatform);
        };

        // Hard cut at the platform limit; truncation is lossy and accepted
        let text = truncate_chars(&message.text, rule.max_post_length);

        if !self.limiter.try_admit(platform, now) {
            info!(platform, "rate limit window full, denying post");
            return PostOutcome::failed(platform, ErrorKind::RateLimited);
        }

        let accepted: Vec<&MediaItem> = media
            .iter()
            .filter(|m| rule.allowed_media.contains(&m.kind))
            .collect();
        if accepted.len() < media.len() {
            debug!(
                platform,
                dropped = media.len() - accepted.len(),
                "dropped media of disallowed kinds"
            );
        }

        let mut resolved = Vec::with_capacity(accepted.len());
        if adapter.requires_media_upload() {
            for item in accepted.iter().copied() {
                match adapter.upload_media(item).await {
                    Ok(media_id) => {
                        resolved.push(ResolvedMedia::uploaded(item.clone(), media_id));
                    }
                    Err(e) => {
                        warn!(platform, url = %item.url, "media upload failed: {}", e);
                        return PostOutcome::failed(platform, ErrorKind::MediaUploadFailed);
                    }
                }
            }
        } else {
            resolved.extend(accepted.iter().map(|i| ResolvedMedia::by_url((*i).clone())));
        }

        match adapter.post(&text, &resolved).await {
            Ok(post_id) => {
                info!(platform, post_id = %post_id, "posted");
                PostOutcome::delivered(platform, (!post_id.is_empty()).then_some(post_id))
            }
            Err(e) => {
                warn!(platform, "post failed: {}", e);
                PostOutcome::failed(platform, classify(&e))
            }
        }
    }

    /// Post one message to several platforms concurrently.
    ///
    /// Per-platform admission stays correct under this concurrency because
    /// the limiter's check-and-increment is a single critical section.
    pub async fn dispatch_all(
        &self,
        message: &GeneratedMessage,
        platforms: &[String],
        media: &[MediaItem],
    ) -> Vec<PostOutcome> {
        let now = chrono::Utc::now().timestamp();
        let futures: Vec<_> = platforms
            .iter()
            .map(|platform| self.post_at(message, platform, media, now))
            .collect();

        join_all(futures).await
    }

    /// Units of quota left for a platform at `now`.
    pub fn remaining_quota(&self, platform: &str, now: i64) -> Option<u32> {
        self.limiter.remaining(platform, now)
    }
}

fn classify(error: &crate::error::TokencastError) -> ErrorKind {
    match error {
        crate::error::TokencastError::Platform(platform_error) => ErrorKind::from(platform_error),
        _ => ErrorKind::DeliveryFailed,
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformError;
    use crate::platforms::mock::MockPlatform;
    use crate::registry::{PlatformRule, RateQuota};
    use crate::types::MediaKind;

    fn test_registry() -> Arc<PlatformRegistry> {
        Arc::new(
            PlatformRegistry::from_rules(vec![
                PlatformRule {
                    platform: "telegram".to_string(),
                    max_post_length: 4096,
                    allowed_media: vec![MediaKind::Image, MediaKind::Video],
                    rate_limit: RateQuota {
                        quota: 2,
                        window_minutes: 60,
                    },
                },
                PlatformRule {
                    platform: "twitter".to_string(),
                    max_post_length: 20,
                    allowed_media: vec![MediaKind::Image],
                    rate_limit: RateQuota {
                        quota: 300,
                        window_minutes: 180,
                    },
                },
            ])
            .unwrap(),
        )
    }

    fn message(text: &str) -> GeneratedMessage {
        GeneratedMessage::model(text)
    }

    fn image(url: &str) -> MediaItem {
        MediaItem {
            url: url.to_string(),
            kind: MediaKind::Image,
        }
    }

    #[tokio::test]
    async fn test_post_success() {
        let platform = Arc::new(MockPlatform::success("telegram"));
        let dispatcher = Dispatcher::new(test_registry(), vec![platform.clone()]);

        let outcome = dispatcher.post(&message("hello"), "telegram", &[]).await;

        assert!(outcome.success);
        assert_eq!(outcome.error, None);
        assert!(outcome.platform_post_id.is_some());
        assert_eq!(platform.post_call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_platform_no_quota_no_adapter_call() {
        let platform = Arc::new(MockPlatform::success("telegram"));
        let dispatcher = Dispatcher::new(test_registry(), vec![platform.clone()]);
        let now = 1_000_000;

        let outcome = dispatcher
            .post_at(&message("hello"), "unsupported-platform", &[], now)
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.error, Some(ErrorKind::UnsupportedPlatform));
        assert_eq!(platform.post_call_count(), 0);
        // telegram quota untouched
        assert_eq!(dispatcher.remaining_quota("telegram", now), Some(2));
    }

    #[tokio::test]
    async fn test_registered_rule_without_adapter_is_unsupported() {
        let dispatcher = Dispatcher::new(test_registry(), vec![]);

        let outcome = dispatcher.post(&message("hello"), "telegram", &[]).await;

        assert!(!outcome.success);
        assert_eq!(outcome.error, Some(ErrorKind::UnsupportedPlatform));
    }

    #[tokio::test]
    async fn test_truncates_to_max_length_before_delivery() {
        let platform = Arc::new(MockPlatform::success("twitter"));
        let dispatcher = Dispatcher::new(test_registry(), vec![platform.clone()]);

        let long_text = "a".repeat(50);
        let outcome = dispatcher.post(&message(&long_text), "twitter", &[]).await;

        assert!(outcome.success);
        let posted = platform.posted_content();
        assert_eq!(posted[0].chars().count(), 20);
    }

    #[tokio::test]
    async fn test_truncation_counts_chars_not_bytes() {
        let platform = Arc::new(MockPlatform::success("twitter"));
        let dispatcher = Dispatcher::new(test_registry(), vec![platform.clone()]);

        // 25 two-byte chars; must cut at 20 chars without splitting one
        let text = "é".repeat(25);
        dispatcher.post(&message(&text), "twitter", &[]).await;

        let posted = platform.posted_content();
        assert_eq!(posted[0].chars().count(), 20);
        assert_eq!(posted[0], "é".repeat(20));
    }

    #[tokio::test]
    async fn test_rate_limit_scenario_two_then_denied() {
        let platform = Arc::new(MockPlatform::success("telegram"));
        let dispatcher = Dispatcher::new(test_registry(), vec![platform.clone()]);
        let now = 1_000_000;

        let first = dispatcher
            .post_at(&message("one"), "telegram", &[], now)
            .await;
        let second = dispatcher
            .post_at(&message("two"), "telegram", &[], now + 60)
            .await;
        let third = dispatcher
            .post_at(&message("three"), "telegram", &[], now + 120)
            .await;

        assert!(first.success);
        assert!(second.success);
        assert!(!third.success);
        assert_eq!(third.error, Some(ErrorKind::RateLimited));
        // first two reached the adapter, the third was denied pre-adapter
        assert_eq!(platform.post_call_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_delivery_still_consumes_quota() {
        let platform = Arc::new(MockPlatform::post_failure(
            "telegram",
            PlatformError::Delivery("boom".to_string()),
        ));
        let dispatcher = Dispatcher::new(test_registry(), vec![platform.clone()]);
        let now = 1_000_000;

        let outcome = dispatcher
            .post_at(&message("one"), "telegram", &[], now)
            .await;
        assert!(!outcome.success);

        // The admission was spent despite the failure.
        assert_eq!(dispatcher.remaining_quota("telegram", now), Some(1));
    }

    #[tokio::test]
    async fn test_adapter_error_classification() {
        let cases = [
            (
                PlatformError::Authentication("401".to_string()),
                ErrorKind::AuthFailed,
            ),
            (
                PlatformError::Throttled("429".to_string()),
                ErrorKind::PlatformThrottled,
            ),
            (
                PlatformError::Delivery("reset".to_string()),
                ErrorKind::DeliveryFailed,
            ),
        ];

        for (error, expected) in cases {
            let platform = Arc::new(MockPlatform::post_failure("telegram", error));
            let dispatcher = Dispatcher::new(test_registry(), vec![platform]);

            let outcome = dispatcher.post(&message("hello"), "telegram", &[]).await;
            assert!(!outcome.success);
            assert_eq!(outcome.error, Some(expected));
        }
    }

    #[tokio::test]
    async fn test_disallowed_media_kinds_are_dropped() {
        let platform = Arc::new(MockPlatform::success("telegram"));
        let dispatcher = Dispatcher::new(test_registry(), vec![platform.clone()]);

        let media = vec![
            image("https://cdn.example/a.png"),
            MediaItem {
                url: "https://cdn.example/b.gif".to_string(),
                kind: MediaKind::Gif,
            },
        ];
        let outcome = dispatcher.post(&message("hello"), "telegram", &media).await;

        assert!(outcome.success);
        let recorded = platform.posted_media();
        // the gif is not in telegram's allowed kinds here
        assert_eq!(recorded[0].len(), 1);
        assert_eq!(recorded[0][0].item.url, "https://cdn.example/a.png");
        assert_eq!(recorded[0][0].media_id, None);
    }

    #[tokio::test]
    async fn test_upload_first_platform_attaches_media_ids() {
        let registry = test_registry();
        let platform = Arc::new(MockPlatform::with_media_upload("twitter"));
        let dispatcher = Dispatcher::new(registry, vec![platform.clone()]);

        let media = vec![image("https://cdn.example/chart.png")];
        let outcome = dispatcher.post(&message("hello"), "twitter", &media).await;

        assert!(outcome.success);
        assert_eq!(platform.upload_call_count(), 1);
        let recorded = platform.posted_media();
        assert!(recorded[0][0].media_id.is_some());
    }

    #[tokio::test]
    async fn test_upload_failure_fails_fast_without_post() {
        let platform = Arc::new(MockPlatform::upload_failure("twitter"));
        let dispatcher = Dispatcher::new(test_registry(), vec![platform.clone()]);

        let media = vec![image("https://cdn.example/chart.png")];
        let outcome = dispatcher.post(&message("hello"), "twitter", &media).await;

        assert!(!outcome.success);
        assert_eq!(outcome.error, Some(ErrorKind::MediaUploadFailed));
        assert_eq!(platform.post_call_count(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_all_isolates_failures() {
        let ok = Arc::new(MockPlatform::success("telegram"));
        let bad = Arc::new(MockPlatform::post_failure(
            "twitter",
            PlatformError::Delivery("down".to_string()),
        ));
        let dispatcher = Dispatcher::new(test_registry(), vec![ok.clone(), bad]);

        let outcomes = dispatcher
            .dispatch_all(
                &message("hello"),
                &["telegram".to_string(), "twitter".to_string()],
                &[],
            )
            .await;

        assert_eq!(outcomes.len(), 2);
        let by_platform: HashMap<&str, &PostOutcome> = outcomes
            .iter()
            .map(|o| (o.platform.as_str(), o))
            .collect();
        assert!(by_platform["telegram"].success);
        assert!(!by_platform["twitter"].success);
        assert_eq!(
            by_platform["twitter"].error,
            Some(ErrorKind::DeliveryFailed)
        );
    }

    #[test]
    fn test_truncate_chars_short_text_unchanged() {
        assert_eq!(truncate_chars("short", 280), "short");
        assert_eq!(truncate_chars("", 10), "");
    }
}
