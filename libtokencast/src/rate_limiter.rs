//! Fixed-window rate limiting for platform posting
//!
//! Admission control over posts per platform. Counting is fixed-window with
//! reset-on-expiry: the window starts at the first admitted post and the
//! counter hard-resets once the window elapses. Platform quotas are coarse
//! (hundreds of posts over hours), so burst precision at window edges is not
//! a requirement.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::registry::PlatformRegistry;

/// Per-platform window counter. Owned exclusively by the limiter.
#[derive(Debug, Clone, Copy)]
struct RateWindowState {
    window_start: i64,
    count: u32,
}

/// Per-process, in-memory rate limiter.
///
/// Admission consumes one unit of quota immediately; a later delivery
/// failure does not roll the unit back. Callers that need to re-post after
/// a failed delivery pay for the retry like any other post.
pub struct RateLimiter {
    registry: Arc<PlatformRegistry>,
    windows: Mutex<HashMap<String, RateWindowState>>,
}

impl RateLimiter {
    pub fn new(registry: Arc<PlatformRegistry>) -> Self {
        Self {
            registry,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Check whether a post to `platform` is admitted at `now` (Unix
    /// seconds) and record it if so.
    ///
    /// Platforms without a registered rule are admitted unconditionally.
    /// The check and the increment happen under one lock so concurrent
    /// dispatches to the same platform cannot interleave and overrun the
    /// quota.
    pub fn try_admit(&self, platform: &str, now: i64) -> bool {
        let Some(rule) = self.registry.rule(platform) else {
            return true;
        };
        let window_secs = i64::from(rule.rate_limit.window_minutes) * 60;

        let mut windows = self.windows.lock().unwrap();
        match windows.get_mut(platform) {
            None => {
                windows.insert(
                    platform.to_string(),
                    RateWindowState {
                        window_start: now,
                        count: 1,
                    },
                );
                true
            }
            Some(state) if now - state.window_start >= window_secs => {
                *state = RateWindowState {
                    window_start: now,
                    count: 1,
                };
                true
            }
            Some(state) if state.count < rule.rate_limit.quota => {
                state.count += 1;
                true
            }
            Some(_) => false,
        }
    }

    /// Units of quota left in the current window, without consuming any.
    /// `None` when the platform has no registered rule.
    pub fn remaining(&self, platform: &str, now: i64) -> Option<u32> {
        let rule = self.registry.rule(platform)?;
        let window_secs = i64::from(rule.rate_limit.window_minutes) * 60;

        let windows = self.windows.lock().unwrap();
        let used = match windows.get(platform) {
            Some(state) if now - state.window_start < window_secs => state.count,
            _ => 0,
        };
        Some(rule.rate_limit.quota.saturating_sub(used))
    }
}
