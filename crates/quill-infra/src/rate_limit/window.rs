//! Per-key fixed-window counter kept in process memory.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Mutex;

use quill_core::ports::{RateLimitError, RateLimitQuota, RateLimitResult, RateLimiter};

#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window rate limiter.
///
/// State is per-process and lost on restart. Expired keys linger until
/// [`RateLimiter::purge_expired`] runs; a stale record is replaced on the
/// next check anyway.
#[derive(Default)]
pub struct FixedWindowRateLimiter {
    windows: Mutex<HashMap<String, WindowRecord>>,
}

impl FixedWindowRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently tracked, expired or not.
    pub async fn len(&self) -> usize {
        self.windows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn check_at(
        &self,
        key: &str,
        quota: RateLimitQuota,
        now: Instant,
    ) -> Result<RateLimitResult, RateLimitError> {
        if quota.max_requests == 0 {
            return Err(RateLimitError::InvalidQuota("max_requests must be at least 1".into()));
        }
        if quota.window.is_zero() {
            return Err(RateLimitError::InvalidQuota("window must be non-zero".into()));
        }

        let mut windows = self.windows.lock().await;
        let result = match windows.get_mut(key) {
            Some(record) if now <= record.reset_at => {
                if record.count >= quota.max_requests {
                    RateLimitResult {
                        allowed: false,
                        limit: quota.max_requests,
                        remaining: 0,
                        reset_after: record.reset_at.saturating_duration_since(now),
                    }
                } else {
                    record.count += 1;
                    RateLimitResult {
                        allowed: true,
                        limit: quota.max_requests,
                        remaining: quota.max_requests - record.count,
                        reset_after: record.reset_at.saturating_duration_since(now),
                    }
                }
            }
            _ => {
                windows.insert(
                    key.to_string(),
                    WindowRecord {
                        count: 1,
                        reset_at: now + quota.window,
                    },
                );
                RateLimitResult {
                    allowed: true,
                    limit: quota.max_requests,
                    remaining: quota.max_requests - 1,
                    reset_after: quota.window,
                }
            }
        };

        if !result.allowed {
            tracing::debug!(key = %key, reset_after_ms = result.reset_after.as_millis() as u64, "Rate limit exceeded");
        }
        Ok(result)
    }

    async fn purge_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, record| now <= record.reset_at);
        before - windows.len()
    }
}

#[async_trait]
impl RateLimiter for FixedWindowRateLimiter {
    async fn check(&self, key: &str, quota: RateLimitQuota) -> Result<RateLimitResult, RateLimitError> {
        self.check_at(key, quota, Instant::now()).await
    }

    async fn purge_expired(&self) -> usize {
        let removed = self.purge_at(Instant::now()).await;
        if removed > 0 {
            tracing::debug!(removed, "Purged expired rate limit windows");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn quota(max: u32) -> RateLimitQuota {
        RateLimitQuota::new(max, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn allows_up_to_max_then_denies() {
        let limiter = FixedWindowRateLimiter::new();
        let now = Instant::now();

        for expected_remaining in (0..3).rev() {
            let res = limiter.check_at("ai:user-1", quota(3), now).await.unwrap();
            assert!(res.allowed);
            assert_eq!(res.remaining, expected_remaining);
            assert_eq!(res.limit, 3);
        }

        let res = limiter
            .check_at("ai:user-1", quota(3), now + Duration::from_secs(10))
            .await
            .unwrap();
        assert!(!res.allowed);
        assert_eq!(res.remaining, 0);
        assert_eq!(res.reset_after, Duration::from_secs(50));
    }

    #[tokio::test]
    async fn window_rolls_over_after_expiry() {
        let limiter = FixedWindowRateLimiter::new();
        let now = Instant::now();

        limiter.check_at("k", quota(1), now).await.unwrap();
        assert!(!limiter.check_at("k", quota(1), now).await.unwrap().allowed);

        let later = now + Duration::from_secs(61);
        let res = limiter.check_at("k", quota(1), later).await.unwrap();
        assert!(res.allowed);
        assert_eq!(res.remaining, 0);
        assert_eq!(res.reset_after, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = FixedWindowRateLimiter::new();
        let now = Instant::now();

        limiter.check_at("a", quota(1), now).await.unwrap();
        assert!(limiter.check_at("b", quota(1), now).await.unwrap().allowed);
        assert!(!limiter.check_at("a", quota(1), now).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn purge_drops_only_expired_windows() {
        let limiter = FixedWindowRateLimiter::new();
        let now = Instant::now();

        limiter
            .check_at("short", RateLimitQuota::new(5, Duration::from_secs(1)), now)
            .await
            .unwrap();
        limiter.check_at("long", quota(5), now).await.unwrap();

        assert_eq!(limiter.purge_at(now + Duration::from_secs(2)).await, 1);
        assert_eq!(limiter.len().await, 1);
    }

    #[tokio::test]
    async fn rejects_empty_quota() {
        let limiter = FixedWindowRateLimiter::new();
        let result = limiter.check("k", RateLimitQuota::new(0, Duration::from_secs(1))).await;
        assert!(matches!(result, Err(RateLimitError::InvalidQuota(_))));
    }
}
