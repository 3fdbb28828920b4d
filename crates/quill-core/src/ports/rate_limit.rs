//! Rate limiting port.

use async_trait::async_trait;
use std::time::Duration;

/// Allowance for one key: `max_requests` per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RateLimitQuota {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitQuota {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

/// Rate limiter trait - abstraction over rate limiting backends.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count a request against `key` and report whether it is allowed.
    async fn check(&self, key: &str, quota: RateLimitQuota) -> Result<RateLimitResult, RateLimitError>;

    /// Drop state for keys whose window has ended. Returns how many were removed.
    ///
    /// Backends that expire keys on their own keep the default.
    async fn purge_expired(&self) -> usize {
        0
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

/// Rate limit errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid quota: {0}")]
    InvalidQuota(String),
}
