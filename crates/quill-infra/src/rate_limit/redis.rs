//! Redis rate limiter: fixed-window counter shared across instances.

use std::time::Duration;

use async_trait::async_trait;
use redis::Script;
use redis::aio::ConnectionManager;

use quill_core::ports::{RateLimitError, RateLimitQuota, RateLimitResult, RateLimiter};

use crate::cache::RedisConfig;

// Returns {current_count, ttl_secs}. The first hit in a window sets the expiry.
const WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local window_secs = tonumber(ARGV[1])

local current = redis.call('INCR', key)
if current == 1 then
    redis.call('EXPIRE', key, window_secs)
end

local ttl = redis.call('TTL', key)
return {current, ttl}
"#;

/// Redis-backed rate limiter. Keys expire on their own, so there is nothing to purge.
pub struct RedisRateLimiter {
    conn: ConnectionManager,
    config: RedisConfig,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(config: RedisConfig) -> Result<Self, RateLimitError> {
        let (_, conn) = config.connect().await.map_err(RateLimitError::Backend)?;
        tracing::info!(url = %config.url, "Connected to Redis rate limiter");

        Ok(Self {
            conn,
            config,
            script: Script::new(WINDOW_SCRIPT),
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, RateLimitError> {
        Self::new(RedisConfig::from_env()).await
    }

    fn make_key(&self, key: &str) -> String {
        self.config.key(&format!("ratelimit:{key}"))
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: &str, quota: RateLimitQuota) -> Result<RateLimitResult, RateLimitError> {
        if quota.max_requests == 0 {
            return Err(RateLimitError::InvalidQuota("max_requests must be at least 1".into()));
        }
        let window_secs = quota.window.as_secs().max(1);

        let mut conn = self.conn.clone();
        let result: Vec<i64> = self
            .script
            .key(self.make_key(key))
            .arg(window_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        let current = result.first().copied().unwrap_or(1).max(0) as u64;
        let ttl_secs = result.get(1).copied().unwrap_or(window_secs as i64).max(1) as u64;

        let max = u64::from(quota.max_requests);
        let allowed = current <= max;

        Ok(RateLimitResult {
            allowed,
            limit: quota.max_requests,
            remaining: max.saturating_sub(current) as u32,
            reset_after: Duration::from_secs(ttl_secs),
        })
    }
}
