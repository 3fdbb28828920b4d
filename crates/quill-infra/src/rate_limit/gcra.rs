//! Keyed GCRA limiter backed by governor.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};
use governor::middleware::StateInformationMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter as GovernorRateLimiter};

use quill_core::ports::{RateLimitError, RateLimitQuota, RateLimitResult, RateLimiter};

type KeyedLimiter = GovernorRateLimiter<
    String,
    DefaultKeyedStateStore<String>,
    DefaultClock,
    StateInformationMiddleware,
>;

/// GCRA rate limiter, one governor instance per distinct quota.
///
/// Requests are spread evenly over the window with a burst of `max_requests`,
/// so a client that waits regains capacity gradually rather than all at once.
/// Limits are per-process.
#[derive(Default)]
pub struct GcraRateLimiter {
    limiters: Mutex<HashMap<RateLimitQuota, Arc<KeyedLimiter>>>,
    clock: DefaultClock,
}

impl GcraRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn limiter_for(&self, quota: RateLimitQuota) -> Result<Arc<KeyedLimiter>, RateLimitError> {
        let mut limiters = self
            .limiters
            .lock()
            .map_err(|_| RateLimitError::Backend("limiter registry poisoned".into()))?;

        if let Some(limiter) = limiters.get(&quota) {
            return Ok(limiter.clone());
        }

        let burst = NonZeroU32::new(quota.max_requests)
            .ok_or_else(|| RateLimitError::InvalidQuota("max_requests must be at least 1".into()))?;
        let governor_quota = Quota::with_period(quota.window / quota.max_requests)
            .ok_or_else(|| RateLimitError::InvalidQuota("window must be non-zero".into()))?
            .allow_burst(burst);

        let limiter = Arc::new(
            GovernorRateLimiter::keyed(governor_quota).with_middleware::<StateInformationMiddleware>(),
        );
        limiters.insert(quota, limiter.clone());
        Ok(limiter)
    }
}

#[async_trait]
impl RateLimiter for GcraRateLimiter {
    async fn check(&self, key: &str, quota: RateLimitQuota) -> Result<RateLimitResult, RateLimitError> {
        let limiter = self.limiter_for(quota)?;

        match limiter.check_key(&key.to_string()) {
            Ok(snapshot) => Ok(RateLimitResult {
                allowed: true,
                limit: quota.max_requests,
                remaining: snapshot.remaining_burst_capacity(),
                reset_after: quota.window,
            }),
            Err(not_until) => Ok(RateLimitResult {
                allowed: false,
                limit: quota.max_requests,
                remaining: 0,
                reset_after: not_until.wait_time_from(self.clock.now()),
            }),
        }
    }

    async fn purge_expired(&self) -> usize {
        let Ok(limiters) = self.limiters.lock() else {
            return 0;
        };

        limiters
            .values()
            .map(|limiter| {
                let before = limiter.len();
                limiter.retain_recent();
                before.saturating_sub(limiter.len())
            })
            .sum()
    }
}
