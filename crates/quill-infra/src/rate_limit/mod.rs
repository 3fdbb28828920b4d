//! Rate limiting implementations.
//!
//! [`FixedWindowRateLimiter`] is always available and backs the AI endpoints
//! in single-instance deployments. The Redis limiter gives the same fixed-window
//! semantics across instances; the governor limiter throttles public writes.

mod window;

pub use window::FixedWindowRateLimiter;

#[cfg(feature = "rate-limit")]
mod gcra;
#[cfg(feature = "rate-limit")]
pub use gcra::GcraRateLimiter;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::RedisRateLimiter;
