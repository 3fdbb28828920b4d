//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`:
//! storage, caching, rate limiting, change feeds and external services.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external backends, in-memory only
//! - `postgres` - PostgreSQL repositories via SeaORM
//! - `auth` - JWT verification of identity-provider tokens
//! - `rate-limit` - GCRA limiter via governor
//! - `redis` - Redis support for cache, change feed and rate limiting

pub mod cache;
pub mod database;
pub mod feed;
pub mod llm;
pub mod rate_limit;
pub mod recaptcha;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use cache::{CachedAdminDirectory, InMemoryCache};
pub use database::{
    DatabaseConfig, InMemoryAdminDirectory, InMemoryAnalyticsRepository,
    InMemoryArticleRepository, InMemoryCategoryRepository, InMemoryCommentRepository,
    InMemorySettingsRepository,
};
pub use feed::InMemoryChangeFeed;
pub use rate_limit::FixedWindowRateLimiter;

// Re-exports - External services
pub use llm::{OpenAIConfig, OpenAIProvider};
pub use recaptcha::{RecaptchaError, RecaptchaOutcome, RecaptchaVerifier, RejectReason};

#[cfg(feature = "auth")]
pub use auth::{JwtConfig, JwtKey, JwtTokenVerifier};

#[cfg(feature = "rate-limit")]
pub use rate_limit::GcraRateLimiter;

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
#[cfg(feature = "redis")]
pub use feed::RedisChangeFeed;
#[cfg(feature = "redis")]
pub use rate_limit::RedisRateLimiter;
