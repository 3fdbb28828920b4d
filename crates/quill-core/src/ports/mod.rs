//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod cache;
mod feed;
mod llm;
mod rate_limit;
mod repository;

pub use auth::{AdminDirectory, AuthError, TokenClaims, TokenVerifier};
pub use cache::{Cache, CacheError};
pub use feed::{ChangeFeed, ChangeStream, FeedError};
pub use llm::{ChatMessage, ChatRole, Completion, CompletionRequest, LlmError, LlmProvider, TokenUsage};
pub use rate_limit::{RateLimitError, RateLimitQuota, RateLimitResult, RateLimiter};
pub use repository::{
    AnalyticsRepository, ArticleRepository, BaseRepository, CategoryRepository, CommentRepository,
    SettingsRepository,
};
