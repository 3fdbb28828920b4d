//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::domain::ArticleKind;
use quill_core::ports::{
    AdminDirectory, AnalyticsRepository, ArticleRepository, Cache, CategoryRepository,
    ChangeFeed, CommentRepository, LlmProvider, RateLimitQuota, RateLimiter, SettingsRepository,
    TokenVerifier,
};
use quill_core::services::{
    AnalyticsService, AssistantService, AuthGate, CategoryService, ContentService,
    ModerationService, SettingsService,
};
use quill_infra::{
    CachedAdminDirectory, FixedWindowRateLimiter, InMemoryAdminDirectory,
    InMemoryAnalyticsRepository, InMemoryArticleRepository, InMemoryCache,
    InMemoryCategoryRepository, InMemoryChangeFeed, InMemoryCommentRepository,
    InMemorySettingsRepository, OpenAIConfig, OpenAIProvider, RecaptchaVerifier,
};

use crate::config::AppConfig;
use crate::middleware::error::AppError;

/// Repositories behind the services, one set per storage backend.
pub struct Storage {
    pub posts: Arc<dyn ArticleRepository>,
    pub tutorials: Arc<dyn ArticleRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub admins: Arc<dyn AdminDirectory>,
    pub analytics: Arc<dyn AnalyticsRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub backend: &'static str,
}

impl Storage {
    pub fn in_memory() -> Self {
        Self {
            posts: Arc::new(InMemoryArticleRepository::new(ArticleKind::Post)),
            tutorials: Arc::new(InMemoryArticleRepository::new(ArticleKind::Tutorial)),
            categories: Arc::new(InMemoryCategoryRepository::new()),
            comments: Arc::new(InMemoryCommentRepository::new()),
            admins: Arc::new(InMemoryAdminDirectory::new()),
            analytics: Arc::new(InMemoryAnalyticsRepository::new()),
            settings: Arc::new(InMemorySettingsRepository::new()),
            backend: "memory",
        }
    }

    #[cfg(feature = "postgres")]
    pub fn postgres(db: quill_infra::database::DatabaseConnection) -> Self {
        use quill_infra::database::{
            PostgresAdminDirectory, PostgresAnalyticsRepository, PostgresCategoryRepository,
            PostgresCommentRepository, PostgresPostRepository, PostgresSettingsRepository,
            PostgresTutorialRepository,
        };

        Self {
            posts: Arc::new(PostgresPostRepository::new(db.clone())),
            tutorials: Arc::new(PostgresTutorialRepository::new(db.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(db.clone())),
            comments: Arc::new(PostgresCommentRepository::new(db.clone())),
            admins: Arc::new(PostgresAdminDirectory::new(db.clone())),
            analytics: Arc::new(PostgresAnalyticsRepository::new(db.clone())),
            settings: Arc::new(PostgresSettingsRepository::new(db)),
            backend: "postgres",
        }
    }
}

/// Non-storage collaborators: identity, cache, feed, limiters and external services.
pub struct Backends {
    pub verifier: Arc<dyn TokenVerifier>,
    pub cache: Arc<dyn Cache>,
    pub feed: Arc<dyn ChangeFeed>,
    pub ai_limiter: Arc<dyn RateLimiter>,
    pub public_limiter: Arc<dyn RateLimiter>,
    pub llm: Option<Arc<dyn LlmProvider>>,
    pub recaptcha: RecaptchaVerifier,
}

impl Backends {
    /// Process-local backends. No LLM and no reCAPTCHA secret.
    pub fn local(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            verifier,
            cache: Arc::new(InMemoryCache::new()),
            feed: Arc::new(InMemoryChangeFeed::default()),
            ai_limiter: Arc::new(FixedWindowRateLimiter::new()),
            public_limiter: Arc::new(FixedWindowRateLimiter::new()),
            llm: None,
            recaptcha: RecaptchaVerifier::new(None),
        }
    }
}

/// Quotas applied by the HTTP layer.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub ai: RateLimitQuota,
    pub public: RateLimitQuota,
    pub trust_proxy_headers: bool,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentService>,
    pub categories: Arc<CategoryService>,
    pub moderation: Arc<ModerationService>,
    pub analytics: Arc<AnalyticsService>,
    pub settings: Arc<SettingsService>,
    pub assistant: Option<Arc<AssistantService>>,
    pub gate: Arc<AuthGate>,
    pub feed: Arc<dyn ChangeFeed>,
    pub ai_limiter: Arc<dyn RateLimiter>,
    pub public_limiter: Arc<dyn RateLimiter>,
    pub recaptcha: Arc<RecaptchaVerifier>,
    pub limits: Limits,
    pub storage: &'static str,
}

impl AppState {
    /// Build the application state with the implementations the environment allows.
    pub async fn new(config: &AppConfig) -> Self {
        let storage = open_storage(config).await;

        let mut backends = Backends::local(token_verifier());
        backends.llm = OpenAIConfig::from_env()
            .map(|c| Arc::new(OpenAIProvider::new(c)) as Arc<dyn LlmProvider>);
        if backends.llm.is_none() {
            tracing::warn!("OPENAI_API_KEY not set. AI endpoints will fail.");
        }
        backends.recaptcha = RecaptchaVerifier::from_env();
        if !backends.recaptcha.is_enabled() {
            tracing::warn!("RECAPTCHA_SECRET_KEY not set. reCAPTCHA checks are skipped.");
        }
        #[cfg(feature = "rate-limit")]
        {
            backends.public_limiter = Arc::new(quill_infra::GcraRateLimiter::new());
        }
        #[cfg(feature = "redis")]
        {
            if config.redis_enabled {
                use_redis(&mut backends).await;
            }
        }

        Self::assemble(config, storage, backends).await
    }

    /// Wire services over the given storage and backends, then grant bootstrap admins.
    pub async fn assemble(config: &AppConfig, storage: Storage, backends: Backends) -> Self {
        let feed = backends.feed;
        let admins: Arc<dyn AdminDirectory> = Arc::new(CachedAdminDirectory::new(
            storage.admins,
            backends.cache,
            config.admin_cache_ttl,
        ));

        for user_id in &config.bootstrap_admin_ids {
            match admins.grant(user_id).await {
                Ok(()) => tracing::info!(user_id = %user_id, "Bootstrap admin granted"),
                Err(e) => tracing::error!(user_id = %user_id, error = %e, "Failed to grant bootstrap admin"),
            }
        }

        let content = ContentService::new(
            storage.posts.clone(),
            storage.tutorials.clone(),
            storage.categories.clone(),
            storage.comments.clone(),
            feed.clone(),
        );
        let categories = CategoryService::new(
            storage.categories.clone(),
            storage.posts.clone(),
            storage.tutorials.clone(),
            feed.clone(),
        );
        let moderation = ModerationService::new(
            storage.posts.clone(),
            storage.tutorials.clone(),
            storage.comments,
            feed.clone(),
        );
        let analytics = AnalyticsService::new(
            storage.analytics,
            storage.posts,
            storage.tutorials,
            storage.categories,
        );

        tracing::info!(storage = storage.backend, "Application state initialized");

        Self {
            content: Arc::new(content),
            categories: Arc::new(categories),
            moderation: Arc::new(moderation),
            analytics: Arc::new(analytics),
            settings: Arc::new(SettingsService::new(storage.settings, feed.clone())),
            assistant: backends.llm.map(|llm| Arc::new(AssistantService::new(llm))),
            gate: Arc::new(AuthGate::new(backends.verifier, admins)),
            feed,
            ai_limiter: backends.ai_limiter,
            public_limiter: backends.public_limiter,
            recaptcha: Arc::new(backends.recaptcha),
            limits: Limits {
                ai: config.ai_rate_limit,
                public: config.public_rate_limit,
                trust_proxy_headers: config.trust_proxy_headers,
            },
            storage: storage.backend,
        }
    }

    pub fn assistant(&self) -> Result<&AssistantService, AppError> {
        self.assistant
            .as_deref()
            .ok_or_else(|| AppError::Internal("AI assistant is not configured".to_string()))
    }
}

#[cfg(feature = "postgres")]
async fn open_storage(config: &AppConfig) -> Storage {
    let Some(db_config) = &config.database else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return Storage::in_memory();
    };

    match quill_infra::database::connect(db_config).await {
        Ok(db) => Storage::postgres(db),
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database. Using in-memory fallback.");
            Storage::in_memory()
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn open_storage(_config: &AppConfig) -> Storage {
    tracing::info!("Running without postgres feature - using in-memory repositories");
    Storage::in_memory()
}

/// Swap cache, change feed and the AI limiter for their Redis versions.
///
/// Each one falls back to its in-memory counterpart when Redis is unreachable.
#[cfg(feature = "redis")]
async fn use_redis(backends: &mut Backends) {
    use quill_infra::{RedisCache, RedisChangeFeed, RedisRateLimiter};

    match RedisCache::from_env().await {
        Ok(cache) => backends.cache = Arc::new(cache),
        Err(e) => tracing::error!(error = %e, "Redis cache unavailable, using in-memory cache"),
    }
    match RedisChangeFeed::from_env().await {
        Ok(feed) => backends.feed = Arc::new(feed),
        Err(e) => tracing::error!(error = %e, "Redis change feed unavailable, using in-memory feed"),
    }
    match RedisRateLimiter::from_env().await {
        Ok(limiter) => backends.ai_limiter = Arc::new(limiter),
        Err(e) => tracing::error!(error = %e, "Redis rate limiter unavailable, limits are per instance"),
    }
}

#[cfg(feature = "auth")]
fn token_verifier() -> Arc<dyn TokenVerifier> {
    match quill_infra::JwtTokenVerifier::from_env() {
        Ok(verifier) => Arc::new(verifier),
        Err(e) => {
            tracing::error!(error = %e, "JWT verifier misconfigured. Every token will be rejected.");
            Arc::new(RejectAll)
        }
    }
}

#[cfg(not(feature = "auth"))]
fn token_verifier() -> Arc<dyn TokenVerifier> {
    tracing::warn!("Running without auth feature - every bearer token is rejected");
    Arc::new(RejectAll)
}

/// Verifier used when no usable key material exists.
struct RejectAll;

impl TokenVerifier for RejectAll {
    fn verify(&self, _token: &str) -> Result<quill_core::ports::TokenClaims, quill_core::ports::AuthError> {
        Err(quill_core::ports::AuthError::InvalidToken(
            "Token verification is not configured".to_string(),
        ))
    }
}
