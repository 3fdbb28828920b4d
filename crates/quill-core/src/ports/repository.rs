use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    AnalyticsEvent, Article, ArticleKind, ArticleQuery, Category, Comment, CommentQuery,
    EventQuery, NewComment, SiteSettings, UserActivity,
};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Posts or tutorials, one repository per collection.
///
/// `save` never writes the `views` and `likes` counters of an existing row;
/// those only move through the increment methods.
#[async_trait]
pub trait ArticleRepository: BaseRepository<Article, Uuid> {
    fn kind(&self) -> ArticleKind;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>, RepoError>;

    async fn list(&self, query: &ArticleQuery) -> Result<Vec<Article>, RepoError>;

    /// Atomically add one view. `RepoError::NotFound` when the id is unknown.
    async fn increment_views(&self, id: Uuid) -> Result<(), RepoError>;

    /// Atomically add one like. `RepoError::NotFound` when the id is unknown.
    async fn increment_likes(&self, id: Uuid) -> Result<(), RepoError>;

    /// Number of articles per category slug.
    async fn count_by_category(&self) -> Result<HashMap<String, u64>, RepoError>;

    async fn count_in_category(&self, slug: &str) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    /// All categories ordered by name.
    async fn list(&self) -> Result<Vec<Category>, RepoError>;

    async fn set_post_count(&self, id: Uuid, count: i64) -> Result<(), RepoError>;
}

/// Comment storage. There is no generic save: the only way in is
/// [`CommentRepository::insert`], which stores the comment unapproved.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert(&self, comment: NewComment) -> Result<Comment, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError>;

    async fn list(&self, query: &CommentQuery) -> Result<Vec<Comment>, RepoError>;

    /// Set `approved = true`. `RepoError::NotFound` when the id is unknown.
    async fn approve(&self, id: Uuid) -> Result<Comment, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    /// Remove every comment attached to an article. Returns the number removed.
    async fn delete_for_post(&self, post_id: Uuid) -> Result<u64, RepoError>;

    async fn increment_likes(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn record_event(&self, event: AnalyticsEvent) -> Result<(), RepoError>;

    async fn events(&self, query: &EventQuery) -> Result<Vec<AnalyticsEvent>, RepoError>;

    async fn find_activity(&self, user_id: &str) -> Result<Option<UserActivity>, RepoError>;

    async fn save_activity(&self, activity: UserActivity) -> Result<UserActivity, RepoError>;

    /// Most recently active users first.
    async fn list_activity(&self, limit: u64) -> Result<Vec<UserActivity>, RepoError>;
}

/// The single site settings document.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn load(&self) -> Result<Option<SiteSettings>, RepoError>;

    async fn store(&self, settings: SiteSettings) -> Result<SiteSettings, RepoError>;
}
