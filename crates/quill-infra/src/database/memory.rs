//! In-memory repositories.
//!
//! Used when no database is configured and by tests. Data lives for the life
//! of the process. Slug uniqueness is enforced the same way the database's
//! unique indexes do, with `RepoError::Constraint`.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{
    AnalyticsEvent, Article, ArticleKind, ArticleQuery, Category, Comment, CommentQuery,
    EventQuery, NewComment, SiteSettings, UserActivity,
};
use quill_core::error::RepoError;
use quill_core::ports::{
    AdminDirectory, AnalyticsRepository, ArticleRepository, BaseRepository, CategoryRepository,
    CommentRepository, SettingsRepository,
};

fn paginate<T>(items: Vec<T>, offset: Option<u64>, limit: Option<u64>) -> Vec<T> {
    let offset = offset.unwrap_or(0) as usize;
    let limit = limit.map_or(usize::MAX, |l| l as usize);
    items.into_iter().skip(offset).take(limit).collect()
}

/// One collection of posts or tutorials.
pub struct InMemoryArticleRepository {
    kind: ArticleKind,
    articles: RwLock<HashMap<Uuid, Article>>,
}

impl InMemoryArticleRepository {
    pub fn new(kind: ArticleKind) -> Self {
        Self {
            kind,
            articles: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl BaseRepository<Article, Uuid> for InMemoryArticleRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, RepoError> {
        Ok(self.articles.read().await.get(&id).cloned())
    }

    async fn save(&self, mut article: Article) -> Result<Article, RepoError> {
        let mut articles = self.articles.write().await;
        if articles
            .values()
            .any(|a| a.slug == article.slug && a.id != article.id)
        {
            return Err(RepoError::Constraint(format!("slug '{}' is taken", article.slug)));
        }
        if let Some(existing) = articles.get(&article.id) {
            article.views = existing.views;
            article.likes = existing.likes;
            article.created_at = existing.created_at;
        }
        article.kind = self.kind;
        articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.articles
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl ArticleRepository for InMemoryArticleRepository {
    fn kind(&self) -> ArticleKind {
        self.kind
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>, RepoError> {
        Ok(self
            .articles
            .read()
            .await
            .values()
            .find(|a| a.slug == slug)
            .cloned())
    }

    async fn list(&self, query: &ArticleQuery) -> Result<Vec<Article>, RepoError> {
        let mut matching: Vec<Article> = self
            .articles
            .read()
            .await
            .values()
            .filter(|a| query.matches(a))
            .cloned()
            .collect();
        // Published first by date, drafts last, then newest created.
        matching.sort_by_key(|a| (a.published_at.is_none(), Reverse(a.published_at), Reverse(a.created_at)));
        Ok(paginate(matching, query.offset, query.limit))
    }

    async fn increment_views(&self, id: Uuid) -> Result<(), RepoError> {
        let mut articles = self.articles.write().await;
        let article = articles.get_mut(&id).ok_or(RepoError::NotFound)?;
        article.views += 1;
        Ok(())
    }

    async fn increment_likes(&self, id: Uuid) -> Result<(), RepoError> {
        let mut articles = self.articles.write().await;
        let article = articles.get_mut(&id).ok_or(RepoError::NotFound)?;
        article.likes += 1;
        Ok(())
    }

    async fn count_by_category(&self) -> Result<HashMap<String, u64>, RepoError> {
        let mut counts = HashMap::new();
        for article in self.articles.read().await.values() {
            *counts.entry(article.category.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn count_in_category(&self, slug: &str) -> Result<u64, RepoError> {
        Ok(self
            .articles
            .read()
            .await
            .values()
            .filter(|a| a.category == slug)
            .count() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryCategoryRepository {
    categories: RwLock<HashMap<Uuid, Category>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Category, Uuid> for InMemoryCategoryRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self.categories.read().await.get(&id).cloned())
    }

    async fn save(&self, mut category: Category) -> Result<Category, RepoError> {
        let mut categories = self.categories.write().await;
        if categories
            .values()
            .any(|c| c.slug == category.slug && c.id != category.id)
        {
            return Err(RepoError::Constraint(format!("slug '{}' is taken", category.slug)));
        }
        if let Some(existing) = categories.get(&category.id) {
            category.post_count = existing.post_count;
            category.created_at = existing.created_at;
        }
        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.categories
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        Ok(self
            .categories
            .read()
            .await
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let mut all: Vec<Category> = self.categories.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn set_post_count(&self, id: Uuid, count: i64) -> Result<(), RepoError> {
        let mut categories = self.categories.write().await;
        let category = categories.get_mut(&id).ok_or(RepoError::NotFound)?;
        category.post_count = count;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCommentRepository {
    comments: RwLock<HashMap<Uuid, Comment>>,
}

impl InMemoryCommentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn insert(&self, new: NewComment) -> Result<Comment, RepoError> {
        let comment = Comment::pending(new, Utc::now());
        self.comments
            .write()
            .await
            .insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.comments.read().await.get(&id).cloned())
    }

    async fn list(&self, query: &CommentQuery) -> Result<Vec<Comment>, RepoError> {
        let mut matching: Vec<Comment> = self
            .comments
            .read()
            .await
            .values()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        matching.sort_by_key(|c| Reverse(c.created_at));
        Ok(paginate(matching, None, query.limit))
    }

    async fn approve(&self, id: Uuid) -> Result<Comment, RepoError> {
        let mut comments = self.comments.write().await;
        let comment = comments.get_mut(&id).ok_or(RepoError::NotFound)?;
        comment.approve(Utc::now());
        Ok(comment.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.comments
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn delete_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let mut comments = self.comments.write().await;
        let before = comments.len();
        comments.retain(|_, c| c.post_id != post_id);
        Ok((before - comments.len()) as u64)
    }

    async fn increment_likes(&self, id: Uuid) -> Result<(), RepoError> {
        let mut comments = self.comments.write().await;
        let comment = comments.get_mut(&id).ok_or(RepoError::NotFound)?;
        comment.likes += 1;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAdminDirectory {
    admins: RwLock<HashSet<String>>,
}

impl InMemoryAdminDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admins<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: RwLock::new(ids.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl AdminDirectory for InMemoryAdminDirectory {
    async fn is_admin(&self, user_id: &str) -> Result<bool, RepoError> {
        Ok(self.admins.read().await.contains(user_id))
    }

    async fn grant(&self, user_id: &str) -> Result<(), RepoError> {
        self.admins.write().await.insert(user_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAnalyticsRepository {
    events: RwLock<Vec<AnalyticsEvent>>,
    activity: RwLock<HashMap<String, UserActivity>>,
}

impl InMemoryAnalyticsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalyticsRepository for InMemoryAnalyticsRepository {
    async fn record_event(&self, event: AnalyticsEvent) -> Result<(), RepoError> {
        self.events.write().await.push(event);
        Ok(())
    }

    async fn events(&self, query: &EventQuery) -> Result<Vec<AnalyticsEvent>, RepoError> {
        let mut matching: Vec<AnalyticsEvent> = self
            .events
            .read()
            .await
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        matching.sort_by_key(|e| Reverse(e.timestamp));
        Ok(paginate(matching, None, query.limit))
    }

    async fn find_activity(&self, user_id: &str) -> Result<Option<UserActivity>, RepoError> {
        Ok(self.activity.read().await.get(user_id).cloned())
    }

    async fn save_activity(&self, activity: UserActivity) -> Result<UserActivity, RepoError> {
        self.activity
            .write()
            .await
            .insert(activity.user_id.clone(), activity.clone());
        Ok(activity)
    }

    async fn list_activity(&self, limit: u64) -> Result<Vec<UserActivity>, RepoError> {
        let mut all: Vec<UserActivity> = self.activity.read().await.values().cloned().collect();
        all.sort_by_key(|a| Reverse(a.last_active));
        Ok(paginate(all, None, Some(limit)))
    }
}

#[derive(Default)]
pub struct InMemorySettingsRepository {
    settings: RwLock<Option<SiteSettings>>,
}

impl InMemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn load(&self) -> Result<Option<SiteSettings>, RepoError> {
        Ok(self.settings.read().await.clone())
    }

    async fn store(&self, settings: SiteSettings) -> Result<SiteSettings, RepoError> {
        *self.settings.write().await = Some(settings.clone());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use quill_core::domain::{ArticleDraft, Author};

    fn article(slug: &str, published: bool) -> Article {
        Article::create(
            ArticleKind::Post,
            ArticleDraft {
                title: slug.to_uppercase(),
                slug: slug.into(),
                content: "body".into(),
                excerpt: "e".into(),
                category: "tech".into(),
                published,
                ..ArticleDraft::default()
            },
            Author {
                id: "u1".into(),
                name: "Ada".into(),
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn save_keeps_counters_of_existing_article() {
        let repo = InMemoryArticleRepository::new(ArticleKind::Post);
        let saved = repo.save(article("hello", true)).await.unwrap();
        repo.increment_views(saved.id).await.unwrap();
        repo.increment_likes(saved.id).await.unwrap();

        let mut edited = saved.clone();
        edited.title = "Edited".into();
        let stored = repo.save(edited).await.unwrap();

        assert_eq!(stored.views, 1);
        assert_eq!(stored.likes, 1);
        assert_eq!(stored.title, "Edited");
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_constraint_violation() {
        let repo = InMemoryArticleRepository::new(ArticleKind::Post);
        repo.save(article("same", true)).await.unwrap();
        let result = repo.save(article("same", false)).await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn counters_on_unknown_id_report_not_found() {
        let repo = InMemoryArticleRepository::new(ArticleKind::Tutorial);
        assert!(matches!(
            repo.increment_views(Uuid::new_v4()).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn list_orders_published_first_then_drafts() {
        let repo = InMemoryArticleRepository::new(ArticleKind::Post);
        let mut older = article("older", true);
        older.published_at = Some(Utc::now() - Duration::days(2));
        repo.save(older).await.unwrap();
        repo.save(article("draft", false)).await.unwrap();
        repo.save(article("newer", true)).await.unwrap();

        let slugs: Vec<String> = repo
            .list(&ArticleQuery::default())
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.slug)
            .collect();
        assert_eq!(slugs, ["newer", "older", "draft"]);

        let page = repo
            .list(&ArticleQuery {
                limit: Some(1),
                offset: Some(1),
                ..ArticleQuery::published()
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].slug, "older");
    }

    #[tokio::test]
    async fn approve_is_idempotent() {
        let repo = InMemoryCommentRepository::new();
        let comment = repo
            .insert(NewComment {
                post_id: Uuid::new_v4(),
                user_id: "u1".into(),
                user_name: "Ada".into(),
                user_photo: None,
                content: "Nice".into(),
                parent_id: None,
            })
            .await
            .unwrap();
        assert!(!comment.approved);

        let first = repo.approve(comment.id).await.unwrap();
        let second = repo.approve(comment.id).await.unwrap();
        assert!(first.approved && second.approved);
        assert!(matches!(repo.approve(Uuid::new_v4()).await, Err(RepoError::NotFound)));
    }
}
