//! Post and tutorial authoring, public reads and counters.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    Article, ArticleDraft, ArticleKind, ArticleQuery, Author, ChangeEvent, ChangeKind,
};
use crate::error::{DomainError, RepoError};
use crate::ports::{ArticleRepository, CategoryRepository, ChangeFeed, CommentRepository};
use crate::sanitize::{sanitize_html, sanitize_text, sanitize_url};
use crate::validation::{normalize_tags, slugify, validate_article};

use super::notify;

pub struct ContentService {
    posts: Arc<dyn ArticleRepository>,
    tutorials: Arc<dyn ArticleRepository>,
    categories: Arc<dyn CategoryRepository>,
    comments: Arc<dyn CommentRepository>,
    feed: Arc<dyn ChangeFeed>,
}

impl ContentService {
    pub fn new(
        posts: Arc<dyn ArticleRepository>,
        tutorials: Arc<dyn ArticleRepository>,
        categories: Arc<dyn CategoryRepository>,
        comments: Arc<dyn CommentRepository>,
        feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self {
            posts,
            tutorials,
            categories,
            comments,
            feed,
        }
    }

    pub fn repository(&self, kind: ArticleKind) -> &dyn ArticleRepository {
        match kind {
            ArticleKind::Post => self.posts.as_ref(),
            ArticleKind::Tutorial => self.tutorials.as_ref(),
        }
    }

    pub async fn create(
        &self,
        kind: ArticleKind,
        draft: ArticleDraft,
        author: Author,
    ) -> Result<Article, DomainError> {
        let draft = self.prepare(kind, draft).await?;
        let repo = self.repository(kind);

        if repo.find_by_slug(&draft.slug).await?.is_some() {
            return Err(duplicate_slug(kind, &draft.slug));
        }

        let article = Article::create(kind, draft, author, Utc::now());
        let saved = repo.save(article).await?;

        tracing::info!(kind = %kind, id = %saved.id, slug = %saved.slug, published = saved.published, "Article created");
        notify(self.feed.as_ref(), ChangeEvent::new(kind.into(), ChangeKind::Created, saved.id)).await;
        Ok(saved)
    }

    pub async fn update(
        &self,
        kind: ArticleKind,
        id: Uuid,
        draft: ArticleDraft,
    ) -> Result<Article, DomainError> {
        let draft = self.prepare(kind, draft).await?;
        let repo = self.repository(kind);

        let mut article = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(kind.label(), id))?;

        let taken = repo
            .find_by_slug(&draft.slug)
            .await?
            .is_some_and(|existing| existing.id != id);
        if taken {
            return Err(duplicate_slug(kind, &draft.slug));
        }

        article.apply(draft, Utc::now());
        let saved = repo.save(article).await?;

        tracing::info!(kind = %kind, id = %saved.id, "Article updated");
        notify(self.feed.as_ref(), ChangeEvent::new(kind.into(), ChangeKind::Updated, saved.id)).await;
        Ok(saved)
    }

    /// Delete an article together with its comments.
    pub async fn delete(&self, kind: ArticleKind, id: Uuid) -> Result<(), DomainError> {
        match self.repository(kind).delete(id).await {
            Ok(()) => {}
            Err(RepoError::NotFound) => return Err(DomainError::not_found(kind.label(), id)),
            Err(e) => return Err(e.into()),
        }

        let removed = self.comments.delete_for_post(id).await?;
        tracing::info!(kind = %kind, id = %id, comments_removed = removed, "Article deleted");
        notify(self.feed.as_ref(), ChangeEvent::new(kind.into(), ChangeKind::Deleted, id)).await;
        Ok(())
    }

    /// Any article by id, drafts included.
    pub async fn get(&self, kind: ArticleKind, id: Uuid) -> Result<Article, DomainError> {
        self.repository(kind)
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(kind.label(), id))
    }

    /// A published article by slug. Drafts are reported as missing.
    pub async fn get_published(&self, kind: ArticleKind, slug: &str) -> Result<Article, DomainError> {
        self.repository(kind)
            .find_by_slug(slug)
            .await?
            .filter(|article| article.published)
            .ok_or_else(|| DomainError::not_found(kind.label(), slug))
    }

    pub async fn list(&self, kind: ArticleKind, query: &ArticleQuery) -> Result<Vec<Article>, DomainError> {
        Ok(self.repository(kind).list(query).await?)
    }

    /// Public listing: the published filter is forced on.
    pub async fn list_published(
        &self,
        kind: ArticleKind,
        mut query: ArticleQuery,
    ) -> Result<Vec<Article>, DomainError> {
        query.published = Some(true);
        self.list(kind, &query).await
    }

    /// Count a view on a published article; drafts read as missing.
    /// Returns the article as it was before the bump.
    pub async fn record_view(&self, kind: ArticleKind, id: Uuid) -> Result<Article, DomainError> {
        let article = self.published_by_id(kind, id).await?;
        self.repository(kind)
            .increment_views(id)
            .await
            .map_err(|e| missing_as(kind, id, e))?;
        Ok(article)
    }

    pub async fn record_like(&self, kind: ArticleKind, id: Uuid) -> Result<Article, DomainError> {
        let article = self.published_by_id(kind, id).await?;
        self.repository(kind)
            .increment_likes(id)
            .await
            .map_err(|e| missing_as(kind, id, e))?;
        notify(self.feed.as_ref(), ChangeEvent::new(kind.into(), ChangeKind::Updated, id)).await;
        Ok(article)
    }

    async fn published_by_id(&self, kind: ArticleKind, id: Uuid) -> Result<Article, DomainError> {
        self.repository(kind)
            .find_by_id(id)
            .await?
            .filter(|article| article.published)
            .ok_or_else(|| DomainError::not_found(kind.label(), id))
    }

    /// Validate, normalize and sanitize an incoming draft.
    async fn prepare(&self, kind: ArticleKind, mut draft: ArticleDraft) -> Result<ArticleDraft, DomainError> {
        draft.title = draft.title.trim().to_string();
        draft.slug = draft.slug.trim().to_string();
        if draft.slug.is_empty() {
            draft.slug = slugify(&draft.title);
        }
        draft.category = draft.category.trim().to_string();
        draft.tags = normalize_tags(draft.tags);
        if kind == ArticleKind::Post {
            draft.difficulty = None;
        }

        validate_article(kind, &draft)?;

        draft.cover_image = match draft.cover_image.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                sanitize_url(raw)
                    .ok_or_else(|| DomainError::invalid("coverImage must be an http(s) URL"))?,
            ),
        };

        if self.categories.find_by_slug(&draft.category).await?.is_none() {
            return Err(DomainError::invalid(format!(
                "category '{}' does not exist",
                draft.category
            )));
        }

        draft.content = sanitize_html(&draft.content);
        draft.excerpt = sanitize_text(&draft.excerpt);
        if draft.content.trim().is_empty() {
            return Err(DomainError::invalid("content has no allowed markup or text"));
        }
        Ok(draft)
    }
}

fn duplicate_slug(kind: ArticleKind, slug: &str) -> DomainError {
    DomainError::Duplicate(format!("{} with slug '{}' already exists", kind.label(), slug))
}

fn missing_as(kind: ArticleKind, id: Uuid, err: RepoError) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::not_found(kind.label(), id),
        other => other.into(),
    }
}
