//! Comment submission and the approval workflow.
//!
//! A comment is created pending (`approved = false`), becomes visible once an
//! admin approves it, and can be deleted from either state. Rejection is deletion.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{ArticleKind, ChangeEvent, ChangeKind, Collection, Comment, CommentQuery, NewComment};
use crate::error::{DomainError, RepoError};
use crate::ports::{ArticleRepository, ChangeFeed, CommentRepository};
use crate::sanitize::{sanitize_comment, sanitize_text, sanitize_url};
use crate::validation::validate_comment;

use super::notify;

/// Who is commenting, as established by the auth gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commenter {
    pub user_id: String,
    pub user_name: String,
    pub user_photo: Option<String>,
}

pub struct ModerationService {
    posts: Arc<dyn ArticleRepository>,
    tutorials: Arc<dyn ArticleRepository>,
    comments: Arc<dyn CommentRepository>,
    feed: Arc<dyn ChangeFeed>,
}

impl ModerationService {
    pub fn new(
        posts: Arc<dyn ArticleRepository>,
        tutorials: Arc<dyn ArticleRepository>,
        comments: Arc<dyn CommentRepository>,
        feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self {
            posts,
            tutorials,
            comments,
            feed,
        }
    }

    /// Store a reader comment on a published article. It always starts unapproved.
    pub async fn submit(
        &self,
        kind: ArticleKind,
        post_id: Uuid,
        commenter: Commenter,
        content: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Comment, DomainError> {
        validate_comment(content, &commenter.user_name)?;

        let articles = match kind {
            ArticleKind::Post => &self.posts,
            ArticleKind::Tutorial => &self.tutorials,
        };
        articles
            .find_by_id(post_id)
            .await?
            .filter(|article| article.published)
            .ok_or_else(|| DomainError::not_found(kind.label(), post_id))?;

        if let Some(parent_id) = parent_id {
            let parent = self
                .comments
                .find_by_id(parent_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Comment", parent_id))?;
            if parent.post_id != post_id {
                return Err(DomainError::invalid("parent comment belongs to another article"));
            }
        }

        let content = sanitize_comment(content.trim());
        if content.trim().is_empty() {
            return Err(DomainError::invalid("content has no allowed markup or text"));
        }

        let comment = self
            .comments
            .insert(NewComment {
                post_id,
                user_id: commenter.user_id,
                user_name: sanitize_text(commenter.user_name.trim()),
                user_photo: commenter.user_photo.as_deref().and_then(sanitize_url),
                content,
                parent_id,
            })
            .await?;

        tracing::info!(comment_id = %comment.id, post_id = %post_id, "Comment submitted for moderation");
        notify(self.feed.as_ref(), ChangeEvent::new(Collection::Comments, ChangeKind::Created, comment.id)).await;
        Ok(comment)
    }

    pub async fn approve(&self, id: Uuid) -> Result<Comment, DomainError> {
        let comment = self.comments.approve(id).await.map_err(|e| missing_comment(id, e))?;
        tracing::info!(comment_id = %id, "Comment approved");
        notify(self.feed.as_ref(), ChangeEvent::new(Collection::Comments, ChangeKind::Updated, id)).await;
        Ok(comment)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.comments.delete(id).await.map_err(|e| missing_comment(id, e))?;
        tracing::info!(comment_id = %id, "Comment deleted");
        notify(self.feed.as_ref(), ChangeEvent::new(Collection::Comments, ChangeKind::Deleted, id)).await;
        Ok(())
    }

    /// Approved comments on one article, newest first.
    pub async fn list_public(&self, post_id: Uuid) -> Result<Vec<Comment>, DomainError> {
        Ok(self.comments.list(&CommentQuery::public(post_id)).await?)
    }

    /// Moderation queue and history.
    pub async fn list(&self, query: &CommentQuery) -> Result<Vec<Comment>, DomainError> {
        Ok(self.comments.list(query).await?)
    }

    pub async fn like(&self, id: Uuid) -> Result<(), DomainError> {
        let comment = self
            .comments
            .find_by_id(id)
            .await?
            .filter(|c| c.approved)
            .ok_or_else(|| DomainError::not_found("Comment", id))?;
        self.comments
            .increment_likes(comment.id)
            .await
            .map_err(|e| missing_comment(id, e))
    }
}

fn missing_comment(id: Uuid, err: RepoError) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::not_found("Comment", id),
        other => other.into(),
    }
}
