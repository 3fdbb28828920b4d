use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reader comment on an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: String,
    pub user_name: String,
    pub user_photo: Option<String>,
    pub content: String,
    pub parent_id: Option<Uuid>,
    pub likes: i64,
    /// Moderation gate. Only approved comments are shown publicly.
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// The only constructor for stored comments: every new comment awaits moderation.
    pub fn pending(new: NewComment, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id: new.post_id,
            user_id: new.user_id,
            user_name: new.user_name,
            user_photo: new.user_photo,
            content: new.content,
            parent_id: new.parent_id,
            likes: 0,
            approved: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark as approved. Idempotent.
    pub fn approve(&mut self, now: DateTime<Utc>) {
        if !self.approved {
            self.approved = true;
            self.updated_at = now;
        }
    }
}

/// Fields of a comment submission. There is no way to request approval here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: Uuid,
    pub user_id: String,
    pub user_name: String,
    pub user_photo: Option<String>,
    pub content: String,
    pub parent_id: Option<Uuid>,
}

/// Listing filter for comments, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentQuery {
    pub post_id: Option<Uuid>,
    pub approved: Option<bool>,
    pub limit: Option<u64>,
}

impl CommentQuery {
    /// Approved comments on one article.
    pub fn public(post_id: Uuid) -> Self {
        Self {
            post_id: Some(post_id),
            approved: Some(true),
            limit: None,
        }
    }

    pub fn matches(&self, comment: &Comment) -> bool {
        self.post_id.is_none_or(|id| comment.post_id == id)
            && self.approved.is_none_or(|a| comment.approved == a)
    }
}
