use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category entity. Articles reference a category by its slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    /// Derived count of posts and tutorials in this category.
    /// Only accurate immediately after a recount.
    pub post_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn create(draft: CategoryDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: draft.name,
            slug: draft.slug,
            description: draft.description,
            color: draft.color,
            icon: draft.icon,
            post_count: 0,
            created_at: now,
        }
    }

    /// Overwrite editable fields. `post_count` is left to the recount.
    pub fn apply(&mut self, draft: CategoryDraft) {
        self.name = draft.name;
        self.slug = draft.slug;
        self.description = draft.description;
        self.color = draft.color;
        self.icon = draft.icon;
    }
}

/// Admin-supplied category fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub color: String,
    #[serde(default)]
    pub icon: String,
}

/// One line of a category recount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub slug: String,
    pub name: String,
    pub posts: u64,
    pub tutorials: u64,
    pub total: u64,
}
