use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Words per minute used for the reading-time estimate.
pub const WORDS_PER_MINUTE: usize = 200;

/// The two long-form content types. Both share one shape and live in separate collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleKind {
    Post,
    Tutorial,
}

impl ArticleKind {
    pub const ALL: [ArticleKind; 2] = [ArticleKind::Post, ArticleKind::Tutorial];

    /// Name of the backing collection.
    pub fn collection(self) -> &'static str {
        match self {
            ArticleKind::Post => "posts",
            ArticleKind::Tutorial => "tutorials",
        }
    }

    /// Entity label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            ArticleKind::Post => "Post",
            ArticleKind::Tutorial => "Tutorial",
        }
    }
}

impl fmt::Display for ArticleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// Tutorial difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

/// Author reference stamped on an article at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
}

/// A post or tutorial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub kind: ArticleKind,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_id: String,
    pub author_name: String,
    pub reading_time: i32,
    pub views: i64,
    pub likes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

impl Article {
    /// Build a fresh article from an already-cleaned draft.
    ///
    /// Counters start at zero and `published_at` is stamped only when the draft is published.
    pub fn create(kind: ArticleKind, draft: ArticleDraft, author: Author, now: DateTime<Utc>) -> Self {
        let reading_time = calculate_reading_time(&draft.content);
        Self {
            id: Uuid::new_v4(),
            kind,
            title: draft.title,
            slug: draft.slug,
            content: draft.content,
            excerpt: draft.excerpt,
            cover_image: draft.cover_image,
            category: draft.category,
            tags: draft.tags,
            published: draft.published,
            published_at: draft.published.then_some(now),
            created_at: now,
            updated_at: now,
            author_id: author.id,
            author_name: author.name,
            reading_time,
            views: 0,
            likes: 0,
            difficulty: draft.difficulty,
        }
    }

    /// Apply an edited draft, keeping identity, authorship and counters.
    ///
    /// The first transition into the published state stamps `published_at`;
    /// later edits and unpublishing keep the original date.
    pub fn apply(&mut self, draft: ArticleDraft, now: DateTime<Utc>) {
        self.reading_time = calculate_reading_time(&draft.content);
        self.title = draft.title;
        self.slug = draft.slug;
        self.content = draft.content;
        self.excerpt = draft.excerpt;
        self.cover_image = draft.cover_image;
        self.category = draft.category;
        self.tags = draft.tags;
        self.difficulty = draft.difficulty;
        if draft.published && self.published_at.is_none() {
            self.published_at = Some(now);
        }
        self.published = draft.published;
        self.updated_at = now;
    }

    /// Views plus twice the likes.
    pub fn engagement(&self) -> i64 {
        self.views + self.likes * 2
    }
}

/// Author-supplied fields of an article, used for both create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDraft {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

/// Listing filter for articles.
///
/// Results are ordered by `published_at` descending (drafts last), then `created_at` descending.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleQuery {
    pub published: Option<bool>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ArticleQuery {
    pub fn published() -> Self {
        Self {
            published: Some(true),
            ..Self::default()
        }
    }

    /// Whether an article passes every filter (pagination excluded).
    pub fn matches(&self, article: &Article) -> bool {
        self.published.is_none_or(|p| article.published == p)
            && self
                .category
                .as_deref()
                .is_none_or(|c| article.category == c)
            && self
                .tag
                .as_deref()
                .is_none_or(|t| article.tags.iter().any(|tag| tag == t))
            && self
                .difficulty
                .is_none_or(|d| article.difficulty == Some(d))
    }
}

/// Estimated minutes to read `content` at [`WORDS_PER_MINUTE`], never less than one.
pub fn calculate_reading_time(content: &str) -> i32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as i32
}
