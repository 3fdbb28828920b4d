//! Domain entities - the content model of the blog.

mod analytics;
mod article;
mod category;
mod change;
mod comment;
mod settings;

pub use analytics::{
    ActivityProfile, AnalyticsEvent, AnalyticsSummary, CategoryStats, EventKind, EventQuery,
    UserActivity, category_stats, summarize, top_by_engagement, top_by_views,
};
pub use article::{
    Article, ArticleDraft, ArticleKind, ArticleQuery, Author, Difficulty, WORDS_PER_MINUTE,
    calculate_reading_time,
};
pub use category::{Category, CategoryCount, CategoryDraft};
pub use change::{ChangeEvent, ChangeKind, Collection};
pub use comment::{Comment, CommentQuery, NewComment};
pub use settings::{AuthorProfile, SeoSettings, SiteSettings, SocialLinks};
