//! Event tracking and dashboard aggregates.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    ActivityProfile, AnalyticsEvent, AnalyticsSummary, Article, ArticleQuery, CategoryStats,
    EventKind, EventQuery, UserActivity, category_stats, summarize, top_by_engagement,
    top_by_views,
};
use crate::error::DomainError;
use crate::ports::{AnalyticsRepository, ArticleRepository, CategoryRepository};

/// How many published articles per collection feed the rankings.
pub const RANKING_SAMPLE: u64 = 100;
pub const DEFAULT_RECENT_LIMIT: u64 = 20;
pub const DEFAULT_USER_LIMIT: u64 = 10;

/// An event as reported by a client.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEvent {
    pub kind: EventKind,
    pub post_id: Option<Uuid>,
    pub post_title: Option<String>,
    pub metadata: Option<serde_json::Value>,
    /// Present when the caller is signed in; drives per-user activity.
    pub profile: Option<ActivityProfile>,
}

pub struct AnalyticsService {
    analytics: Arc<dyn AnalyticsRepository>,
    posts: Arc<dyn ArticleRepository>,
    tutorials: Arc<dyn ArticleRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl AnalyticsService {
    pub fn new(
        analytics: Arc<dyn AnalyticsRepository>,
        posts: Arc<dyn ArticleRepository>,
        tutorials: Arc<dyn ArticleRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            analytics,
            posts,
            tutorials,
            categories,
        }
    }

    pub async fn track(&self, event: TrackEvent) -> Result<AnalyticsEvent, DomainError> {
        let now = Utc::now();
        let record = AnalyticsEvent {
            id: Uuid::new_v4(),
            kind: event.kind,
            post_id: event.post_id,
            post_title: event.post_title,
            user_id: event.profile.as_ref().map(|p| p.user_id.clone()),
            user_name: event.profile.as_ref().map(|p| p.user_name.clone()),
            metadata: event.metadata,
            timestamp: now,
        };
        self.analytics.record_event(record.clone()).await?;

        if let Some(profile) = event.profile {
            self.touch_activity(event.kind, profile, now).await?;
        }

        tracing::debug!(event = %record.kind, post_id = ?record.post_id, "Analytics event recorded");
        Ok(record)
    }

    async fn touch_activity(
        &self,
        kind: EventKind,
        profile: ActivityProfile,
        now: DateTime<Utc>,
    ) -> Result<UserActivity, DomainError> {
        let activity = match self.analytics.find_activity(&profile.user_id).await? {
            Some(mut activity) => {
                activity.record(kind, profile, now);
                activity
            }
            None => {
                let mut activity = UserActivity::first_seen(profile.clone(), now);
                activity.record(kind, profile, now);
                activity
            }
        };
        Ok(self.analytics.save_activity(activity).await?)
    }

    /// Totals across posts and tutorials, drafts included.
    pub async fn summary(&self) -> Result<AnalyticsSummary, DomainError> {
        let articles = self.all_articles(&ArticleQuery::default()).await?;
        Ok(summarize(&articles))
    }

    pub async fn top_by_views(&self, limit: usize) -> Result<Vec<Article>, DomainError> {
        Ok(top_by_views(self.ranking_sample().await?, limit))
    }

    pub async fn top_by_engagement(&self, limit: usize) -> Result<Vec<Article>, DomainError> {
        Ok(top_by_engagement(self.ranking_sample().await?, limit))
    }

    pub async fn category_stats(&self) -> Result<Vec<CategoryStats>, DomainError> {
        let articles = self.all_articles(&ArticleQuery::published()).await?;
        let categories = self.categories.list().await?;
        Ok(category_stats(&articles, &categories))
    }

    pub async fn recent(&self, limit: Option<u64>) -> Result<Vec<AnalyticsEvent>, DomainError> {
        let query = EventQuery {
            limit: Some(limit.unwrap_or(DEFAULT_RECENT_LIMIT)),
            ..EventQuery::default()
        };
        Ok(self.analytics.events(&query).await?)
    }

    pub async fn events(&self, query: &EventQuery) -> Result<Vec<AnalyticsEvent>, DomainError> {
        Ok(self.analytics.events(query).await?)
    }

    /// Most recently active users.
    pub async fn users(&self, limit: Option<u64>) -> Result<Vec<UserActivity>, DomainError> {
        Ok(self
            .analytics
            .list_activity(limit.unwrap_or(DEFAULT_USER_LIMIT))
            .await?)
    }

    pub async fn user(&self, user_id: &str) -> Result<UserActivity, DomainError> {
        self.analytics
            .find_activity(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("UserActivity", user_id))
    }

    async fn ranking_sample(&self) -> Result<Vec<Article>, DomainError> {
        let query = ArticleQuery {
            limit: Some(RANKING_SAMPLE),
            ..ArticleQuery::published()
        };
        self.all_articles(&query).await
    }

    async fn all_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>, DomainError> {
        let mut articles = self.posts.list(query).await?;
        articles.extend(self.tutorials.list(query).await?);
        Ok(articles)
    }
}
