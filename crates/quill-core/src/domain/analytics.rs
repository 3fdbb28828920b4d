//! Analytics events, per-user activity and the aggregate views built from them.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Article, Category};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    View,
    Like,
    Comment,
    Share,
    Login,
    Signup,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::View => "view",
            EventKind::Like => "like",
            EventKind::Comment => "comment",
            EventKind::Share => "share",
            EventKind::Login => "login",
            EventKind::Signup => "signup",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(EventKind::View),
            "like" => Ok(EventKind::Like),
            "comment" => Ok(EventKind::Comment),
            "share" => Ok(EventKind::Share),
            "login" => Ok(EventKind::Login),
            "signup" => Ok(EventKind::Signup),
            other => Err(format!("unknown analytics event '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub id: Uuid,
    #[serde(rename = "event")]
    pub kind: EventKind,
    pub post_id: Option<Uuid>,
    pub post_title: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

/// Event filter, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    pub kind: Option<EventKind>,
    pub post_id: Option<Uuid>,
    pub user_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
}

impl EventQuery {
    pub fn matches(&self, event: &AnalyticsEvent) -> bool {
        self.kind.is_none_or(|k| event.kind == k)
            && self.post_id.is_none_or(|id| event.post_id == Some(id))
            && self
                .user_id
                .as_deref()
                .is_none_or(|u| event.user_id.as_deref() == Some(u))
            && self.since.is_none_or(|s| event.timestamp >= s)
            && self.until.is_none_or(|u| event.timestamp <= u)
    }
}

/// Running per-user counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub user_id: String,
    pub user_name: String,
    pub user_email: Option<String>,
    pub user_photo: Option<String>,
    pub last_active: DateTime<Utc>,
    pub joined_at: DateTime<Utc>,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
}

/// Profile fields carried along with a tracked event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityProfile {
    pub user_id: String,
    pub user_name: String,
    pub user_email: Option<String>,
    pub user_photo: Option<String>,
}

impl UserActivity {
    pub fn first_seen(profile: ActivityProfile, now: DateTime<Utc>) -> Self {
        Self {
            user_id: profile.user_id,
            user_name: profile.user_name,
            user_email: profile.user_email,
            user_photo: profile.user_photo,
            last_active: now,
            joined_at: now,
            total_views: 0,
            total_likes: 0,
            total_comments: 0,
        }
    }

    /// Bump the counter matching `kind` and refresh the profile.
    pub fn record(&mut self, kind: EventKind, profile: ActivityProfile, now: DateTime<Utc>) {
        match kind {
            EventKind::View => self.total_views += 1,
            EventKind::Like => self.total_likes += 1,
            EventKind::Comment => self.total_comments += 1,
            EventKind::Share | EventKind::Login | EventKind::Signup => {}
        }
        if !profile.user_name.is_empty() {
            self.user_name = profile.user_name;
        }
        if profile.user_email.is_some() {
            self.user_email = profile.user_email;
        }
        if profile.user_photo.is_some() {
            self.user_photo = profile.user_photo;
        }
        self.last_active = now;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_posts: u64,
    pub published_posts: u64,
    pub total_views: i64,
    pub total_likes: i64,
    pub avg_reading_time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: String,
    pub name: String,
    pub views: i64,
    pub likes: i64,
    pub count: u64,
}

pub fn summarize(articles: &[Article]) -> AnalyticsSummary {
    if articles.is_empty() {
        return AnalyticsSummary::default();
    }
    let total_reading: i64 = articles.iter().map(|a| i64::from(a.reading_time)).sum();
    let avg = (total_reading as f64 / articles.len() as f64).round() as i64;

    AnalyticsSummary {
        total_posts: articles.len() as u64,
        published_posts: articles.iter().filter(|a| a.published).count() as u64,
        total_views: articles.iter().map(|a| a.views).sum(),
        total_likes: articles.iter().map(|a| a.likes).sum(),
        avg_reading_time: avg,
    }
}

pub fn top_by_views(mut articles: Vec<Article>, limit: usize) -> Vec<Article> {
    articles.sort_by(|a, b| b.views.cmp(&a.views));
    articles.truncate(limit);
    articles
}

pub fn top_by_engagement(mut articles: Vec<Article>, limit: usize) -> Vec<Article> {
    articles.sort_by_key(|a| std::cmp::Reverse(a.engagement()));
    articles.truncate(limit);
    articles
}

/// Views, likes and article count per category, busiest first.
///
/// Articles pointing at an unknown slug are reported under the slug itself.
pub fn category_stats(articles: &[Article], categories: &[Category]) -> Vec<CategoryStats> {
    let names: HashMap<&str, &str> = categories
        .iter()
        .map(|c| (c.slug.as_str(), c.name.as_str()))
        .collect();

    let mut by_slug: HashMap<&str, CategoryStats> = HashMap::new();
    for article in articles {
        let entry = by_slug
            .entry(article.category.as_str())
            .or_insert_with(|| CategoryStats {
                category: article.category.clone(),
                name: names
                    .get(article.category.as_str())
                    .copied()
                    .unwrap_or(article.category.as_str())
                    .to_string(),
                views: 0,
                likes: 0,
                count: 0,
            });
        entry.views += article.views;
        entry.likes += article.likes;
        entry.count += 1;
    }

    let mut stats: Vec<CategoryStats> = by_slug.into_values().collect();
    stats.sort_by(|a, b| b.views.cmp(&a.views).then_with(|| a.category.cmp(&b.category)));
    stats
}
