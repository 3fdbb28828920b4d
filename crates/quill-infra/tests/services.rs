//! Core services driven end to end over the in-memory adapters.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde_json::json;

use quill_core::DomainError;
use quill_core::domain::{
    ActivityProfile, ArticleDraft, ArticleKind, ArticleQuery, Author, CategoryDraft, Collection,
    Difficulty, EventKind,
};
use quill_core::ports::{ArticleRepository, CategoryRepository, ChangeFeed};
use quill_core::services::{
    AnalyticsService, CategoryService, Commenter, ContentService, ModerationService,
    SettingsService, TrackEvent,
};
use quill_infra::{
    InMemoryAnalyticsRepository, InMemoryArticleRepository, InMemoryCategoryRepository,
    InMemoryChangeFeed, InMemoryCommentRepository, InMemorySettingsRepository,
};

struct Blog {
    posts: Arc<InMemoryArticleRepository>,
    categories_repo: Arc<InMemoryCategoryRepository>,
    feed: Arc<InMemoryChangeFeed>,
    content: ContentService,
    categories: CategoryService,
    moderation: ModerationService,
    analytics: AnalyticsService,
    settings: SettingsService,
}

fn blog() -> Blog {
    let posts = Arc::new(InMemoryArticleRepository::new(ArticleKind::Post));
    let tutorials = Arc::new(InMemoryArticleRepository::new(ArticleKind::Tutorial));
    let categories_repo = Arc::new(InMemoryCategoryRepository::new());
    let comments = Arc::new(InMemoryCommentRepository::new());
    let feed = Arc::new(InMemoryChangeFeed::default());

    Blog {
        content: ContentService::new(
            posts.clone(),
            tutorials.clone(),
            categories_repo.clone(),
            comments.clone(),
            feed.clone(),
        ),
        categories: CategoryService::new(
            categories_repo.clone(),
            posts.clone(),
            tutorials.clone(),
            feed.clone(),
        ),
        moderation: ModerationService::new(posts.clone(), tutorials.clone(), comments, feed.clone()),
        analytics: AnalyticsService::new(
            Arc::new(InMemoryAnalyticsRepository::new()),
            posts.clone(),
            tutorials,
            categories_repo.clone(),
        ),
        settings: SettingsService::new(Arc::new(InMemorySettingsRepository::new()), feed.clone()),
        posts,
        categories_repo,
        feed,
    }
}

fn author() -> Author {
    Author {
        id: "admin-1".into(),
        name: "Ada".into(),
    }
}

fn category(slug: &str) -> CategoryDraft {
    CategoryDraft {
        name: slug.to_uppercase(),
        slug: slug.into(),
        description: None,
        color: "#3b82f6".into(),
        icon: "💻".into(),
    }
}

fn draft(slug: &str, category: &str, published: bool) -> ArticleDraft {
    ArticleDraft {
        title: format!("About {slug}"),
        slug: slug.into(),
        content: "<p>Some words about things</p>".into(),
        excerpt: "Some words".into(),
        category: category.into(),
        tags: vec!["rust".into()],
        published,
        ..ArticleDraft::default()
    }
}

fn tutorial(slug: &str, category: &str) -> ArticleDraft {
    ArticleDraft {
        difficulty: Some(Difficulty::Beginner),
        ..draft(slug, category, true)
    }
}

fn reader() -> Commenter {
    Commenter {
        user_id: "reader-1".into(),
        user_name: "Grace".into(),
        user_photo: Some("https://example.com/grace.png".into()),
    }
}

#[tokio::test]
async fn recount_sums_posts_and_tutorials() {
    let blog = blog();
    blog.categories.create(category("tech")).await.unwrap();
    blog.categories.create(category("life")).await.unwrap();

    for i in 0..3 {
        blog.content
            .create(ArticleKind::Post, draft(&format!("post-{i}"), "tech", true), author())
            .await
            .unwrap();
    }
    for i in 0..2 {
        blog.content
            .create(ArticleKind::Tutorial, tutorial(&format!("tut-{i}"), "tech"), author())
            .await
            .unwrap();
    }

    let report = blog.categories.recalculate_counts().await.unwrap();

    let tech = report.iter().find(|c| c.slug == "tech").unwrap();
    assert_eq!((tech.posts, tech.tutorials, tech.total), (3, 2, 5));
    let life = report.iter().find(|c| c.slug == "life").unwrap();
    assert_eq!(life.total, 0);

    let stored = blog.categories_repo.find_by_slug("tech").await.unwrap().unwrap();
    assert_eq!(stored.post_count, 5);
}

#[tokio::test]
async fn comments_start_pending_until_approved() {
    let blog = blog();
    blog.categories.create(category("tech")).await.unwrap();
    let post = blog
        .content
        .create(ArticleKind::Post, draft("hello", "tech", true), author())
        .await
        .unwrap();

    let comment = blog
        .moderation
        .submit(ArticleKind::Post, post.id, reader(), "<p>Great <script>x()</script>read</p>", None)
        .await
        .unwrap();

    assert!(!comment.approved);
    assert!(!comment.content.contains("script"));
    assert!(blog.moderation.list_public(post.id).await.unwrap().is_empty());

    let approved = blog.moderation.approve(comment.id).await.unwrap();
    assert!(approved.approved);

    let visible = blog.moderation.list_public(post.id).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, comment.id);
}

#[tokio::test]
async fn comments_on_drafts_are_rejected() {
    let blog = blog();
    blog.categories.create(category("tech")).await.unwrap();
    let post = blog
        .content
        .create(ArticleKind::Post, draft("draft", "tech", false), author())
        .await
        .unwrap();

    let result = blog
        .moderation
        .submit(ArticleKind::Post, post.id, reader(), "Hello", None)
        .await;

    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn pending_comments_cannot_be_liked() {
    let blog = blog();
    blog.categories.create(category("tech")).await.unwrap();
    let post = blog
        .content
        .create(ArticleKind::Post, draft("hello", "tech", true), author())
        .await
        .unwrap();
    let comment = blog
        .moderation
        .submit(ArticleKind::Post, post.id, reader(), "Nice", None)
        .await
        .unwrap();

    assert!(blog.moderation.like(comment.id).await.is_err());
    blog.moderation.approve(comment.id).await.unwrap();
    assert!(blog.moderation.like(comment.id).await.is_ok());
}

#[tokio::test]
async fn category_in_use_cannot_be_deleted() {
    let blog = blog();
    let tech = blog.categories.create(category("tech")).await.unwrap();
    let post = blog
        .content
        .create(ArticleKind::Post, draft("hello", "tech", true), author())
        .await
        .unwrap();

    let blocked = blog.categories.delete(tech.id).await;
    assert!(matches!(blocked, Err(DomainError::Conflict(_))));

    blog.content.delete(ArticleKind::Post, post.id).await.unwrap();
    blog.categories.delete(tech.id).await.unwrap();
}

#[tokio::test]
async fn duplicate_slugs_are_rejected() {
    let blog = blog();
    blog.categories.create(category("tech")).await.unwrap();
    assert!(matches!(
        blog.categories.create(category("tech")).await,
        Err(DomainError::Duplicate(_))
    ));

    blog.content
        .create(ArticleKind::Post, draft("same", "tech", true), author())
        .await
        .unwrap();
    let second = blog
        .content
        .create(ArticleKind::Post, draft("same", "tech", false), author())
        .await;
    assert!(matches!(second, Err(DomainError::Duplicate(_))));
}

#[tokio::test]
async fn unknown_category_is_a_validation_error() {
    let blog = blog();
    let result = blog
        .content
        .create(ArticleKind::Post, draft("orphan", "missing", true), author())
        .await;
    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn drafts_are_hidden_from_public_reads() {
    let blog = blog();
    blog.categories.create(category("tech")).await.unwrap();
    blog.content
        .create(ArticleKind::Post, draft("live", "tech", true), author())
        .await
        .unwrap();
    blog.content
        .create(ArticleKind::Post, draft("hidden", "tech", false), author())
        .await
        .unwrap();

    let public = blog
        .content
        .list_published(ArticleKind::Post, ArticleQuery::default())
        .await
        .unwrap();
    assert_eq!(public.len(), 1);
    assert!(matches!(
        blog.content.get_published(ArticleKind::Post, "hidden").await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn blank_slug_is_derived_from_the_title() {
    let blog = blog();
    blog.categories.create(category("tech")).await.unwrap();

    let post = blog
        .content
        .create(
            ArticleKind::Post,
            ArticleDraft {
                title: "Hello, Async World!".into(),
                ..draft("  ", "tech", true)
            },
            author(),
        )
        .await
        .unwrap();
    assert_eq!(post.slug, "hello-async-world");

    let untitled = blog
        .content
        .create(
            ArticleKind::Post,
            ArticleDraft {
                title: "!!!".into(),
                ..draft("", "tech", true)
            },
            author(),
        )
        .await;
    assert!(matches!(untitled, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn counters_only_move_on_published_articles() {
    let blog = blog();
    blog.categories.create(category("tech")).await.unwrap();
    let hidden = blog
        .content
        .create(ArticleKind::Post, draft("hidden", "tech", false), author())
        .await
        .unwrap();

    assert!(matches!(
        blog.content.record_view(ArticleKind::Post, hidden.id).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        blog.content.record_like(ArticleKind::Post, hidden.id).await,
        Err(DomainError::NotFound { .. })
    ));

    let stored = blog.content.get(ArticleKind::Post, hidden.id).await.unwrap();
    assert_eq!((stored.views, stored.likes), (0, 0));

    let live = blog
        .content
        .create(ArticleKind::Post, draft("live", "tech", true), author())
        .await
        .unwrap();
    let viewed = blog.content.record_view(ArticleKind::Post, live.id).await.unwrap();
    assert_eq!(viewed.title, "About live");
}

#[tokio::test]
async fn deleting_an_article_removes_its_comments() {
    let blog = blog();
    blog.categories.create(category("tech")).await.unwrap();
    let post = blog
        .content
        .create(ArticleKind::Post, draft("hello", "tech", true), author())
        .await
        .unwrap();
    let comment = blog
        .moderation
        .submit(ArticleKind::Post, post.id, reader(), "Bye", None)
        .await
        .unwrap();

    blog.content.delete(ArticleKind::Post, post.id).await.unwrap();

    assert!(matches!(
        blog.moderation.approve(comment.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn summary_and_rankings_follow_counters() {
    let blog = blog();
    blog.categories.create(category("tech")).await.unwrap();
    let quiet = blog
        .content
        .create(ArticleKind::Post, draft("quiet", "tech", true), author())
        .await
        .unwrap();
    let loved = blog
        .content
        .create(ArticleKind::Post, draft("loved", "tech", true), author())
        .await
        .unwrap();

    for _ in 0..3 {
        blog.content.record_view(ArticleKind::Post, quiet.id).await.unwrap();
    }
    blog.content.record_view(ArticleKind::Post, loved.id).await.unwrap();
    for _ in 0..2 {
        blog.content.record_like(ArticleKind::Post, loved.id).await.unwrap();
    }

    let summary = blog.analytics.summary().await.unwrap();
    assert_eq!(summary.total_posts, 2);
    assert_eq!(summary.total_views, 4);
    assert_eq!(summary.total_likes, 2);
    assert_eq!(summary.avg_reading_time, 1);

    let by_views = blog.analytics.top_by_views(1).await.unwrap();
    assert_eq!(by_views[0].slug, "quiet");
    let by_engagement = blog.analytics.top_by_engagement(1).await.unwrap();
    assert_eq!(by_engagement[0].slug, "loved");

    let stats = blog.analytics.category_stats().await.unwrap();
    assert_eq!(stats[0].count, 2);
    assert_eq!(stats[0].views, 4);
}

#[tokio::test]
async fn tracked_events_update_user_activity() {
    let blog = blog();
    let profile = ActivityProfile {
        user_id: "reader-1".into(),
        user_name: "Grace".into(),
        ..ActivityProfile::default()
    };

    for kind in [EventKind::View, EventKind::View, EventKind::Like] {
        blog.analytics
            .track(TrackEvent {
                kind,
                post_id: None,
                post_title: None,
                metadata: None,
                profile: Some(profile.clone()),
            })
            .await
            .unwrap();
    }

    let activity = blog.analytics.user("reader-1").await.unwrap();
    assert_eq!(activity.total_views, 2);
    assert_eq!(activity.total_likes, 1);
    assert_eq!(blog.analytics.recent(None).await.unwrap().len(), 3);
    assert_eq!(blog.analytics.users(Some(5)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn settings_merge_and_reset() {
    let blog = blog();
    let defaults = blog.settings.get().await.unwrap();

    let updated = blog
        .settings
        .update(&json!({"siteName": "Renamed", "social": {"github": "https://github.com/quill"}}))
        .await
        .unwrap();
    assert_eq!(updated.site_name, "Renamed");
    assert_eq!(updated.social.github.as_deref(), Some("https://github.com/quill"));
    assert_eq!(updated.tagline, defaults.tagline);

    assert!(blog.settings.update(&json!(["not", "an", "object"])).await.is_err());

    let reset = blog.settings.reset().await.unwrap();
    assert_eq!(reset.site_name, defaults.site_name);
}

#[tokio::test]
async fn article_changes_reach_subscribers() {
    let blog = blog();
    blog.categories.create(category("tech")).await.unwrap();
    let mut changes = blog.feed.subscribe(Collection::Posts).await.unwrap();

    let post = blog
        .content
        .create(ArticleKind::Post, draft("hello", "tech", true), author())
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), changes.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.id, post.id.to_string());
    assert_eq!(blog.posts.kind(), ArticleKind::Post);
}
