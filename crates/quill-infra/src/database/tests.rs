use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use quill_core::domain::{Article, ArticleKind, ArticleQuery};
use quill_core::error::RepoError;
use quill_core::ports::{
    AdminDirectory, ArticleRepository, BaseRepository, CategoryRepository, CommentRepository,
    SettingsRepository,
};

use crate::database::entity::{admin, category, comment, post, setting, tutorial};
use crate::database::postgres_repo::{
    PostgresAdminDirectory, PostgresCategoryRepository, PostgresCommentRepository,
    PostgresPostRepository, PostgresSettingsRepository, PostgresTutorialRepository,
};

fn post_model(id: Uuid, slug: &str) -> post::Model {
    let now = Utc::now();
    post::Model {
        id,
        title: "Test Post".to_owned(),
        slug: slug.to_owned(),
        content: "<p>Content</p>".to_owned(),
        excerpt: "Content".to_owned(),
        cover_image: None,
        category: "tech".to_owned(),
        tags: serde_json::json!(["rust", "web"]),
        published: true,
        published_at: Some(now.into()),
        created_at: now.into(),
        updated_at: now.into(),
        author_id: "user-1".to_owned(),
        author_name: "Ada".to_owned(),
        reading_time: 1,
        views: 7,
        likes: 2,
        difficulty: None,
    }
}

fn no_rows() -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: 0,
    }
}

fn one_row() -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: 1,
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(post_id, "hello-world")]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let post: Article = repo.find_by_id(post_id).await.unwrap().unwrap();

    assert_eq!(post.id, post_id);
    assert_eq!(post.kind, ArticleKind::Post);
    assert_eq!(post.tags, vec!["rust", "web"]);
    assert_eq!(post.views, 7);
}

#[tokio::test]
async fn test_tutorial_difficulty_is_parsed() {
    let now = Utc::now();
    let id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![tutorial::Model {
            id,
            title: "Intro".to_owned(),
            slug: "intro".to_owned(),
            content: "<p>x</p>".to_owned(),
            excerpt: String::new(),
            cover_image: None,
            category: "tech".to_owned(),
            tags: serde_json::json!([]),
            published: false,
            published_at: None,
            created_at: now.into(),
            updated_at: now.into(),
            author_id: "user-1".to_owned(),
            author_name: "Ada".to_owned(),
            reading_time: 1,
            views: 0,
            likes: 0,
            difficulty: Some("beginner".to_owned()),
        }]])
        .into_connection();

    let repo = PostgresTutorialRepository::new(db);
    let tutorial = repo.find_by_slug("intro").await.unwrap().unwrap();

    assert_eq!(tutorial.kind, ArticleKind::Tutorial);
    assert_eq!(
        tutorial.difficulty,
        Some(quill_core::domain::Difficulty::Beginner)
    );
}

#[tokio::test]
async fn test_list_posts_maps_rows() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![
            post_model(Uuid::new_v4(), "first"),
            post_model(Uuid::new_v4(), "second"),
        ]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let posts = repo
        .list(&ArticleQuery {
            tag: Some("rust".into()),
            limit: Some(10),
            ..ArticleQuery::published()
        })
        .await
        .unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[1].slug, "second");
}

#[tokio::test]
async fn test_increment_views_unknown_id() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([no_rows()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    assert!(matches!(
        repo.increment_views(Uuid::new_v4()).await,
        Err(RepoError::NotFound)
    ));
}

#[tokio::test]
async fn test_set_post_count() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([one_row(), no_rows()])
        .into_connection();

    let repo = PostgresCategoryRepository::new(db);

    assert!(repo.set_post_count(Uuid::new_v4(), 5).await.is_ok());
    assert!(matches!(
        repo.set_post_count(Uuid::new_v4(), 5).await,
        Err(RepoError::NotFound)
    ));
}

#[tokio::test]
async fn test_list_categories() {
    let now = Utc::now();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![category::Model {
            id: Uuid::new_v4(),
            name: "Tech".to_owned(),
            slug: "tech".to_owned(),
            description: None,
            color: "#3b82f6".to_owned(),
            icon: "💻".to_owned(),
            post_count: 5,
            created_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresCategoryRepository::new(db);
    let categories = repo.list().await.unwrap();

    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].post_count, 5);
}

#[tokio::test]
async fn test_approve_already_approved_comment_skips_update() {
    let now = Utc::now();
    let id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![comment::Model {
            id,
            post_id: Uuid::new_v4(),
            user_id: "user-1".to_owned(),
            user_name: "Ada".to_owned(),
            user_photo: None,
            content: "<p>Nice</p>".to_owned(),
            parent_id: None,
            likes: 0,
            approved: true,
            created_at: now.into(),
            updated_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresCommentRepository::new(db);
    let comment = repo.approve(id).await.unwrap();

    assert!(comment.approved);
}

#[tokio::test]
async fn test_approve_missing_comment() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<comment::Model>::new()])
        .into_connection();

    let repo = PostgresCommentRepository::new(db);

    assert!(matches!(
        repo.approve(Uuid::new_v4()).await,
        Err(RepoError::NotFound)
    ));
}

#[tokio::test]
async fn test_is_admin() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([
            vec![admin::Model {
                user_id: "root".to_owned(),
                created_at: Utc::now().into(),
            }],
            vec![],
        ])
        .into_connection();

    let directory = PostgresAdminDirectory::new(db);

    assert!(directory.is_admin("root").await.unwrap());
    assert!(!directory.is_admin("guest").await.unwrap());
}

#[tokio::test]
async fn test_corrupt_settings_document() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![setting::Model {
            key: setting::SITE_KEY.to_owned(),
            data: serde_json::json!({"siteName": 42}),
            updated_at: Utc::now().into(),
        }]])
        .into_connection();

    let repo = PostgresSettingsRepository::new(db);

    assert!(matches!(repo.load().await, Err(RepoError::Query(_))));
}
