//! Comment moderation and likes. Submission lives with the article routes.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::CommentQuery;
use quill_shared::ApiResponse;
use quill_shared::dto::CommentListQuery;

use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

const MAX_LIST: u64 = 200;

pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(list))
        .route("/{id}/approve", web::post().to(approve))
        .route("/{id}", web::delete().to(delete));
}

/// GET /api/admin/comments?postId&approved&limit
async fn list(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    query: web::Query<CommentListQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let comments = state
        .moderation
        .list(&CommentQuery {
            post_id: query.post_id,
            approved: query.approved,
            limit: Some(query.limit.unwrap_or(50).min(MAX_LIST)),
        })
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(comments)))
}

/// POST /api/admin/comments/{id}/approve
async fn approve(
    state: web::Data<AppState>,
    admin: AdminIdentity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let comment = state.moderation.approve(id.into_inner()).await?;
    tracing::debug!(comment_id = %comment.id, moderator = %admin.user_id, "Approved via API");
    Ok(HttpResponse::Ok().json(ApiResponse::ok(comment)))
}

/// DELETE /api/admin/comments/{id}
async fn delete(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.moderation.delete(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Comment deleted")))
}

/// POST /api/comments/{id}/like
pub async fn like(state: web::Data<AppState>, id: web::Path<Uuid>) -> AppResult<HttpResponse> {
    state.moderation.like(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test};
    use quill_core::domain::{ArticleDraft, ArticleKind, Author};
    use quill_infra::RecaptchaVerifier;
    use serde_json::{Value, json};

    use crate::handlers::testing::{ADMIN, READER, StaticVerifier, config, seed_category, state, test_app};
    use crate::state::{AppState, Backends, Storage};

    async fn published_post(state: &AppState) -> String {
        seed_category(state, "tech").await;
        let post = state
            .content
            .create(
                ArticleKind::Post,
                ArticleDraft {
                    title: "Hello".into(),
                    slug: "hello".into(),
                    content: "<p>Hello world</p>".into(),
                    excerpt: "Hello".into(),
                    category: "tech".into(),
                    published: true,
                    ..ArticleDraft::default()
                },
                Author {
                    id: "admin-1".into(),
                    name: "Admin".into(),
                },
            )
            .await
            .unwrap();
        post.id.to_string()
    }

    #[actix_rt::test]
    async fn comment_waits_for_approval_before_it_is_listed() {
        let state = state().await;
        let post_id = published_post(&state).await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri(&format!("/api/posts/{post_id}/comments"))
            .insert_header(("Authorization", READER))
            .set_json(json!({ "content": "<b>Great</b> read <script>x()</script>" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(res).await;
        let comment = &created["data"];
        assert_eq!(comment["approved"], false);
        assert_eq!(comment["userName"], "Reader");
        assert!(!comment["content"].as_str().unwrap().contains("script"));
        let comment_id = comment["id"].as_str().unwrap().to_string();

        let public = format!("/api/posts/{post_id}/comments");
        let listed: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri(&public).to_request()).await;
        assert_eq!(listed["data"], json!([]));

        let req = test::TestRequest::get()
            .uri("/api/admin/comments?approved=false")
            .insert_header(("Authorization", ADMIN))
            .to_request();
        let queue: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(queue["data"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/comments/{comment_id}/approve"))
            .insert_header(("Authorization", ADMIN))
            .to_request();
        let approved: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(approved["data"]["approved"], true);

        let listed: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri(&public).to_request()).await;
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::post()
            .uri(&format!("/api/comments/{comment_id}/like"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
    }

    #[actix_rt::test]
    async fn anonymous_comment_is_unauthorized() {
        let state = state().await;
        let post_id = published_post(&state).await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri(&format!("/api/posts/{post_id}/comments"))
            .set_json(json!({ "content": "hi" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn recaptcha_token_is_required_once_a_secret_is_set() {
        let mut backends = Backends::local(Arc::new(StaticVerifier));
        backends.recaptcha = RecaptchaVerifier::new(Some("secret".to_string()));
        let state = AppState::assemble(&config(), Storage::in_memory(), backends).await;
        let post_id = published_post(&state).await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri(&format!("/api/posts/{post_id}/comments"))
            .insert_header(("Authorization", READER))
            .set_json(json!({ "content": "hi" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["errors"][0], "Missing reCAPTCHA token");
    }

    #[actix_rt::test]
    async fn deleting_an_unknown_comment_is_404() {
        let app = test_app!(state().await);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/comments/{}", uuid::Uuid::new_v4()))
            .insert_header(("Authorization", ADMIN))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
