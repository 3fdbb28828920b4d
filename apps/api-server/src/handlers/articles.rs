//! Posts and tutorials. The scope supplies the [`ArticleKind`].

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::{Article, ArticleDraft, ArticleKind, ArticleQuery, Author, EventKind};
use quill_core::services::TrackEvent;
use quill_shared::ApiResponse;
use quill_shared::dto::CommentRequest;

use crate::middleware::auth::{AdminIdentity, Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

pub fn public_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(list_published))
        .route("/{slug}", web::get().to(get_published))
        .route("/{id}/view", web::post().to(record_view))
        .route("/{id}/like", web::post().to(record_like))
        .route("/{id}/comments", web::get().to(list_comments))
        .route("/{id}/comments", web::post().to(submit_comment));
}

pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(list_all))
        .route("", web::post().to(create))
        .route("/{id}", web::get().to(get_any))
        .route("/{id}", web::put().to(update))
        .route("/{id}", web::delete().to(delete));
}

fn page(mut query: ArticleQuery, kind: ArticleKind) -> ArticleQuery {
    query.limit = Some(query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE));
    if kind == ArticleKind::Post {
        query.difficulty = None;
    }
    query
}

/// GET /api/{posts|tutorials}
async fn list_published(
    state: web::Data<AppState>,
    kind: web::Data<ArticleKind>,
    query: web::Query<ArticleQuery>,
) -> AppResult<HttpResponse> {
    let kind = **kind;
    let articles = state
        .content
        .list_published(kind, page(query.into_inner(), kind))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(articles)))
}

/// GET /api/{posts|tutorials}/{slug}
async fn get_published(
    state: web::Data<AppState>,
    kind: web::Data<ArticleKind>,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let article = state.content.get_published(**kind, &slug).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(article)))
}

/// POST /api/{posts|tutorials}/{id}/view
async fn record_view(
    state: web::Data<AppState>,
    kind: web::Data<ArticleKind>,
    id: web::Path<Uuid>,
    caller: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let id = id.into_inner();
    let article = state.content.record_view(**kind, id).await?;
    track(&state, EventKind::View, &article, caller).await;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/{posts|tutorials}/{id}/like
async fn record_like(
    state: web::Data<AppState>,
    kind: web::Data<ArticleKind>,
    id: web::Path<Uuid>,
    caller: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let id = id.into_inner();
    let article = state.content.record_like(**kind, id).await?;
    track(&state, EventKind::Like, &article, caller).await;
    Ok(HttpResponse::NoContent().finish())
}

/// Counters are the source of truth; a lost analytics event is only logged.
async fn track(state: &AppState, kind: EventKind, article: &Article, caller: OptionalIdentity) {
    let post_id = article.id;
    let event = TrackEvent {
        kind,
        post_id: Some(post_id),
        post_title: Some(article.title.clone()),
        metadata: None,
        profile: caller.0.map(|identity| identity.profile()),
    };
    if let Err(e) = state.analytics.track(event).await {
        tracing::warn!(post_id = %post_id, event = %kind, error = %e, "Analytics event not recorded");
    }
}

/// GET /api/{posts|tutorials}/{id}/comments
async fn list_comments(state: web::Data<AppState>, id: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let comments = state.moderation.list_public(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(comments)))
}

/// POST /api/{posts|tutorials}/{id}/comments
async fn submit_comment(
    state: web::Data<AppState>,
    kind: web::Data<ArticleKind>,
    id: web::Path<Uuid>,
    identity: Identity,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    super::recaptcha::require(&state, body.recaptcha_token.as_deref(), "comment").await?;

    let id = id.into_inner();
    let comment = state
        .moderation
        .submit(**kind, id, identity.commenter(), &body.content, body.parent_id)
        .await?;
    track(&state, EventKind::Comment, id, OptionalIdentity(Some(identity))).await;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        comment,
        "Comment submitted and awaiting moderation",
    )))
}

/// GET /api/admin/{posts|tutorials}
async fn list_all(
    state: web::Data<AppState>,
    kind: web::Data<ArticleKind>,
    _admin: AdminIdentity,
    query: web::Query<ArticleQuery>,
) -> AppResult<HttpResponse> {
    let kind = **kind;
    let articles = state.content.list(kind, &page(query.into_inner(), kind)).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(articles)))
}

/// POST /api/admin/{posts|tutorials}
async fn create(
    state: web::Data<AppState>,
    kind: web::Data<ArticleKind>,
    admin: AdminIdentity,
    body: web::Json<ArticleDraft>,
) -> AppResult<HttpResponse> {
    let author = Author {
        id: admin.user_id.clone(),
        name: admin.display_name(),
    };
    let article = state.content.create(**kind, body.into_inner(), author).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(article)))
}

/// GET /api/admin/{posts|tutorials}/{id}
async fn get_any(
    state: web::Data<AppState>,
    kind: web::Data<ArticleKind>,
    _admin: AdminIdentity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let article = state.content.get(**kind, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(article)))
}

/// PUT /api/admin/{posts|tutorials}/{id}
async fn update(
    state: web::Data<AppState>,
    kind: web::Data<ArticleKind>,
    _admin: AdminIdentity,
    id: web::Path<Uuid>,
    body: web::Json<ArticleDraft>,
) -> AppResult<HttpResponse> {
    let article = state
        .content
        .update(**kind, id.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(article)))
}

/// DELETE /api/admin/{posts|tutorials}/{id}
async fn delete(
    state: web::Data<AppState>,
    kind: web::Data<ArticleKind>,
    _admin: AdminIdentity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let kind = **kind;
    state.content.delete(kind, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message(format!("{} deleted", kind.label()))))
}
