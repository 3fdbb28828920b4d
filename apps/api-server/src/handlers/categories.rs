//! Category handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::CategoryDraft;
use quill_shared::ApiResponse;

use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

pub fn public_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(list))
        .route("/{slug}", web::get().to(get_by_slug));
}

pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(list))
        .route("", web::post().to(create))
        .route("/recalculate", web::post().to(recalculate))
        .route("/{id}", web::put().to(update))
        .route("/{id}", web::delete().to(delete));
}

/// GET /api/categories
async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let categories = state.categories.list().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(categories)))
}

/// GET /api/categories/{slug}
async fn get_by_slug(state: web::Data<AppState>, slug: web::Path<String>) -> AppResult<HttpResponse> {
    let category = state.categories.get_by_slug(&slug).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(category)))
}

async fn create(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    body: web::Json<CategoryDraft>,
) -> AppResult<HttpResponse> {
    let category = state.categories.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(category)))
}

async fn update(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    id: web::Path<Uuid>,
    body: web::Json<CategoryDraft>,
) -> AppResult<HttpResponse> {
    let category = state
        .categories
        .update(id.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(category)))
}

async fn delete(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.categories.delete(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Category deleted")))
}

/// POST /api/admin/categories/recalculate
async fn recalculate(state: web::Data<AppState>, admin: AdminIdentity) -> AppResult<HttpResponse> {
    let counts = state.categories.recalculate_counts().await?;
    tracing::info!(admin = %admin.user_id, categories = counts.len(), "Category recount requested");
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(counts, "Post counts updated")))
}
