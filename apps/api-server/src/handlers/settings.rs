//! Site settings.

use actix_web::{HttpResponse, web};
use serde_json::Value;

use quill_shared::ApiResponse;

use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(get_settings))
        .route("", web::put().to(update))
        .route("/reset", web::post().to(reset));
}

/// GET /api/settings
pub async fn get_settings(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let settings = state.settings.get().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(settings)))
}

/// PUT /api/admin/settings - body is a JSON merge patch.
async fn update(
    state: web::Data<AppState>,
    admin: AdminIdentity,
    patch: web::Json<Value>,
) -> AppResult<HttpResponse> {
    let settings = state.settings.update(&patch).await?;
    tracing::info!(admin = %admin.user_id, "Site settings updated");
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(settings, "Settings saved")))
}

async fn reset(state: web::Data<AppState>, admin: AdminIdentity) -> AppResult<HttpResponse> {
    let settings = state.settings.reset().await?;
    tracing::warn!(admin = %admin.user_id, "Site settings reset to defaults");
    Ok(HttpResponse::Ok().json(ApiResponse::ok(settings)))
}
