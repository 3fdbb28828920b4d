//! HTTP handlers and route configuration.

mod ai;
mod analytics;
mod articles;
mod categories;
mod comments;
mod health;
mod live;
mod recaptcha;
mod settings;

use actix_web::{ResponseError, web};
use quill_core::domain::ArticleKind;

use crate::middleware::error::AppError;
use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::state::AppState;

/// Malformed JSON, query strings and path segments become 400 problem documents.
fn extractor_configs(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(256 * 1024).error_handler(|err, _req| {
        actix_web::error::InternalError::from_response(
            err.to_string(),
            AppError::invalid(err.to_string()).error_response(),
        )
        .into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        actix_web::error::InternalError::from_response(
            err.to_string(),
            AppError::invalid(err.to_string()).error_response(),
        )
        .into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        actix_web::error::InternalError::from_response(
            err.to_string(),
            AppError::invalid(err.to_string()).error_response(),
        )
        .into()
    }));
}

fn kind_scope(path: &str, kind: ArticleKind) -> actix_web::Scope {
    web::scope(path).app_data(web::Data::new(kind))
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    extractor_configs(cfg);

    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            // AI routes apply their own per-user limit
            .service(
                web::scope("/ai")
                    .route("/suggest", web::post().to(ai::suggest))
                    .route("/summarize", web::post().to(ai::summarize)),
            )
            // Admin routes
            .service(
                web::scope("/admin")
                    .service(kind_scope("/posts", ArticleKind::Post).configure(articles::admin_routes))
                    .service(kind_scope("/tutorials", ArticleKind::Tutorial).configure(articles::admin_routes))
                    .service(web::scope("/categories").configure(categories::admin_routes))
                    .service(web::scope("/comments").configure(comments::admin_routes))
                    .service(web::scope("/analytics").configure(analytics::admin_routes))
                    .service(web::scope("/settings").configure(settings::admin_routes))
                    .route("/live/{collection}", web::get().to(live::live_feed)),
            )
            // Public routes; writes are rate limited per client IP
            .service(
                web::scope("")
                    .wrap(
                        RateLimitMiddleware::new(state.public_limiter.clone(), state.limits.public)
                            .trust_proxy_headers(state.limits.trust_proxy_headers),
                    )
                    .route("/verify-recaptcha", web::post().to(recaptcha::verify))
                    .route("/settings", web::get().to(settings::get_settings))
                    .route("/analytics/events", web::post().to(analytics::track))
                    .route("/comments/{id}/like", web::post().to(comments::like))
                    .service(kind_scope("/posts", ArticleKind::Post).configure(articles::public_routes))
                    .service(kind_scope("/tutorials", ArticleKind::Tutorial).configure(articles::public_routes))
                    .service(web::scope("/categories").configure(categories::public_routes)),
            ),
    );
}
