//! Health check endpoint.

use actix_web::{HttpResponse, web};
use quill_shared::dto::HealthResponse;

use crate::state::AppState;

/// Health check endpoint - returns server status and the active storage backend.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.storage.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;

    use crate::handlers::testing::{state, test_app};

    #[actix_rt::test]
    async fn reports_in_memory_storage() {
        let app = test_app!(state().await);

        let res = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage"], "memory");
    }
}
