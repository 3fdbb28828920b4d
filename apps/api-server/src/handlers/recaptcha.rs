//! reCAPTCHA v3 token verification.

use actix_web::{HttpResponse, web};
use quill_infra::RecaptchaOutcome;
use quill_shared::dto::{RecaptchaRequest, RecaptchaResponse};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// POST /api/verify-recaptcha
pub async fn verify(state: web::Data<AppState>, body: web::Json<RecaptchaRequest>) -> HttpResponse {
    let body = body.into_inner();
    match state
        .recaptcha
        .verify(body.token.as_deref(), body.action.as_deref())
        .await
    {
        Ok(RecaptchaOutcome::Skipped) => HttpResponse::Ok().json(RecaptchaResponse::skipped()),
        Ok(RecaptchaOutcome::Verified { score }) => {
            HttpResponse::Ok().json(RecaptchaResponse::verified(score))
        }
        Ok(RecaptchaOutcome::Rejected(reason)) => {
            tracing::info!(reason = reason.message(), "reCAPTCHA rejected");
            HttpResponse::BadRequest().json(RecaptchaResponse::rejected(reason.message()))
        }
        Err(e) => {
            tracing::error!(error = %e, "reCAPTCHA verification error");
            HttpResponse::InternalServerError().json(RecaptchaResponse::rejected("Internal server error"))
        }
    }
}

/// Gate a write on a reCAPTCHA token for `action`. Passes when no secret is configured.
pub async fn require(state: &AppState, token: Option<&str>, action: &str) -> Result<(), AppError> {
    match state.recaptcha.verify(token, Some(action)).await {
        Ok(RecaptchaOutcome::Skipped | RecaptchaOutcome::Verified { .. }) => Ok(()),
        Ok(RecaptchaOutcome::Rejected(reason)) => Err(AppError::invalid(reason.message())),
        Err(e) => Err(AppError::Internal(format!("reCAPTCHA verification failed: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    use crate::handlers::testing::{state, test_app};

    #[actix_rt::test]
    async fn skipped_without_secret() {
        let app = test_app!(state().await);

        let req = test::TestRequest::post()
            .uri("/api/verify-recaptcha")
            .set_json(json!({ "token": "anything" }))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body, json!({ "verified": true, "skipped": true }));
    }
}
