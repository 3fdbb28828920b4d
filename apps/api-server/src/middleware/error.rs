//! Error handling - RFC 7807 problem documents with a stable `code`.

use actix_web::{HttpResponse, HttpResponseBuilder, ResponseError, http::StatusCode};
use quill_core::error::{DomainError, RepoError};
use quill_core::ports::RateLimitResult;
use quill_shared::ErrorResponse;
use std::fmt;

use crate::observability::current_request_id;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Validation(Vec<String>),
    Unauthorized(String),
    Forbidden,
    Conflict(String),
    RateLimited(RateLimitResult),
    Internal(String),
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors.join(", ")),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::RateLimited(_) => write!(f, "Rate limit exceeded"),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::Validation(errors) => ErrorResponse::validation(errors.clone()),
            AppError::Unauthorized(detail) => ErrorResponse::unauthorized(detail),
            AppError::Forbidden => ErrorResponse::forbidden(),
            AppError::Conflict(detail) => ErrorResponse::conflict(detail),
            AppError::RateLimited(limit) => ErrorResponse::rate_limited(format!(
                "Rate limit exceeded. Try again in {} seconds.",
                reset_secs(limit)
            )),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };
        let error = match current_request_id() {
            Some(id) => error.with_request_id(id),
            None => error,
        };

        let mut response = HttpResponse::build(self.status_code());
        if let AppError::RateLimited(limit) = self {
            with_rate_limit_headers(&mut response, limit);
            response.insert_header(("Retry-After", reset_secs(limit).to_string()));
        }
        response.json(error)
    }
}

/// Seconds until the window resets, rounded up so clients never retry early.
fn reset_secs(limit: &RateLimitResult) -> u64 {
    let reset = limit.reset_after;
    reset.as_secs() + u64::from(reset.subsec_nanos() > 0)
}

/// Attach `X-RateLimit-*` headers describing the caller's allowance.
pub fn with_rate_limit_headers<'a>(
    response: &'a mut HttpResponseBuilder,
    limit: &RateLimitResult,
) -> &'a mut HttpResponseBuilder {
    response
        .insert_header(("X-RateLimit-Limit", limit.limit.to_string()))
        .insert_header(("X-RateLimit-Remaining", limit.remaining.to_string()))
        .insert_header(("X-RateLimit-Reset", reset_secs(limit).to_string()))
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} '{}' not found", entity_type, id))
            }
            DomainError::Validation(errors) => AppError::Validation(errors),
            DomainError::Duplicate(msg) | DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::Unauthorized => AppError::Unauthorized("Authentication required".to_string()),
            DomainError::Forbidden => AppError::Forbidden,
            DomainError::Repository(e) => e.into(),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use std::time::Duration;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_rt::test]
    async fn domain_validation_becomes_400_with_every_message() {
        let err: AppError =
            DomainError::Validation(vec!["title is required".into(), "slug is invalid".into()]).into();
        let (status, body) = body_of(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    }

    #[actix_rt::test]
    async fn duplicate_and_conflict_share_409() {
        let (status, body) = body_of(DomainError::Duplicate("slug taken".into()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, _) = body_of(DomainError::Conflict("in use".into()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[actix_rt::test]
    async fn database_details_are_not_leaked() {
        let err: AppError = DomainError::Repository(RepoError::Query("relation posts missing".into())).into();
        let (status, body) = body_of(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(!body.to_string().contains("relation posts"));
    }

    #[test]
    fn rate_limited_response_carries_headers() {
        let response = AppError::RateLimited(RateLimitResult {
            allowed: false,
            limit: 10,
            remaining: 0,
            reset_after: Duration::from_millis(41_200),
        })
        .error_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let header = |name: &str| response.headers().get(name).unwrap().to_str().unwrap().to_string();
        assert_eq!(header("X-RateLimit-Limit"), "10");
        assert_eq!(header("X-RateLimit-Remaining"), "0");
        assert_eq!(header("X-RateLimit-Reset"), "42");
        assert_eq!(header("Retry-After"), "42");
    }
}
