//! Standardized API response types (RFC 7807 compliant for errors).

use serde::{Deserialize, Serialize};

/// Standard successful API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    /// A bare acknowledgement with no payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// RFC 7807 Problem Details for HTTP APIs, extended with a machine-readable `code`.
///
/// See: https://datatracker.ietf.org/doc/html/rfc7807
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub error_type: String,

    /// A short, human-readable summary of the problem type.
    pub title: String,

    /// The HTTP status code.
    pub status: u16,

    /// Stable error code, e.g. `VALIDATION_ERROR`.
    pub code: String,

    /// A human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Individual validation failures.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<String>,

    /// Request ID for debugging purposes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: u16, title: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error_type: "about:blank".to_string(),
            title: title.into(),
            status,
            code: code.into(),
            detail: None,
            errors: Vec::new(),
            request_id: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn validation(errors: Vec<String>) -> Self {
        Self::new(400, "Bad Request", "VALIDATION_ERROR")
            .with_detail("Validation failed")
            .with_errors(errors)
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(401, "Unauthorized", "AUTH_ERROR").with_detail(detail)
    }

    pub fn forbidden() -> Self {
        Self::new(403, "Forbidden", "FORBIDDEN").with_detail("Admin access required")
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(404, "Not Found", "NOT_FOUND").with_detail(detail)
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(409, "Conflict", "CONFLICT").with_detail(detail)
    }

    pub fn rate_limited(detail: impl Into<String>) -> Self {
        Self::new(429, "Too Many Requests", "RATE_LIMITED").with_detail(detail)
    }

    pub fn internal_error() -> Self {
        Self::new(500, "Internal Server Error", "INTERNAL_ERROR")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_document_shape() {
        let body = serde_json::to_value(
            ErrorResponse::validation(vec!["title is required".into()]).with_request_id("req-1"),
        )
        .unwrap();

        assert_eq!(body["type"], "about:blank");
        assert_eq!(body["status"], 400);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"][0], "title is required");
        assert_eq!(body["requestId"], "req-1");
    }

    #[test]
    fn empty_fields_are_omitted() {
        let body = serde_json::to_value(ErrorResponse::internal_error()).unwrap();
        assert!(body.get("detail").is_none());
        assert!(body.get("errors").is_none());
    }
}
