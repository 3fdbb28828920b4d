//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `POST /api/ai/suggest`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSuggestRequest {
    pub prompt: String,
    #[serde(default)]
    pub context: Option<String>,
}

/// `POST /api/ai/summarize`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSummarizeRequest {
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiResponse {
    pub content: String,
    pub model: String,
    pub usage: AiUsage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecaptchaRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecaptchaResponse {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecaptchaResponse {
    pub fn skipped() -> Self {
        Self {
            verified: true,
            skipped: Some(true),
            ..Self::default()
        }
    }

    pub fn verified(score: Option<f64>) -> Self {
        Self {
            verified: true,
            score,
            ..Self::default()
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            verified: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// New reader comment. The author comes from the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub recaptcha_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventRequest {
    pub event: String,
    #[serde(default)]
    pub post_id: Option<Uuid>,
    #[serde(default)]
    pub post_title: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Admin comment listing filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListQuery {
    #[serde(default)]
    pub post_id: Option<Uuid>,
    #[serde(default)]
    pub approved: Option<bool>,
    #[serde(default)]
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitQuery {
    #[serde(default)]
    pub limit: Option<u64>,
}

/// `GET /api/admin/analytics/top`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopQuery {
    #[serde(default)]
    pub limit: Option<u64>,
    /// `views` (default) or `engagement`.
    #[serde(default)]
    pub by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: String,
}
