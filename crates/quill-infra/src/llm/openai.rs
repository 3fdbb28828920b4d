//! OpenAI-compatible chat completions provider.
//!
//! Works with the OpenAI API and any server exposing `/chat/completions`
//! with the same wire format.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use quill_core::ports::{ChatRole, Completion, CompletionRequest, LlmError, LlmProvider, TokenUsage};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OpenAIConfig {
    /// `None` when `OPENAI_API_KEY` is unset; the AI endpoints then report an internal error.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
        Some(Self {
            api_key,
            base_url: std::env::var("OPENAI_BASE_URL")
                .ok()
                .filter(|u| !u.is_empty())
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("OPENAI_MODEL")
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("OPENAI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        })
    }
}

pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to build HTTP client with custom timeout, using default client");
                Client::new()
            });

        Self { client, config }
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn to_openai_request(&self, request: CompletionRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: request.model.unwrap_or_else(|| self.config.model.clone()),
            messages: request
                .messages
                .into_iter()
                .map(|msg| OpenAIMessage {
                    role: match msg.role {
                        ChatRole::System => "system",
                        ChatRole::User => "user",
                        ChatRole::Assistant => "assistant",
                    }
                    .to_string(),
                    content: Some(msg.content),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

fn status_error(status: StatusCode, body: String) -> LlmError {
    match status.as_u16() {
        429 => LlmError::RateLimited(body),
        401 | 403 => LlmError::Authentication(body),
        s if s >= 500 => LlmError::ServiceUnavailable(body),
        _ => LlmError::InvalidResponse(format!("API error {status}: {body}")),
    }
}

fn parse_openai_response(response: OpenAIResponse) -> Result<Completion, LlmError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| LlmError::InvalidResponse("Response contained no message".to_string()))?;

    let usage = response
        .usage
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();

    Ok(Completion {
        content,
        model: response.model,
        usage,
    })
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn default_model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        let body = self.to_openai_request(request);
        debug!(model = %body.model, "Sending request to OpenAI-compatible API");

        let response = self
            .client
            .post(self.chat_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, "OpenAI API error: {}", text);
            return Err(status_error(status, text));
        }

        let parsed: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        parse_openai_response(parsed)
    }
}

// === OpenAI API Types ===

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::ports::ChatMessage;

    fn provider() -> OpenAIProvider {
        OpenAIProvider::new(OpenAIConfig {
            api_key: "sk-test".into(),
            base_url: "http://localhost:1/v1".into(),
            model: DEFAULT_MODEL.into(),
            timeout: Duration::from_secs(1),
        })
    }

    #[test]
    fn request_uses_default_model_and_role_names() {
        let body = provider().to_openai_request(CompletionRequest {
            model: None,
            messages: vec![ChatMessage::system("be brief"), ChatMessage::user("hi")],
            max_tokens: 200,
            temperature: 0.5,
        });

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["max_tokens"], 200);
    }

    #[test]
    fn response_is_mapped_to_completion() {
        let raw = serde_json::json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini-2024",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Try Rust."}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        });
        let completion = parse_openai_response(serde_json::from_value(raw).unwrap()).unwrap();

        assert_eq!(completion.content, "Try Rust.");
        assert_eq!(completion.model, "gpt-4o-mini-2024");
        assert_eq!(completion.usage.total_tokens, 15);
    }

    #[test]
    fn empty_choices_is_invalid() {
        let raw = serde_json::json!({"model": "m", "choices": []});
        let result = parse_openai_response(serde_json::from_value(raw).unwrap());
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn status_codes_map_to_error_kinds() {
        assert!(matches!(status_error(StatusCode::TOO_MANY_REQUESTS, String::new()), LlmError::RateLimited(_)));
        assert!(matches!(status_error(StatusCode::UNAUTHORIZED, String::new()), LlmError::Authentication(_)));
        assert!(matches!(status_error(StatusCode::BAD_GATEWAY, String::new()), LlmError::ServiceUnavailable(_)));
        assert!(matches!(status_error(StatusCode::BAD_REQUEST, String::new()), LlmError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let result = provider()
            .complete(CompletionRequest {
                model: None,
                messages: vec![ChatMessage::user("hi")],
                max_tokens: 10,
                temperature: 0.0,
            })
            .await;
        assert!(matches!(result, Err(LlmError::Network(_))));
    }
}
