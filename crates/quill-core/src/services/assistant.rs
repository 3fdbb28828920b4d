//! Writing assistant: content suggestions and summaries from an LLM.

use std::sync::Arc;

use crate::error::DomainError;
use crate::ports::{ChatMessage, Completion, CompletionRequest, LlmProvider};
use crate::validation::{CONTEXT_MAX, PROMPT_MAX, SUMMARY_SOURCE_MAX, Violations};

const SUGGEST_SYSTEM_PROMPT: &str = "You are a helpful writing assistant for a tech and lifestyle blog. \
Help the author with ideas, outlines, titles and clear, engaging prose. \
Keep suggestions concise and practical.";

const SUMMARIZE_SYSTEM_PROMPT: &str = "You are a summarization assistant. \
Write a concise 2-3 sentence summary of the blog post you are given, suitable as an excerpt.";

pub struct AssistantService {
    llm: Arc<dyn LlmProvider>,
}

impl AssistantService {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    pub async fn suggest(&self, prompt: &str, context: Option<&str>) -> Result<Completion, DomainError> {
        let mut violations = Violations::new();
        violations.required("prompt", prompt, PROMPT_MAX);
        if let Some(context) = context {
            violations.at_most("context", context, CONTEXT_MAX);
        }
        violations.into_result()?;

        let user = match context.map(str::trim).filter(|c| !c.is_empty()) {
            Some(context) => format!("Context: {context}\n\nRequest: {prompt}"),
            None => prompt.to_string(),
        };

        self.run(CompletionRequest {
            model: None,
            messages: vec![ChatMessage::system(SUGGEST_SYSTEM_PROMPT), ChatMessage::user(user)],
            max_tokens: 1000,
            temperature: 0.7,
        })
        .await
    }

    pub async fn summarize(&self, content: &str) -> Result<Completion, DomainError> {
        let mut violations = Violations::new();
        violations.required("content", content, SUMMARY_SOURCE_MAX);
        violations.into_result()?;

        self.run(CompletionRequest {
            model: None,
            messages: vec![
                ChatMessage::system(SUMMARIZE_SYSTEM_PROMPT),
                ChatMessage::user(format!("Please summarize this blog post content:\n\n{content}")),
            ],
            max_tokens: 200,
            temperature: 0.5,
        })
        .await
    }

    async fn run(&self, request: CompletionRequest) -> Result<Completion, DomainError> {
        match self.llm.complete(request).await {
            Ok(completion) => {
                tracing::info!(
                    model = %completion.model,
                    total_tokens = completion.usage.total_tokens,
                    "AI completion generated"
                );
                Ok(completion)
            }
            Err(e) => {
                tracing::error!(error = %e, model = %self.llm.default_model(), "AI completion failed");
                Err(DomainError::Internal("AI request failed".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{LlmError, TokenUsage};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLlm {
        requests: Mutex<Vec<CompletionRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for RecordingLlm {
        async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
            self.requests.lock().unwrap().push(request);
            if self.fail {
                return Err(LlmError::ServiceUnavailable("down".into()));
            }
            Ok(Completion {
                content: "ok".into(),
                model: "test-model".into(),
                usage: TokenUsage::default(),
            })
        }

        fn default_model(&self) -> &str {
            "test-model"
        }
    }

    #[tokio::test]
    async fn suggest_prefixes_context() {
        let llm = Arc::new(RecordingLlm::default());
        let assistant = AssistantService::new(llm.clone());

        assistant.suggest("Title ideas", Some("A post about Rust")).await.unwrap();

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests[0].max_tokens, 1000);
        assert_eq!(
            requests[0].messages[1].content,
            "Context: A post about Rust\n\nRequest: Title ideas"
        );
    }

    #[tokio::test]
    async fn summarize_uses_short_budget() {
        let llm = Arc::new(RecordingLlm::default());
        let assistant = AssistantService::new(llm.clone());

        assistant.summarize("Long text").await.unwrap();

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests[0].max_tokens, 200);
        assert!((requests[0].temperature - 0.5).abs() < f64::EPSILON);
        assert!(requests[0].messages[1].content.ends_with("Long text"));
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_provider() {
        let llm = Arc::new(RecordingLlm::default());
        let assistant = AssistantService::new(llm.clone());

        let empty = assistant.suggest("   ", None).await;
        let too_long = assistant.suggest(&"x".repeat(PROMPT_MAX + 1), None).await;

        assert!(matches!(empty, Err(DomainError::Validation(_))));
        assert!(matches!(too_long, Err(DomainError::Validation(_))));
        assert!(llm.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_errors_become_internal() {
        let llm = Arc::new(RecordingLlm {
            fail: true,
            ..RecordingLlm::default()
        });
        let assistant = AssistantService::new(llm);

        let result = assistant.summarize("text").await;
        assert!(matches!(result, Err(DomainError::Internal(_))));
    }
}
