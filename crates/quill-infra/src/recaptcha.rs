//! reCAPTCHA v3 token verification against Google's siteverify endpoint.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

pub const VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";
/// Scores below this are treated as bots.
pub const MIN_SCORE: f64 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum RecaptchaError {
    #[error("Verification request failed: {0}")]
    Upstream(String),
}

/// Outcome of checking one token.
#[derive(Debug, Clone, PartialEq)]
pub enum RecaptchaOutcome {
    /// No secret is configured, so nothing was checked.
    Skipped,
    Verified { score: Option<f64> },
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingToken,
    Failed,
    ActionMismatch,
    LowScore,
}

impl RejectReason {
    pub fn message(self) -> &'static str {
        match self {
            RejectReason::MissingToken => "Missing reCAPTCHA token",
            RejectReason::Failed => "reCAPTCHA verification failed",
            RejectReason::ActionMismatch => "Action mismatch",
            RejectReason::LowScore => "Suspicious activity detected",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteVerifyResponse {
    pub success: bool,
    pub score: Option<f64>,
    pub action: Option<String>,
    #[serde(rename = "error-codes", default)]
    pub error_codes: Vec<String>,
}

/// Judge a siteverify response. An `expected_action` must match exactly; a missing score passes.
pub fn evaluate(response: &SiteVerifyResponse, expected_action: Option<&str>) -> RecaptchaOutcome {
    if !response.success {
        tracing::warn!(error_codes = ?response.error_codes, "reCAPTCHA verification failed");
        return RecaptchaOutcome::Rejected(RejectReason::Failed);
    }

    if let Some(expected) = expected_action {
        if response.action.as_deref() != Some(expected) {
            tracing::warn!(expected = %expected, got = ?response.action, "reCAPTCHA action mismatch");
            return RecaptchaOutcome::Rejected(RejectReason::ActionMismatch);
        }
    }

    if let Some(score) = response.score {
        if score < MIN_SCORE {
            tracing::warn!(score, "reCAPTCHA score too low");
            return RecaptchaOutcome::Rejected(RejectReason::LowScore);
        }
    }

    RecaptchaOutcome::Verified {
        score: response.score,
    }
}

pub struct RecaptchaVerifier {
    client: Client,
    secret: Option<String>,
    verify_url: String,
}

impl RecaptchaVerifier {
    pub fn new(secret: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to build HTTP client with custom timeout, using default client");
                Client::new()
            });

        Self {
            client,
            secret: secret.filter(|s| !s.trim().is_empty()),
            verify_url: VERIFY_URL.to_string(),
        }
    }

    /// Reads `RECAPTCHA_SECRET_KEY`.
    pub fn from_env() -> Self {
        Self::new(std::env::var("RECAPTCHA_SECRET_KEY").ok())
    }

    pub fn with_verify_url(mut self, url: impl Into<String>) -> Self {
        self.verify_url = url.into();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    pub async fn verify(
        &self,
        token: Option<&str>,
        expected_action: Option<&str>,
    ) -> Result<RecaptchaOutcome, RecaptchaError> {
        let Some(secret) = &self.secret else {
            return Ok(RecaptchaOutcome::Skipped);
        };
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(RecaptchaOutcome::Rejected(RejectReason::MissingToken));
        };

        let response: SiteVerifyResponse = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", secret.as_str()), ("response", token)])
            .send()
            .await
            .map_err(|e| RecaptchaError::Upstream(e.to_string()))?
            .json()
            .await
            .map_err(|e| RecaptchaError::Upstream(e.to_string()))?;

        Ok(evaluate(&response, expected_action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(success: bool, score: Option<f64>, action: Option<&str>) -> SiteVerifyResponse {
        SiteVerifyResponse {
            success,
            score,
            action: action.map(String::from),
            error_codes: Vec::new(),
        }
    }

    #[test]
    fn passes_good_score_and_matching_action() {
        let outcome = evaluate(&response(true, Some(0.9), Some("comment")), Some("comment"));
        assert_eq!(outcome, RecaptchaOutcome::Verified { score: Some(0.9) });
    }

    #[test]
    fn rejects_failure_mismatch_and_low_score() {
        assert_eq!(
            evaluate(&response(false, None, None), None),
            RecaptchaOutcome::Rejected(RejectReason::Failed)
        );
        assert_eq!(
            evaluate(&response(true, Some(0.9), Some("login")), Some("comment")),
            RecaptchaOutcome::Rejected(RejectReason::ActionMismatch)
        );
        assert_eq!(
            evaluate(&response(true, Some(0.3), None), None),
            RecaptchaOutcome::Rejected(RejectReason::LowScore)
        );
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(matches!(
            evaluate(&response(true, Some(0.5), None), None),
            RecaptchaOutcome::Verified { .. }
        ));
    }

    #[test]
    fn error_codes_deserialize() {
        let parsed: SiteVerifyResponse =
            serde_json::from_str(r#"{"success":false,"error-codes":["invalid-input-response"]}"#)
                .unwrap();
        assert_eq!(parsed.error_codes, vec!["invalid-input-response"]);
    }

    #[tokio::test]
    async fn skipped_without_secret() {
        let verifier = RecaptchaVerifier::new(None);
        assert_eq!(
            verifier.verify(Some("tok"), None).await.unwrap(),
            RecaptchaOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn missing_token_is_rejected_before_any_request() {
        let verifier = RecaptchaVerifier::new(Some("secret".into()));
        assert_eq!(
            verifier.verify(None, Some("comment")).await.unwrap(),
            RecaptchaOutcome::Rejected(RejectReason::MissingToken)
        );
    }

    #[tokio::test]
    async fn upstream_failure_is_an_error() {
        let verifier =
            RecaptchaVerifier::new(Some("secret".into())).with_verify_url("http://localhost:1/siteverify");
        assert!(verifier.verify(Some("tok"), None).await.is_err());
    }
}
