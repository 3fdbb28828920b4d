//! Writing assistant endpoints. Admin only, limited per user.

use actix_web::{HttpResponse, web};

use quill_core::ports::{Completion, RateLimitResult};
use quill_shared::dto::{AiResponse, AiSuggestRequest, AiSummarizeRequest, AiUsage};

use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::{AppError, AppResult, with_rate_limit_headers};
use crate::state::AppState;

/// POST /api/ai/suggest
pub async fn suggest(
    state: web::Data<AppState>,
    admin: AdminIdentity,
    body: web::Json<AiSuggestRequest>,
) -> AppResult<HttpResponse> {
    let quota = throttle(&state, &admin.user_id).await?;
    let completion = state
        .assistant()?
        .suggest(&body.prompt, body.context.as_deref())
        .await?;
    Ok(respond(completion, quota.as_ref()))
}

/// POST /api/ai/summarize
pub async fn summarize(
    state: web::Data<AppState>,
    admin: AdminIdentity,
    body: web::Json<AiSummarizeRequest>,
) -> AppResult<HttpResponse> {
    let quota = throttle(&state, &admin.user_id).await?;
    let completion = state.assistant()?.summarize(&body.content).await?;
    Ok(respond(completion, quota.as_ref()))
}

/// Count the call against the caller's shared AI allowance.
///
/// A limiter outage lets the request through.
async fn throttle(state: &AppState, user_id: &str) -> Result<Option<RateLimitResult>, AppError> {
    let key = format!("ai:{user_id}");
    match state.ai_limiter.check(&key, state.limits.ai).await {
        Ok(result) if result.allowed => Ok(Some(result)),
        Ok(result) => {
            tracing::warn!(user_id = %user_id, "AI rate limit exceeded");
            Err(AppError::RateLimited(result))
        }
        Err(e) => {
            tracing::error!(error = %e, "AI rate limiter unavailable, allowing request");
            Ok(None)
        }
    }
}

fn respond(completion: Completion, quota: Option<&RateLimitResult>) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    if let Some(quota) = quota {
        with_rate_limit_headers(&mut response, quota);
    }
    response.json(AiResponse {
        content: completion.content,
        model: completion.model,
        usage: AiUsage {
            prompt_tokens: completion.usage.prompt_tokens,
            completion_tokens: completion.usage.completion_tokens,
            total_tokens: completion.usage.total_tokens,
        },
    })
}
