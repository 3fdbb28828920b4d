//! Analytics: public event tracking and the admin dashboard queries.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use quill_core::domain::{EventKind, EventQuery};
use quill_core::services::TrackEvent;
use quill_shared::ApiResponse;
use quill_shared::dto::{LimitQuery, TopQuery, TrackEventRequest};

use crate::middleware::auth::{AdminIdentity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const DEFAULT_TOP: u64 = 5;
const MAX_TOP: u64 = 50;
const MAX_EVENTS: u64 = 500;

pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/summary", web::get().to(summary))
        .route("/top", web::get().to(top))
        .route("/categories", web::get().to(categories))
        .route("/activity", web::get().to(recent))
        .route("/events", web::get().to(events))
        .route("/users", web::get().to(users))
        .route("/users/{id}", web::get().to(user));
}

/// POST /api/analytics/events
///
/// Anonymous events are stored without a user; signed-in callers also update
/// their activity record.
pub async fn track(
    state: web::Data<AppState>,
    caller: OptionalIdentity,
    body: web::Json<TrackEventRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let kind: EventKind = body.event.parse().map_err(AppError::invalid)?;

    let event = state
        .analytics
        .track(TrackEvent {
            kind,
            post_id: body.post_id,
            post_title: body.post_title,
            metadata: body.metadata,
            profile: caller.0.as_ref().map(|identity| identity.profile()),
        })
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(event)))
}

async fn summary(state: web::Data<AppState>, _admin: AdminIdentity) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(state.analytics.summary().await?)))
}

/// GET /api/admin/analytics/top?limit=5&by=views|engagement
async fn top(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    query: web::Query<TopQuery>,
) -> AppResult<HttpResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP).clamp(1, MAX_TOP) as usize;
    let articles = match query.by.as_deref().unwrap_or("views") {
        "views" => state.analytics.top_by_views(limit).await?,
        "engagement" => state.analytics.top_by_engagement(limit).await?,
        other => {
            return Err(AppError::invalid(format!(
                "by must be 'views' or 'engagement', got '{other}'"
            )));
        }
    };
    Ok(HttpResponse::Ok().json(ApiResponse::ok(articles)))
}

async fn categories(state: web::Data<AppState>, _admin: AdminIdentity) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(state.analytics.category_stats().await?)))
}

async fn recent(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    query: web::Query<LimitQuery>,
) -> AppResult<HttpResponse> {
    let events = state
        .analytics
        .recent(query.limit.map(|l| l.min(MAX_EVENTS)))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(events)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventFilter {
    event: Option<String>,
    post_id: Option<Uuid>,
    user_id: Option<String>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    limit: Option<u64>,
}

/// GET /api/admin/analytics/events?event&postId&userId&since&until&limit
async fn events(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    filter: web::Query<EventFilter>,
) -> AppResult<HttpResponse> {
    let filter = filter.into_inner();
    let kind = filter
        .event
        .as_deref()
        .map(str::parse::<EventKind>)
        .transpose()
        .map_err(AppError::invalid)?;

    let events = state
        .analytics
        .events(&EventQuery {
            kind,
            post_id: filter.post_id,
            user_id: filter.user_id,
            since: filter.since,
            until: filter.until,
            limit: Some(filter.limit.unwrap_or(100).min(MAX_EVENTS)),
        })
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(events)))
}

async fn users(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    query: web::Query<LimitQuery>,
) -> AppResult<HttpResponse> {
    let users = state.analytics.users(query.limit.map(|l| l.min(MAX_TOP))).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(users)))
}

async fn user(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(state.analytics.user(&id).await?)))
}
