//! Live collection snapshots over Server-Sent Events.
//!
//! The client receives the full collection once on connect and again after
//! every change. Closing the connection drops the feed subscription.

use std::convert::Infallible;

use actix_web::{HttpResponse, http::header, web};
use futures::future::BoxFuture;
use futures::stream::{BoxStream, StreamExt};
use serde_json::Value;

use quill_core::DomainError;
use quill_core::domain::{ArticleKind, ArticleQuery, Collection, CommentQuery};
use quill_core::services::live::snapshots;

use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const COMMENT_SNAPSHOT_LIMIT: u64 = 200;

type Frames = BoxStream<'static, Result<web::Bytes, Infallible>>;

/// GET /api/admin/live/{collection}
pub async fn live_feed(
    state: web::Data<AppState>,
    admin: AdminIdentity,
    collection: web::Path<String>,
) -> AppResult<HttpResponse> {
    let collection: Collection = collection.parse().map_err(AppError::invalid)?;
    let frames = frames(state.get_ref().clone(), collection).await?;
    tracing::info!(collection = %collection, admin = %admin.user_id, "Live feed opened");

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(frames))
}

async fn frames(state: AppState, collection: Collection) -> Result<Frames, AppError> {
    let changes = state.feed.subscribe(collection).await.map_err(|e| {
        AppError::Internal(format!("Change feed subscription failed: {e}"))
    })?;

    let loader = move || -> BoxFuture<'static, Result<Value, DomainError>> {
        let state = state.clone();
        Box::pin(async move { load(&state, collection).await })
    };

    Ok(snapshots(changes, loader)
        .map(move |snapshot| {
            let frame = match snapshot {
                Ok(value) => sse_frame("snapshot", &value.to_string()),
                Err(e) => {
                    tracing::error!(collection = %collection, error = %e, "Live snapshot failed");
                    sse_frame("error", &Value::String(e.to_string()).to_string())
                }
            };
            Ok(web::Bytes::from(frame))
        })
        .boxed())
}

async fn load(state: &AppState, collection: Collection) -> Result<Value, DomainError> {
    let everything = ArticleQuery::default();
    let value = match collection {
        Collection::Posts => serde_json::to_value(state.content.list(ArticleKind::Post, &everything).await?),
        Collection::Tutorials => {
            serde_json::to_value(state.content.list(ArticleKind::Tutorial, &everything).await?)
        }
        Collection::Categories => serde_json::to_value(state.categories.list().await?),
        Collection::Comments => serde_json::to_value(
            state
                .moderation
                .list(&CommentQuery {
                    limit: Some(COMMENT_SNAPSHOT_LIMIT),
                    ..CommentQuery::default()
                })
                .await?,
        ),
        Collection::Settings => serde_json::to_value(state.settings.get().await?),
    };
    value.map_err(|e| DomainError::Internal(e.to_string()))
}

/// One SSE message. Multi-line payloads become one `data:` line each.
fn sse_frame(event: &str, data: &str) -> String {
    let mut frame = format!("event: {event}\n");
    for line in data.split('\n') {
        frame.push_str("data: ");
        frame.push_str(line);
        frame.push('\n');
    }
    frame.push('\n');
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};

    use crate::handlers::testing::{ADMIN, READER, seed_category, state, test_app};

    fn payload(frame: &[u8]) -> Value {
        let text = std::str::from_utf8(frame).unwrap();
        let data = text
            .lines()
            .find_map(|line| line.strip_prefix("data: "))
            .unwrap();
        serde_json::from_str(data).unwrap()
    }

    #[actix_rt::test]
    async fn frames_split_multiline_data() {
        assert_eq!(sse_frame("snapshot", "[]"), "event: snapshot\ndata: []\n\n");
        assert_eq!(sse_frame("error", "a\nb"), "event: error\ndata: a\ndata: b\n\n");
    }

    #[actix_rt::test]
    async fn snapshot_then_fresh_snapshot_after_change() {
        let state = state().await;
        seed_category(&state, "tech").await;
        let mut frames = frames(state.clone(), Collection::Categories).await.unwrap();

        let first = frames.next().await.unwrap().unwrap();
        assert_eq!(payload(&first).as_array().unwrap().len(), 1);

        seed_category(&state, "life").await;
        let second = frames.next().await.unwrap().unwrap();
        assert_eq!(payload(&second).as_array().unwrap().len(), 2);
    }

    #[actix_rt::test]
    async fn endpoint_streams_event_stream_for_admins() {
        let app = test_app!(state().await);

        let req = test::TestRequest::get()
            .uri("/api/admin/live/settings")
            .insert_header(("Authorization", ADMIN))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers().get("content-type").unwrap(), "text/event-stream");

        let req = test::TestRequest::get()
            .uri("/api/admin/live/settings")
            .insert_header(("Authorization", READER))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_rt::test]
    async fn unknown_collection_is_rejected() {
        let app = test_app!(state().await);

        let req = test::TestRequest::get()
            .uri("/api/admin/live/users")
            .insert_header(("Authorization", ADMIN))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
