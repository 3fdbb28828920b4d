//! Request ID middleware - tags every request and its error bodies with an ID.

use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{HeaderName, HeaderValue},
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use tracing::Instrument;
use uuid::Uuid;

/// Header name for request ID.
pub static REQUEST_ID_HEADER: &str = "X-Request-ID";

tokio::task_local! {
    static CURRENT_REQUEST_ID: String;
}

/// ID of the request being handled on this task, if any.
pub fn current_request_id() -> Option<String> {
    CURRENT_REQUEST_ID.try_with(Clone::clone).ok()
}

/// Middleware that generates a unique request ID for each request.
///
/// A client-supplied `X-Request-ID` is reused. The ID is echoed in the response
/// headers and recorded on the tracing span. Handlers and error responses read
/// it through [`current_request_id`].
pub struct RequestIdMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RequestIdMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestIdService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestIdService { service }))
    }
}

pub struct RequestIdService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestIdService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty() && v.len() <= 128)
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let span = tracing::info_span!("request", request_id = %request_id);
        let fut = CURRENT_REQUEST_ID.sync_scope(request_id.clone(), || self.service.call(req));

        Box::pin(
            CURRENT_REQUEST_ID.scope(
                request_id.clone(),
                async move {
                    let mut res = fut.await?;
                    res.headers_mut().insert(
                        HeaderName::from_static("x-request-id"),
                        HeaderValue::from_str(&request_id)
                            .unwrap_or_else(|_| HeaderValue::from_static("unknown")),
                    );
                    Ok(res)
                }
                .instrument(span),
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, test, web};

    async fn echo() -> HttpResponse {
        HttpResponse::Ok().body(current_request_id().unwrap_or_default())
    }

    #[actix_rt::test]
    async fn generates_and_exposes_an_id() {
        let app = test::init_service(App::new().wrap(RequestIdMiddleware).route("/", web::get().to(echo))).await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let header = res.headers().get("x-request-id").unwrap().to_str().unwrap().to_string();
        let body = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();

        assert!(Uuid::parse_str(&header).is_ok());
        assert_eq!(body, header);
    }

    #[actix_rt::test]
    async fn reuses_client_supplied_id() {
        let app = test::init_service(App::new().wrap(RequestIdMiddleware).route("/", web::get().to(echo))).await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((REQUEST_ID_HEADER, "lb-1234"))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.headers().get("x-request-id").unwrap(), "lb-1234");
    }
}
