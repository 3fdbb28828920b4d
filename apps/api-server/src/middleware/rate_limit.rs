//! Per-IP rate limiting for public write endpoints.

use actix_web::{
    Error, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::Method,
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use quill_core::ports::{RateLimitQuota, RateLimiter};

use crate::middleware::error::AppError;

/// Rate limiting middleware factory.
///
/// Only requests that write count against the quota; reads pass straight through.
/// Clients are keyed on the socket peer address unless proxy headers are trusted.
pub struct RateLimitMiddleware {
    limiter: Arc<dyn RateLimiter>,
    quota: RateLimitQuota,
    trust_proxy_headers: bool,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<dyn RateLimiter>, quota: RateLimitQuota) -> Self {
        Self {
            limiter,
            quota,
            trust_proxy_headers: false,
        }
    }

    pub fn trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
            quota: self.quota,
            trust_proxy_headers: self.trust_proxy_headers,
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Arc<dyn RateLimiter>,
    quota: RateLimitQuota,
    trust_proxy_headers: bool,
}

fn is_read(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn client_key(req: &ServiceRequest, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(ip) = req.connection_info().realip_remote_addr() {
            return ip.to_string();
        }
    }
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        if is_read(req.method()) {
            return Box::pin(async move { Ok(service.call(req).await?.map_into_left_body()) });
        }

        let limiter = self.limiter.clone();
        let quota = self.quota;
        let key = format!("public:{}", client_key(&req, self.trust_proxy_headers));

        Box::pin(async move {
            match limiter.check(&key, quota).await {
                Ok(result) if !result.allowed => {
                    tracing::warn!(key = %key, path = %req.path(), "Rate limit exceeded");
                    let response = AppError::RateLimited(result).error_response();
                    return Ok(req.into_response(response).map_into_right_body());
                }
                Ok(_) => {}
                // Fail open.
                Err(e) => tracing::error!(error = %e, "Rate limiter error, failing open"),
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}
