//! Login rate limiting middleware.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use gym_shared::ErrorResponse;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use gym_core::ports::RateLimiter;

/// Rate limiting middleware factory, keyed by client IP.
///
/// The key is the socket peer address unless `trust_forwarded_headers` is
/// set, in which case `Forwarded` / `X-Forwarded-For` from the fronting proxy
/// are used. Those headers are client-controlled without such a proxy.
pub struct RateLimitMiddleware {
    limiter: Arc<dyn RateLimiter>,
    trust_forwarded_headers: bool,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            limiter,
            trust_forwarded_headers: false,
        }
    }

    pub fn trust_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }
}

fn client_key(req: &ServiceRequest, trust_forwarded_headers: bool) -> String {
    if trust_forwarded_headers {
        if let Some(addr) = req.connection_info().realip_remote_addr() {
            return addr.to_string();
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
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
            trust_forwarded_headers: self.trust_forwarded_headers,
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Arc<dyn RateLimiter>,
    trust_forwarded_headers: bool,
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
        let service = self.service.clone();
        let limiter = self.limiter.clone();

        let key = client_key(&req, self.trust_forwarded_headers);

        Box::pin(async move {
            match limiter.check(&key).await {
                Ok(result) if !result.allowed => {
                    let retry_after = result.reset_after.as_secs().max(1);
                    tracing::warn!(client = %key, retry_after, "Login rate limit exceeded");

                    let response = HttpResponse::TooManyRequests()
                        .insert_header(("X-RateLimit-Remaining", "0"))
                        .insert_header(("Retry-After", retry_after.to_string()))
                        .json(ErrorResponse::too_many_requests(retry_after));

                    return Ok(req.into_response(response).map_into_right_body());
                }
                Ok(result) => {
                    tracing::trace!(client = %key, remaining = result.remaining, "Login attempt allowed");
                }
                // Throttling is abuse protection, not an access decision.
                Err(e) => tracing::error!(error = %e, "Rate limiter error, failing open"),
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_forwarded_headers_ignored_unless_trusted() {
        let req = TestRequest::default()
            .peer_addr("192.0.2.7:51234".parse().unwrap())
            .insert_header(("X-Forwarded-For", "10.9.9.1"))
            .to_srv_request();

        assert_eq!(client_key(&req, false), "192.0.2.7");
        assert_eq!(client_key(&req, true), "10.9.9.1");
    }

    #[test]
    fn test_port_is_not_part_of_the_key() {
        let a = TestRequest::default()
            .peer_addr("192.0.2.7:1000".parse().unwrap())
            .to_srv_request();
        let b = TestRequest::default()
            .peer_addr("192.0.2.7:2000".parse().unwrap())
            .to_srv_request();

        assert_eq!(client_key(&a, false), client_key(&b, false));
    }
}
