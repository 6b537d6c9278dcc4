//! Authentication middleware and extractors.
//!
//! Every request passes through [`AuthenticationMiddleware`] before routing.
//! Public paths go straight through; anything else must carry a bearer token
//! that verifies, binds to an active staff record and satisfies the access
//! policy, or the request is answered here without reaching a handler.

use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError,
    body::EitherBody,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{StatusCode, header},
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use gym_core::domain::Principal;
use gym_core::ports::{AuthError, TokenClaims};
use gym_core::services::{BoundIdentity, RequestAuthenticator};
use gym_shared::ErrorResponse;

use crate::observability::RequestId;

/// Authenticated staff identity extractor.
///
/// Only available on routes behind [`AuthenticationMiddleware`]:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.principal.subject)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub principal: Principal,
    pub claims: TokenClaims,
}

impl From<BoundIdentity> for Identity {
    fn from(bound: BoundIdentity) -> Self {
        Self {
            principal: bound.principal,
            claims: bound.claims,
        }
    }
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = req.extensions().get::<Identity>().cloned();

        ready(identity.ok_or_else(|| {
            // The route is public in the policy yet the handler wants a caller.
            tracing::warn!(path = %req.path(), "Identity requested on an unauthenticated route");
            AuthenticationError::new(AuthError::MissingAuth, req)
        }))
    }
}

/// Error type for authentication failures.
///
/// Response bodies are uniform: a caller learns whether it must
/// (re)authenticate or lacks the role, never which check failed.
#[derive(Debug)]
pub struct AuthenticationError {
    pub error: AuthError,
    path: String,
    request_id: Option<String>,
}

impl AuthenticationError {
    pub fn new(error: AuthError, req: &HttpRequest) -> Self {
        Self {
            error,
            path: req.path().to_string(),
            request_id: req
                .extensions()
                .get::<RequestId>()
                .map(|id| id.as_str().to_string()),
        }
    }
}

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match &self.error {
            AuthError::InsufficientRole => StatusCode::FORBIDDEN,
            AuthError::Signing(_) | AuthError::HashingError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let mut error = match status {
            StatusCode::FORBIDDEN => ErrorResponse::forbidden(),
            StatusCode::UNAUTHORIZED => ErrorResponse::unauthorized()
                .with_detail("A valid bearer token is required to access this resource."),
            _ => ErrorResponse::internal_error(),
        }
        .with_instance(self.path.clone());
        if let Some(id) = &self.request_id {
            error = error.with_request_id(id.clone());
        }

        let mut response = HttpResponse::build(status);
        if status == StatusCode::UNAUTHORIZED {
            let challenge = match self.error {
                AuthError::MissingAuth => "Bearer",
                _ => "Bearer error=\"invalid_token\"",
            };
            response.insert_header((header::WWW_AUTHENTICATE, challenge));
        }
        response.json(error)
    }
}

/// Authentication middleware factory.
pub struct AuthenticationMiddleware {
    authenticator: Arc<RequestAuthenticator>,
}

impl AuthenticationMiddleware {
    pub fn new(authenticator: Arc<RequestAuthenticator>) -> Self {
        Self { authenticator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthenticationMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthenticationMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticationMiddlewareService {
            service: Rc::new(service),
            authenticator: self.authenticator.clone(),
        }))
    }
}

pub struct AuthenticationMiddlewareService<S> {
    service: Rc<S>,
    authenticator: Arc<RequestAuthenticator>,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddlewareService<S>
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
        let authenticator = self.authenticator.clone();

        Box::pin(async move {
            // A header that is not visible ASCII cannot hold a bearer token.
            let authorization = req
                .headers()
                .get(header::AUTHORIZATION)
                .map(|value| value.to_str().unwrap_or_default().to_string());

            // Authorize the decoded path the router dispatches on, not the raw URI.
            let path = req.match_info().as_str().to_string();
            let outcome = authenticator
                .authenticate(&path, authorization.as_deref())
                .await;

            match outcome {
                Ok(bound) => {
                    if let Some(bound) = bound {
                        req.extensions_mut().insert(Identity::from(bound));
                    }
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(error) => {
                    let response = AuthenticationError::new(error, req.request()).error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}
