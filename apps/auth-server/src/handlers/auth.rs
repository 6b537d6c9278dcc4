//! Authentication handlers.

use actix_web::{HttpResponse, web};

use gym_shared::dto::{AuthResponse, LoginRequest, PrincipalResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.identifier.trim().is_empty() || req.secret.is_empty() {
        return Err(AppError::Unauthorized);
    }

    let issued = state
        .login
        .login(req.identifier.trim(), &req.secret)
        .await?;

    let expires_in = u64::try_from(state.login.token_ttl_seconds()).unwrap_or_default();

    Ok(HttpResponse::Ok().json(AuthResponse::bearer(issued.token, expires_in)))
}

/// POST /api/auth/logout - Protected route
pub async fn logout(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    state.authenticator.revoke(&identity.claims).await?;

    tracing::info!(token_id = %identity.claims.token_id, "Token revoked on logout");
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/auth/me - Protected route
pub async fn me(identity: Identity) -> AppResult<HttpResponse> {
    let principal = identity.principal;

    Ok(HttpResponse::Ok().json(PrincipalResponse {
        subject: principal.subject,
        role: principal.role.as_str().to_string(),
        active: principal.is_active,
    }))
}
