//! HTTP handlers and route configuration.

mod admin;
mod auth;
mod health;

use actix_web::{HttpResponse, web};
use gym_shared::ErrorResponse;

use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::state::AppState;

/// Configure all application routes.
///
/// Which of these need a caller, and which role, is decided by the access
/// policy in the authentication middleware, not here.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .service(
                        web::resource("/login")
                            .wrap(
                                RateLimitMiddleware::new(state.rate_limiter.clone())
                                    .trust_forwarded_headers(state.trust_proxy_headers),
                            )
                            .route(web::post().to(auth::login)),
                    )
                    .route("/logout", web::post().to(auth::logout))
                    .route("/me", web::get().to(auth::me)),
            ),
    )
    .service(
        web::scope("/admin")
            .route("/reportes", web::get().to(admin::reports))
            .route(
                "/staff/{identifier}/status",
                web::put().to(admin::update_status),
            ),
    )
    .route("/static/{asset:.*}", web::get().to(static_asset));
}

/// GET /static/... - no assets are bundled with this service.
async fn static_asset() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::not_found("Static asset not found"))
}
