//! Administrative handlers. Access is restricted to `ADMIN` by the policy,
//! before any of these run.

use actix_web::{HttpResponse, web};

use gym_core::domain::{AccountStatus, mask_identifier};
use gym_core::error::RepoError;
use gym_shared::dto::{ReportResponse, UpdateStatusRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /admin/reportes
pub async fn reports(identity: Identity) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ReportResponse {
        report: "staff-activity".to_string(),
        requested_by: identity.principal.subject,
        generated_at: chrono::Utc::now().to_rfc3339(),
    }))
}

/// PUT /admin/staff/{identifier}/status
pub async fn update_status(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> AppResult<HttpResponse> {
    let identifier = path.into_inner();
    let status: AccountStatus = body.status.parse()?;

    let updated = state
        .store
        .update_status(&identifier, status)
        .await
        .map_err(|e| match e {
            RepoError::NotFound => {
                AppError::NotFound(format!("Staff member {} not found", mask_identifier(&identifier)))
            }
            other => AppError::from(other),
        })?;

    tracing::info!(
        actor = %mask_identifier(&identity.principal.subject),
        identifier = %mask_identifier(&updated.identifier),
        status = %updated.status,
        "Staff status changed"
    );

    Ok(HttpResponse::NoContent().finish())
}
