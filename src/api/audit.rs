use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::middleware::auth::{require_role, ADMINS};
use crate::services::audit_service;
use crate::services::auth_service::Claims;
use crate::state::AppState;
use crate::utils::AppError;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

pub async fn list_events(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    query: web::Query<AuditQuery>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, ADMINS)?;
    let events = audit_service::list(&state, query.limit).await?;
    Ok(HttpResponse::Ok().json(events))
}
