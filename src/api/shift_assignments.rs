use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::middleware::auth::{require_role, MANAGERS};
use crate::models::{
    AssignmentFilter, GenerateMonthRequest, GenerateMonthResponse, OverrideShiftRequest,
    SaveAssignmentRequest,
};
use crate::services::assignment_service;
use crate::services::auth_service::Claims;
use crate::state::AppState;
use crate::utils::AppError;

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub hospital_id: String,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub user_id: String,
    pub hospital_id: String,
    /// YYYY-MM-DD or a timestamp
    pub date: String,
}

pub async fn list_assignments(
    state: web::Data<AppState>,
    query: web::Query<AssignmentFilter>,
) -> Result<HttpResponse, AppError> {
    let rows = assignment_service::list_assignments(&state, &query).await?;
    Ok(HttpResponse::Ok().json(rows))
}

pub async fn month_assignments(
    state: web::Data<AppState>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, AppError> {
    let rows = assignment_service::month_assignments(&state, &query.hospital_id, query.year, query.month).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Responds with the assignment, or `null` when the user has none that day.
pub async fn resolve_assignment(
    state: web::Data<AppState>,
    query: web::Query<ResolveQuery>,
) -> Result<HttpResponse, AppError> {
    let row = assignment_service::resolve(&state, &query.user_id, &query.hospital_id, &query.date).await?;
    Ok(HttpResponse::Ok().json(row))
}

#[utoipa::path(
    post,
    path = "/api/shift-assignments/generate",
    tag = "Shift Assignments",
    request_body = GenerateMonthRequest,
    responses(
        (status = 200, description = "Month roster (generated or existing)", body = GenerateMonthResponse),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "Hospital not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn generate_month(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<GenerateMonthRequest>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, MANAGERS)?;
    log::info!(
        "📅 POST /shift-assignments/generate - {} {}-{:02}",
        request.hospital_id, request.year, request.month
    );
    let response = assignment_service::generate_month(&state, &claims.sub, &request).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn get_assignment(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(assignment_service::get_assignment(&state, &path).await?))
}

pub async fn save_assignment(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<SaveAssignmentRequest>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, MANAGERS)?;
    let (row, created) = assignment_service::save_assignment(&state, &claims.sub, &request).await?;
    Ok(if created {
        HttpResponse::Created().json(row)
    } else {
        HttpResponse::Ok().json(row)
    })
}

pub async fn override_shift(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<OverrideShiftRequest>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, MANAGERS)?;
    let row = assignment_service::override_shift(&state, &claims.sub, &path, request.shift).await?;
    Ok(HttpResponse::Ok().json(row))
}

pub async fn delete_assignment(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, MANAGERS)?;
    assignment_service::delete_assignment(&state, &claims.sub, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Shift assignment deleted successfully" })))
}
