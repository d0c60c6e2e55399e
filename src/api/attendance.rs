use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::middleware::auth::{require_role, MANAGERS};
use crate::models::{
    AttendanceFilter, AttendanceRecord, AttendanceStatusResponse, ClockRequest, UpdateAttendanceRequest,
};
use crate::services::attendance_service;
use crate::services::auth_service::Claims;
use crate::state::AppState;
use crate::utils::AppError;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct QrQuery {
    pub hospital_id: Option<String>,
}

/// Staff get their own records regardless of the `user_id` filter.
pub async fn list_records(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    query: web::Query<AttendanceFilter>,
) -> Result<HttpResponse, AppError> {
    let records = attendance_service::list_records(&state, &claims, query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(records))
}

#[utoipa::path(
    post,
    path = "/api/attendance/clock-in",
    tag = "Attendance",
    request_body = ClockRequest,
    responses(
        (status = 201, description = "Clocked in", body = AttendanceRecord),
        (status = 400, description = "No shift to clock in for, or invalid QR code"),
        (status = 409, description = "Already clocked in")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn clock_in(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: Option<web::Json<ClockRequest>>,
) -> Result<HttpResponse, AppError> {
    let request = request.map(|r| r.into_inner()).unwrap_or_default();
    let record = attendance_service::clock_in(&state, &claims.sub, &request).await?;
    Ok(HttpResponse::Created().json(record))
}

#[utoipa::path(
    post,
    path = "/api/attendance/clock-out",
    tag = "Attendance",
    request_body = ClockRequest,
    responses(
        (status = 200, description = "Clocked out with worked minutes", body = AttendanceRecord),
        (status = 404, description = "No active clock-in found"),
        (status = 409, description = "Already clocked out")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn clock_out(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: Option<web::Json<ClockRequest>>,
) -> Result<HttpResponse, AppError> {
    let request = request.map(|r| r.into_inner()).unwrap_or_default();
    let record = attendance_service::clock_out(&state, &claims.sub, &request).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    get,
    path = "/api/attendance/status",
    tag = "Attendance",
    responses(
        (status = 200, description = "Today's clock state", body = AttendanceStatusResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn status(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(attendance_service::status(&state, &claims.sub).await?))
}

pub async fn history(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let records = attendance_service::history(&state, &claims.sub, query.from, query.to).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Token a hospital screen shows for QR clock-in.
pub async fn qr_token(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    query: web::Query<QrQuery>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, MANAGERS)?;
    let token = attendance_service::issue_qr_token(&state, &claims, query.into_inner().hospital_id).await?;
    Ok(HttpResponse::Ok().json(token))
}

pub async fn update_record(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateAttendanceRequest>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, MANAGERS)?;
    let record = attendance_service::update_record(&state, &claims.sub, &path, &request).await?;
    Ok(HttpResponse::Ok().json(record))
}
