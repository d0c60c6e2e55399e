use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::middleware::auth::{require_role, MANAGERS};
use crate::models::{CreateShiftRequest, UpdateShiftRequest};
use crate::services::auth_service::Claims;
use crate::services::shift_service;
use crate::state::AppState;
use crate::utils::AppError;

#[derive(Debug, Deserialize)]
pub struct HospitalQuery {
    pub hospital_id: Option<String>,
}

pub async fn list_shifts(
    state: web::Data<AppState>,
    query: web::Query<HospitalQuery>,
) -> Result<HttpResponse, AppError> {
    let shifts = shift_service::list_shifts(&state, query.hospital_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(shifts))
}

pub async fn get_shift(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(shift_service::get_shift(&state, &path).await?))
}

pub async fn create_shift(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<CreateShiftRequest>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, MANAGERS)?;
    let shift = shift_service::create_shift(&state, &claims.sub, &request).await?;
    Ok(HttpResponse::Created().json(shift))
}

pub async fn update_shift(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateShiftRequest>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, MANAGERS)?;
    let shift = shift_service::update_shift(&state, &claims.sub, &path, &request).await?;
    Ok(HttpResponse::Ok().json(shift))
}

pub async fn delete_shift(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, MANAGERS)?;
    shift_service::delete_shift(&state, &claims.sub, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Shift deleted successfully" })))
}
