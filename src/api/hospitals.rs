use actix_web::{web, HttpResponse};

use crate::middleware::auth::{require_role, ADMINS};
use crate::models::{CreateHospitalRequest, UpdateHospitalRequest};
use crate::services::auth_service::Claims;
use crate::services::hospital_service;
use crate::state::AppState;
use crate::utils::AppError;

pub async fn list_hospitals(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(hospital_service::list_hospitals(&state).await?))
}

/// Includes the hospital's users and shift definitions.
pub async fn get_hospital(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(hospital_service::get_hospital(&state, &path).await?))
}

pub async fn create_hospital(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<CreateHospitalRequest>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, ADMINS)?;
    let hospital = hospital_service::create_hospital(&state, &claims.sub, &request).await?;
    Ok(HttpResponse::Created().json(hospital))
}

pub async fn update_hospital(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateHospitalRequest>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, ADMINS)?;
    let hospital = hospital_service::update_hospital(&state, &claims.sub, &path, &request).await?;
    Ok(HttpResponse::Ok().json(hospital))
}

pub async fn delete_hospital(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, ADMINS)?;
    hospital_service::delete_hospital(&state, &claims.sub, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Hospital deleted successfully" })))
}
