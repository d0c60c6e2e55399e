use actix_web::{web, HttpResponse};

use crate::api::shifts::HospitalQuery;
use crate::middleware::auth::{require_role, MANAGERS};
use crate::models::{CreateRosterRequest, UpdateRosterRequest};
use crate::services::auth_service::Claims;
use crate::services::roster_service;
use crate::state::AppState;
use crate::utils::AppError;

pub async fn list_rosters(
    state: web::Data<AppState>,
    query: web::Query<HospitalQuery>,
) -> Result<HttpResponse, AppError> {
    let rosters = roster_service::list_rosters(&state, query.hospital_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(rosters))
}

pub async fn get_roster(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(roster_service::get_roster(&state, &path).await?))
}

pub async fn create_roster(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<CreateRosterRequest>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, MANAGERS)?;
    let roster = roster_service::create_roster(&state, &claims.sub, &request).await?;
    Ok(HttpResponse::Created().json(roster))
}

pub async fn update_roster(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateRosterRequest>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, MANAGERS)?;
    let roster = roster_service::update_roster(&state, &claims.sub, &path, &request).await?;
    Ok(HttpResponse::Ok().json(roster))
}

pub async fn delete_roster(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, MANAGERS)?;
    roster_service::delete_roster(&state, &claims.sub, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Roster deleted successfully" })))
}
