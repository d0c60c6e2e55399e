use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::middleware::auth::{require_role, ADMINS, MANAGERS};
use crate::models::UpdateUserRequest;
use crate::services::auth_service::Claims;
use crate::services::user_service;
use crate::state::AppState;
use crate::utils::AppError;

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub hospital_id: Option<String>,
}

pub async fn list_users(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, AppError> {
    let users = user_service::list_users(&state, query.hospital_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(users))
}

pub async fn get_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = user_service::get_user(&state, &path).await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn update_user(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, MANAGERS)?;
    let user = user_service::update_user(&state, &claims.sub, claims.role, &path, &request).await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn delete_user(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_role(&claims, ADMINS)?;
    user_service::delete_user(&state, &claims.sub, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "User deleted successfully" })))
}
