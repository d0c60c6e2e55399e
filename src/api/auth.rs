use actix_web::{web, HttpResponse};

use crate::services::auth_service::{self, AuthResponse, Claims, LoginRequest, RegisterRequest};
use crate::models::UserInfo;
use crate::state::AppState;
use crate::utils::AppError;

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔐 POST /auth/login - email: {}", request.email);
    let response = auth_service::login(&state, &request).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Missing required fields"),
        (status = 409, description = "User already exists")
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /auth/register - email: {}", request.email);
    let response = auth_service::register(&state, &request).await?;
    Ok(HttpResponse::Created().json(response))
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Missing or invalid token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn profile(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user = auth_service::profile(&state, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(user))
}
