use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    /// "memory" or "mongodb"
    pub storage: String,
    pub timestamp: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Storage backend unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let healthy = state.storage_healthy().await;
    let body = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: if state.config.is_mock() { "memory" } else { "mongodb" }.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    };

    if healthy {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
