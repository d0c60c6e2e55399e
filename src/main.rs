mod api;
mod config;
mod database;
mod middleware;
mod models;
mod repositories;
mod seeds;
mod services;
mod state;
mod utils;

use actix_cors::Cors;
use actix_web::{dev::Service, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{AppConfig, StorageBackend};
use crate::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("❌ Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    log::info!("🚀 Starting Shift Attendance Service...");

    let state = match &config.storage {
        StorageBackend::Memory => {
            log::warn!("🧪 USE_MOCK enabled, data lives in memory and is lost on restart");
            let state = AppState::in_memory(config.clone());
            seeds::mock_data_seed::seed_mock_data(&state)
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            state
        }
        StorageBackend::MongoDB { url } => {
            let db = database::MongoDB::new(url).await.map_err(|e| {
                log::error!("❌ Failed to connect to MongoDB: {}", e);
                io::Error::new(io::ErrorKind::Other, e.to_string())
            })?;
            log::info!("✅ MongoDB connected successfully");
            AppState::with_mongodb(config.clone(), db)
        }
    };

    seeds::mock_data_seed::seed_admin(&state)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let state = web::Data::new(state);
    let host = config.host.clone();
    let port = config.port;

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    HttpServer::new(move || {
        let cors = config
            .cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(state.clone())
            .wrap_fn(|req, srv| {
                api::metrics::increment_request_count();
                srv.call(req)
            })
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi),
            )
            .configure(api::configure)
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
