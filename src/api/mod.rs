pub mod attendance;
pub mod audit;
pub mod auth;
pub mod health;
pub mod hospitals;
pub mod metrics;
pub mod rosters;
pub mod shift_assignments;
pub mod shifts;
pub mod swagger;
pub mod users;

use actix_web::web;

use crate::middleware::AuthMiddleware;
use crate::utils::AppError;

/// Registers every route. Static segments go before `/{id}` in each scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Malformed bodies, queries and paths answer 400 with the usual error body
        .app_data(web::JsonConfig::default().error_handler(|e, _| AppError::Validation(e.to_string()).into()))
        .app_data(web::QueryConfig::default().error_handler(|e, _| AppError::Validation(e.to_string()).into()))
        .app_data(web::PathConfig::default().error_handler(|e, _| AppError::Validation(e.to_string()).into()))
        // Health check
        .route("/health", web::get().to(health::health_check))
        .route("/api/health", web::get().to(health::health_check))
        // Metrics
        .route("/metrics", web::get().to(metrics::get_metrics))
        // Auth endpoints
        .service(
            web::scope("/api/auth")
                .route("/login", web::post().to(auth::login))
                .route("/register", web::post().to(auth::register))
                .service(
                    web::resource("/profile")
                        .wrap(AuthMiddleware)
                        .route(web::get().to(auth::profile)),
                ),
        )
        // Users
        .service(
            web::scope("/api/users")
                .wrap(AuthMiddleware)
                .route("", web::get().to(users::list_users))
                .route("/{id}", web::get().to(users::get_user))
                .route("/{id}", web::put().to(users::update_user))
                .route("/{id}", web::delete().to(users::delete_user)),
        )
        // Hospitals
        .service(
            web::scope("/api/hospitals")
                .wrap(AuthMiddleware)
                .route("", web::get().to(hospitals::list_hospitals))
                .route("", web::post().to(hospitals::create_hospital))
                .route("/{id}", web::get().to(hospitals::get_hospital))
                .route("/{id}", web::put().to(hospitals::update_hospital))
                .route("/{id}", web::delete().to(hospitals::delete_hospital)),
        )
        // Shift definitions
        .service(
            web::scope("/api/shifts")
                .wrap(AuthMiddleware)
                .route("", web::get().to(shifts::list_shifts))
                .route("", web::post().to(shifts::create_shift))
                .route("/{id}", web::get().to(shifts::get_shift))
                .route("/{id}", web::put().to(shifts::update_shift))
                .route("/{id}", web::delete().to(shifts::delete_shift)),
        )
        // Rosters
        .service(
            web::scope("/api/rosters")
                .wrap(AuthMiddleware)
                .route("", web::get().to(rosters::list_rosters))
                .route("", web::post().to(rosters::create_roster))
                .route("/{id}", web::get().to(rosters::get_roster))
                .route("/{id}", web::put().to(rosters::update_roster))
                .route("/{id}", web::delete().to(rosters::delete_roster)),
        )
        // Shift assignments
        .service(
            web::scope("/api/shift-assignments")
                .wrap(AuthMiddleware)
                .route("", web::get().to(shift_assignments::list_assignments))
                .route("", web::post().to(shift_assignments::save_assignment))
                .route("/month", web::get().to(shift_assignments::month_assignments))
                .route("/resolve", web::get().to(shift_assignments::resolve_assignment))
                .route("/generate", web::post().to(shift_assignments::generate_month))
                .route("/{id}", web::get().to(shift_assignments::get_assignment))
                .route("/{id}", web::put().to(shift_assignments::override_shift))
                .route("/{id}", web::delete().to(shift_assignments::delete_assignment)),
        )
        // Attendance
        .service(
            web::scope("/api/attendance")
                .wrap(AuthMiddleware)
                .route("", web::get().to(attendance::list_records))
                .route("/clock-in", web::post().to(attendance::clock_in))
                .route("/clock-out", web::post().to(attendance::clock_out))
                .route("/status", web::get().to(attendance::status))
                .route("/history", web::get().to(attendance::history))
                .route("/qr-token", web::get().to(attendance::qr_token))
                .route("/{id}", web::put().to(attendance::update_record)),
        )
        // Audit log
        .service(
            web::scope("/api/audit")
                .wrap(AuthMiddleware)
                .route("", web::get().to(audit::list_events)),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    use crate::config::test_config;
    use crate::seeds::mock_data_seed::{seeded_state, MOCK_PASSWORD};

    fn login_request(email: &str, password: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": email, "password": password }))
    }

    fn bearer(body: &Value) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", body["token"].as_str().unwrap_or_default()))
    }

    #[actix_web::test]
    async fn test_register_then_clock_in_and_out() {
        let state = web::Data::new(seeded_state(test_config()).await);
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "email": "New.Nurse@Example.com",
                "full_name": "New Nurse",
                "password": "s3cret",
                "hospital_id": "hosp-101"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["user"]["role"], "STAFF");
        assert_eq!(body["user"]["email"], "new.nurse@example.com");

        let login: Value = test::call_and_read_body_json(&app, login_request("new.nurse@example.com", "s3cret").to_request()).await;
        let auth = bearer(&login);

        let req = test::TestRequest::post()
            .uri("/api/attendance/clock-in")
            .insert_header(auth.clone())
            .set_json(json!({ "shift": "morning" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let record: Value = test::read_body_json(resp).await;
        assert_eq!(record["status"], "IN");
        assert_eq!(record["hospital_id"], "hosp-101");

        let req = test::TestRequest::post()
            .uri("/api/attendance/clock-in")
            .insert_header(auth.clone())
            .set_json(json!({ "shift": "morning" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Already clocked in" }));

        let req = test::TestRequest::post()
            .uri("/api/attendance/clock-out")
            .insert_header(auth.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let record: Value = test::read_body_json(resp).await;
        assert_eq!(record["status"], "OUT");
        assert_eq!(record["shift"], "morning");
        assert!(record["duration_minutes"].as_i64().unwrap() >= 0);

        let req = test::TestRequest::get()
            .uri("/api/attendance/status")
            .insert_header(auth)
            .to_request();
        let status: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(status["is_clocked_in"], false);
        assert_eq!(status["records"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn test_protected_routes_need_a_token() {
        let state = web::Data::new(seeded_state(test_config()).await);
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/attendance/status").to_request();
        let err = test::try_call_service(&app, req).await.err().unwrap();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/auth/profile")
            .insert_header(("Authorization", "Token abc"))
            .to_request();
        let err = test::try_call_service(&app, req).await.err().unwrap();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/users")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        let err = test::try_call_service(&app, req).await.err().unwrap();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_generate_is_manager_only() {
        let state = web::Data::new(seeded_state(test_config()).await);
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let payload = json!({ "hospital_id": "hosp-102", "year": 2024, "month": 2 });

        let staff: Value = test::call_and_read_body_json(&app, login_request("alice@example.com", MOCK_PASSWORD).to_request()).await;
        let req = test::TestRequest::post()
            .uri("/api/shift-assignments/generate")
            .insert_header(bearer(&staff))
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Insufficient permissions");

        let manager: Value =
            test::call_and_read_body_json(&app, login_request("bob.manager@example.com", MOCK_PASSWORD).to_request()).await;
        let req = test::TestRequest::post()
            .uri("/api/shift-assignments/generate")
            .insert_header(bearer(&manager))
            .set_json(&payload)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        // Maria is hosp-102's only staff member; February 2024 has 29 days
        assert_eq!(body["generated"], true);
        assert_eq!(body["count"], 29);

        let req = test::TestRequest::get()
            .uri("/api/shift-assignments/resolve?user_id=3&hospital_id=hosp-102&date=2024-02-10")
            .insert_header(bearer(&manager))
            .to_request();
        let row: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(row["date"], "2024-02-10");
        assert_eq!(row["manually_assigned"], false);
    }

    #[actix_web::test]
    async fn test_login_rejects_wrong_password() {
        let state = web::Data::new(seeded_state(test_config()).await);
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let resp = test::call_service(&app, login_request("alice@example.com", "nope").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid credentials");
    }

    #[actix_web::test]
    async fn test_malformed_input_gets_json_400() {
        let state = web::Data::new(seeded_state(test_config()).await);
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": 5 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());

        let manager: Value =
            test::call_and_read_body_json(&app, login_request("bob.manager@example.com", MOCK_PASSWORD).to_request()).await;
        let req = test::TestRequest::get()
            .uri("/api/shift-assignments/month?hospital_id=hosp-101&year=abc&month=1")
            .insert_header(bearer(&manager))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }
}
