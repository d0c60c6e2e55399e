use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shift Attendance Service API",
        version = "1.0.0",
        description = "Hospital staff rostering and attendance.\n\n**Authentication:** every endpoint except login, register, health and metrics requires a JWT Bearer token.\n\n**Features:**\n- Default monthly roster generation\n- Per-day shift resolution and manual overrides\n- Clock-in / clock-out with worked minutes\n- Hospital QR clock-in tokens",
        contact(
            name = "Shift Attendance Team",
            email = "support@shift-attendance.local"
        )
    ),
    paths(
        // Auth
        crate::api::auth::login,
        crate::api::auth::register,
        crate::api::auth::profile,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,

        // Attendance
        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::status,

        // Roster
        crate::api::shift_assignments::generate_month,
    ),
    components(
        schemas(
            // Auth
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::AuthResponse,
            crate::models::UserInfo,
            crate::models::Role,

            // Health & Metrics
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,

            // Attendance
            crate::models::ClockRequest,
            crate::models::AttendanceRecord,
            crate::models::AttendanceStatus,
            crate::models::AttendanceStatusResponse,

            // Roster
            crate::models::ShiftType,
            crate::models::ShiftAssignment,
            crate::models::GenerateMonthRequest,
            crate::models::GenerateMonthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Login, self-registration (always STAFF) and the current user's profile."),
        (name = "Health", description = "Health check and Prometheus metrics."),
        (name = "Attendance", description = "Clock-in / clock-out and today's clock state for the authenticated user."),
        (name = "Shift Assignments", description = "Monthly roster generation. Generating an existing month returns it unchanged."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token from /api/auth/login"))
                        .build()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_core_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/api/auth/login",
            "/api/attendance/clock-in",
            "/api/shift-assignments/generate",
            "/health",
        ] {
            assert!(paths.iter().any(|p| p.as_str() == expected), "missing {}", expected);
        }
    }
}
