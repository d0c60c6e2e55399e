use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static REQUEST_COUNT: AtomicU64 = AtomicU64::new(0);
static ERROR_COUNT: AtomicU64 = AtomicU64::new(0);
static CLOCK_EVENTS: AtomicU64 = AtomicU64::new(0);

pub fn increment_request_count() {
    REQUEST_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_error_count() {
    ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_clock_events() {
    CLOCK_EVENTS.fetch_add(1, Ordering::Relaxed);
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub http_requests_total: u64,
    pub http_errors_total: u64,
    pub attendance_clock_events_total: u64,
}

pub fn snapshot() -> MetricsResponse {
    MetricsResponse {
        http_requests_total: REQUEST_COUNT.load(Ordering::Relaxed),
        http_errors_total: ERROR_COUNT.load(Ordering::Relaxed),
        attendance_clock_events_total: CLOCK_EVENTS.load(Ordering::Relaxed),
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus text exposition", body = MetricsResponse)
    )
)]
pub async fn get_metrics() -> HttpResponse {
    let m = snapshot();

    let metrics = format!(
        "# HELP http_requests_total Total number of HTTP requests\n\
         # TYPE http_requests_total counter\n\
         http_requests_total {}\n\
         \n\
         # HELP http_errors_total Total number of HTTP errors\n\
         # TYPE http_errors_total counter\n\
         http_errors_total {}\n\
         \n\
         # HELP attendance_clock_events_total Successful clock-in and clock-out events\n\
         # TYPE attendance_clock_events_total counter\n\
         attendance_clock_events_total {}\n",
        m.http_requests_total, m.http_errors_total, m.attendance_clock_events_total
    );

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics)
}
