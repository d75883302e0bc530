use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all capture catalog metrics
const PREFIX: &str = "capture_catalog";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Authentication Metrics
    pub static ref AUTH_LOGIN_ATTEMPTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_auth_login_attempts_total"), "Total login attempts"),
        &["status"]
    ).expect("Failed to create auth_login_attempts_total metric");

    // Catalog Metrics
    pub static ref CATALOG_ITEMS_TOTAL: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_catalog_items_total"), "Total items in catalog"),
        &["type"]
    ).expect("Failed to create catalog_items_total metric");

    pub static ref CAPTURE_MUTATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_capture_mutations_total"),
            "Capture create/update/delete requests by outcome"
        ),
        &["operation", "outcome"]
    ).expect("Failed to create capture_mutations_total metric");
}

/// Register all metrics with the Prometheus registry.
/// Registering twice is harmless, tests rely on that.
pub fn init_metrics() {
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(AUTH_LOGIN_ATTEMPTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_ITEMS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CAPTURE_MUTATIONS_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

pub fn set_catalog_metrics(num_captures: usize, num_artists: usize) {
    CATALOG_ITEMS_TOTAL
        .with_label_values(&["capture"])
        .set(num_captures as f64);
    CATALOG_ITEMS_TOTAL
        .with_label_values(&["artist"])
        .set(num_artists as f64);
}

/// Maps a request path to a low-cardinality label.
pub fn categorize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "home",
        "/artists" => "artists",
        "/captures/add" => "capture_add",
        _ if path.starts_with("/captures/edit/") => "capture_edit",
        _ if path.starts_with("/captures/delete/") => "capture_delete",
        _ if path == "/captures" || path == "/captures/" => "captures",
        _ if path.starts_with("/captures/") => "capture_detail",
        _ if path.starts_with("/v1/auth/") => "auth",
        _ => "other",
    }
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

pub fn record_login_attempt(status: &str) {
    AUTH_LOGIN_ATTEMPTS_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_capture_mutation(operation: &str, outcome: &str) {
    CAPTURE_MUTATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_family(name: &str) -> Option<prometheus::proto::MetricFamily> {
        REGISTRY
            .gather()
            .into_iter()
            .find(|m| m.get_name() == format!("{PREFIX}_{name}"))
    }

    #[test]
    fn test_metrics_initialization() {
        init_metrics();
        init_metrics();
        assert!(!REGISTRY.gather().is_empty(), "Metrics should be registered");
    }

    #[test]
    fn test_record_http_request() {
        init_metrics();
        record_http_request("GET", "captures", 200, Duration::from_millis(50));
        assert!(find_family("http_requests_total").is_some());
        assert!(find_family("http_request_duration_seconds").is_some());
    }

    #[test]
    fn test_record_login_and_mutations() {
        init_metrics();
        record_login_attempt("success");
        record_capture_mutation("delete", "denied");
        assert!(find_family("auth_login_attempts_total").is_some());
        assert!(find_family("capture_mutations_total").is_some());
    }

    #[test]
    fn test_catalog_metrics() {
        init_metrics();
        set_catalog_metrics(12, 3);
        let artists = CATALOG_ITEMS_TOTAL.with_label_values(&["artist"]).get();
        assert_eq!(artists, 3.0);
        assert!(find_family("catalog_items_total").is_some());
    }

    #[test]
    fn test_categorize_endpoint() {
        assert_eq!(categorize_endpoint("/"), "home");
        assert_eq!(categorize_endpoint("/captures/"), "captures");
        assert_eq!(categorize_endpoint("/captures/7"), "capture_detail");
        assert_eq!(categorize_endpoint("/captures/add"), "capture_add");
        assert_eq!(categorize_endpoint("/captures/edit/7"), "capture_edit");
        assert_eq!(categorize_endpoint("/captures/delete/7"), "capture_delete");
        assert_eq!(categorize_endpoint("/v1/auth/login"), "auth");
        assert_eq!(categorize_endpoint("/favicon.ico"), "other");
    }
}
