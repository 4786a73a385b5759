use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all model portal metrics
const PREFIX: &str = "modelhub";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Catalog
    pub static ref MODEL_INVOCATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_model_invocations_total"), "Recorded model invocations"),
        &["category", "tracked"]
    ).expect("Failed to create model_invocations_total metric");

    pub static ref CATALOG_MODELS_TOTAL: Gauge = Gauge::new(
        format!("{PREFIX}_catalog_models_total"),
        "Number of models in the catalog"
    ).expect("Failed to create catalog_models_total metric");

    // Recommendations
    pub static ref RECOMMENDATIONS_SERVED_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_recommendations_served_total"), "Recommendation lists served"),
        &["mode"]
    ).expect("Failed to create recommendations_served_total metric");

    // Badges
    pub static ref BADGE_PROGRESS_INCREMENTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_badge_progress_increments_total"),
            "Explicit badge progress increments"
        ),
        &["badge_type"]
    ).expect("Failed to create badge_progress_increments_total metric");

    pub static ref BADGES_EARNED_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_badges_earned_total"), "Newly earned badges"),
        &["badge_type"]
    ).expect("Failed to create badges_earned_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Already-registered errors are expected when tests call this repeatedly
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(MODEL_INVOCATIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_MODELS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(RECOMMENDATIONS_SERVED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(BADGE_PROGRESS_INCREMENTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(BADGES_EARNED_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

pub fn set_catalog_size(num_models: usize) {
    CATALOG_MODELS_TOTAL.set(num_models as f64);
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// `tracked` tells whether the invocation also updated a user's preferences.
pub fn record_model_invocation(category: &str, tracked: bool) {
    let tracked = if tracked { "user" } else { "anonymous" };
    MODEL_INVOCATIONS_TOTAL
        .with_label_values(&[category, tracked])
        .inc();
}

/// `mode` is one of "personalized", "popular", "similar", "accessible".
pub fn record_recommendations_served(mode: &str) {
    RECOMMENDATIONS_SERVED_TOTAL.with_label_values(&[mode]).inc();
}

pub fn record_badge_progress_increment(badge_type: &str) {
    BADGE_PROGRESS_INCREMENTS_TOTAL
        .with_label_values(&[badge_type])
        .inc();
}

pub fn record_badge_earned(badge_type: &str) {
    BADGES_EARNED_TOTAL.with_label_values(&[badge_type]).inc();
}

/// Collapses numeric path segments so per-model routes share one label.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
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

    fn gathered(name: &str) -> bool {
        REGISTRY
            .gather()
            .iter()
            .any(|family| family.get_name() == name)
    }

    #[test]
    fn test_metrics_initialization() {
        init_metrics();
        init_metrics();

        let metric_families = REGISTRY.gather();
        assert!(!metric_families.is_empty(), "Metrics should be registered");
    }

    #[test]
    fn test_record_http_request() {
        init_metrics();

        record_http_request("GET", "/api/models/{id}", 200, Duration::from_millis(50));

        assert!(gathered("modelhub_http_requests_total"));
    }

    #[test]
    fn test_record_domain_counters() {
        init_metrics();

        record_model_invocation("translation", true);
        record_recommendations_served("popular");
        record_badge_progress_increment("explorer");
        record_badge_earned("explorer");
        set_catalog_size(8);

        assert!(gathered("modelhub_model_invocations_total"));
        assert!(gathered("modelhub_recommendations_served_total"));
        assert!(gathered("modelhub_badge_progress_increments_total"));
        assert!(gathered("modelhub_badges_earned_total"));
        assert_eq!(CATALOG_MODELS_TOTAL.get(), 8.0);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/api/models/42"), "/api/models/{id}");
        assert_eq!(
            normalize_path("/api/models/42/similar"),
            "/api/models/{id}/similar"
        );
        assert_eq!(normalize_path("/api/models"), "/api/models");
        assert_eq!(normalize_path("/"), "/");
    }
}
