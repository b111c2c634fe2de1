use std::time::Instant;

use axum::{
    body::Body, extract::MatchedPath, http::Request, middleware::Next, response::IntoResponse,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::registry::BackendKind;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUESTS_DURATION_SECONDS: &str = "http_requests_duration_seconds";
pub const BACKEND_OPERATIONS_TOTAL: &str = "backend_operations_total";
pub const BACKEND_AVAILABLE: &str = "backend_available";

pub fn setup_metrics_recorder() -> PrometheusHandle {
    const BUCKETS: &[f64] = &[
        0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(BUCKETS)
        .expect("histogram buckets are not empty")
        .install_recorder()
        .expect("failed to install the prometheus recorder")
}

/// Middleware to record some common HTTP metrics
pub async fn track_metrics(req: Request<Body>, next: Next) -> impl IntoResponse {
    let start = Instant::now();

    let path = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };

    let method = req.method().clone();

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status),
    ];

    metrics::counter!(HTTP_REQUESTS_TOTAL, &labels).increment(1);
    metrics::histogram!(HTTP_REQUESTS_DURATION_SECONDS, &labels).record(latency);

    response
}

/// Count one backend operation. `outcome` is `ok`, `unavailable` or an error kind.
pub fn record_backend_operation(backend: BackendKind, operation: &'static str, outcome: &str) {
    let labels = [
        ("backend", backend.label().to_string()),
        ("operation", operation.to_string()),
        ("outcome", outcome.to_string()),
    ];
    metrics::counter!(BACKEND_OPERATIONS_TOTAL, &labels).increment(1);
}

pub fn set_backend_available(backend: BackendKind, available: bool) {
    metrics::gauge!(BACKEND_AVAILABLE, "backend" => backend.label())
        .set(if available { 1.0 } else { 0.0 });
}
