use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// GET /metrics: job counters, queue depth and generation latency in
/// Prometheus text exposition format.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
}

/// Register descriptions for every metric the service records.
pub fn describe_metrics() {
    metrics::describe_counter!("end_frame_jobs_submitted", "Total end-frame jobs submitted");
    metrics::describe_counter!("end_frame_jobs_completed", "Total end-frame jobs completed");
    metrics::describe_counter!("end_frame_jobs_failed", "Total end-frame jobs that failed");
    metrics::describe_histogram!(
        "end_frame_generation_seconds",
        "Time spent in a single end-frame generation call"
    );
    metrics::describe_gauge!("end_frame_queue_depth", "Current number of pending jobs");
}
