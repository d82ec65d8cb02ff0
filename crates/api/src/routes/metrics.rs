//! Prometheus metrics endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics::Unit;
use metrics_exporter_prometheus::PrometheusHandle;

/// GET /metrics — returns Prometheus-formatted metrics.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}

/// Registers help texts for the service metrics with the installed recorder.
pub fn describe() {
    metrics::describe_counter!("urls_shortened_total", "Links stored by shorten requests");
    metrics::describe_counter!(
        "url_delete_batches_total",
        "Deletion batches by outcome (committed, rolled_back, error)"
    );
    metrics::describe_counter!(
        "url_delete_items_total",
        "Deletion requests processed by workers, by result"
    );
    metrics::describe_histogram!(
        "url_delete_batch_duration_seconds",
        Unit::Seconds,
        "Time from opening to ending a deletion transaction"
    );
}
