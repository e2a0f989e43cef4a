use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Register descriptions for the queue metrics.
pub fn describe_metrics() {
    metrics::describe_counter!("content_jobs_enqueued_total", "Jobs accepted by the enqueue endpoint");
    metrics::describe_counter!("content_items_processed_total", "Items that reached done");
    metrics::describe_counter!("content_items_failed_total", "Items that reached failed");
    metrics::describe_counter!("content_items_skipped_total", "Items skipped for lack of a processor");
    metrics::describe_counter!(
        "content_items_rate_limited_total",
        "Items returned to pending after an upstream rate limit"
    );
    metrics::describe_histogram!(
        "content_item_processing_seconds",
        "Time spent in the item processor"
    );
}

/// Prometheus scrape endpoint in text exposition format.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}
