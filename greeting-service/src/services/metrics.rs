//! Prometheus metrics for greeting-service.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Safe to call more than once; only the
/// first call installs anything.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::warn!(error = %e, "Prometheus recorder not installed"),
    }
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_visit() {
    counter!("greeting_visits_total").increment(1);
}

pub fn record_reset(status: &'static str) {
    counter!("greeting_resets_total", "status" => status).increment(1);
}

pub fn record_store_error(store: &'static str, operation: &'static str) {
    counter!(
        "greeting_store_errors_total",
        "store" => store,
        "operation" => operation
    )
    .increment(1);
}

pub fn record_db_query(operation: &'static str, elapsed: Duration) {
    histogram!("greeting_db_query_duration_seconds", "operation" => operation)
        .record(elapsed.as_secs_f64());
}
