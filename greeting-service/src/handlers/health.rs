use crate::services::get_metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Health check endpoint for Docker/K8s probes. Pings both stores on the
/// existing handles.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let postgres = state.stores.greetings().ping().await;
    let redis = state.stores.visits().ping().await;

    let label = |r: &Result<(), _>| if r.is_ok() { "up" } else { "down" };
    let checks = json!({
        "postgres": label(&postgres),
        "redis": label(&redis),
    });

    if postgres.is_ok() && redis.is_ok() {
        tracing::debug!("Health check passed");
        (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": state.service_name,
                "version": env!("CARGO_PKG_VERSION"),
                "checks": checks,
            })),
        )
    } else {
        tracing::warn!(checks = %checks, "Health check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "service": state.service_name,
                "checks": checks,
            })),
        )
    }
}

/// Metrics endpoint for Prometheus scraping.
pub async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
