//! Greeting Service entry point.

use greeting_service::config::GreetingConfig;
use greeting_service::startup::Application;
use service_core::observability::init_tracing;
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = GreetingConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    // The password is never logged.
    tracing::info!(
        service_name = %config.service_name,
        version = %config.service_version,
        http_port = config.common.port,
        db_host = %config.database.host,
        db_name = %config.database.name,
        redis_addr = %config.redis.addr,
        db_max_attempts = config.bootstrap.db_max_attempts,
        db_retry_interval_ms = config.bootstrap.db_retry_interval.as_millis() as u64,
        "Configuration loaded"
    );

    // A failed bootstrap ends the process before anything is served.
    let app = Application::build(config).await.map_err(|e| {
        tracing::error!(error = %e, "Startup failed");
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until_stopped(shutdown_signal()).await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}
