//! Application startup and lifecycle management.

use crate::bootstrap::{bootstrap, BootstrapError, StoreHandles};
use crate::config::GreetingConfig;
use crate::handlers;
use crate::services::{init_metrics, PostgresConnector, RedisConnector};
use axum::{middleware, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::request_id_middleware;
use service_core::retry::TokioSleeper;
use std::future::Future;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    pub stores: StoreHandles,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    App(#[from] AppError),
}

/// Routes for the greeting page, the reset endpoint and the probes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::greeting_view))
        .route("/init-db", get(handlers::reset_state))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Bootstrap both stores and bind the HTTP listener.
    pub async fn build(config: GreetingConfig) -> Result<Self, StartupError> {
        init_metrics();

        let relational = PostgresConnector::new(config.database.clone());
        let cache = RedisConnector::new(config.redis.url());
        let stores = bootstrap(
            &relational,
            &cache,
            &config.bootstrap.relational_policy(),
            &TokioSleeper,
        )
        .await?;

        let state = AppState {
            service_name: config.service_name.clone(),
            stores,
        };

        Self::bind(state, config.common.port).await
    }

    /// Bind the listener for already-bootstrapped stores.
    async fn bind(state: AppState, port: u16) -> Result<Self, StartupError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
                state.stores.close().await;
                return Err(AppError::from(e).into());
            }
        };
        let port = listener.local_addr().map_err(AppError::from)?.port();

        tracing::info!(port = port, "Greeting service listener bound");

        Ok(Self { listener, state })
    }

    /// Serve until `shutdown` resolves, then release both stores.
    pub async fn run_until_stopped<S>(self, shutdown: S) -> std::io::Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let stores = self.state.stores.clone();
        let router = build_router(self.state);

        tracing::info!(
            service = "greeting-service",
            version = env!("CARGO_PKG_VERSION"),
            "Service ready to accept connections"
        );

        let result = axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await;

        stores.close().await;
        tracing::info!("Store handles released");

        if let Err(e) = &result {
            tracing::error!(error = %e, "HTTP server error");
        }
        result
    }
}
