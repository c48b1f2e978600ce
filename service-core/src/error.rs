use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Body sent for every server-side failure. Driver messages stay in the logs.
pub const GENERIC_ERROR_BODY: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Cache error: {0}")]
    CacheError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InternalError(_) => "internal",
            AppError::DatabaseError(_) => "database",
            AppError::CacheError(_) => "cache",
            AppError::ConfigError(_) => "config",
        }
    }

    /// Every variant is a server-side failure; clients never see which one.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::error!(kind = self.kind(), error = %self, "Request failed");

        (status, GENERIC_ERROR_BODY).into_response()
    }
}
