//! Store seams used by the handlers and the bootstrap sequencer.
//!
//! The relational store and the cache store fail independently, so each has
//! its own error variant and neither is ever reported as the other.

use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a single store call. Carries a short classification instead of
/// the driver message so nothing credential-bearing reaches logs or clients.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("relational store {operation} failed ({kind})")]
    Relational {
        operation: &'static str,
        kind: String,
    },

    #[error("cache store {operation} failed ({kind})")]
    Cache {
        operation: &'static str,
        kind: String,
    },
}

impl StoreError {
    pub fn relational(operation: &'static str, kind: impl Into<String>) -> Self {
        StoreError::Relational {
            operation,
            kind: kind.into(),
        }
    }

    pub fn cache(operation: &'static str, kind: impl Into<String>) -> Self {
        StoreError::Cache {
            operation,
            kind: kind.into(),
        }
    }

    pub fn store(&self) -> &'static str {
        match self {
            StoreError::Relational { .. } => "postgres",
            StoreError::Cache { .. } => "redis",
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            StoreError::Relational { operation, .. } | StoreError::Cache { operation, .. } => {
                operation
            }
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            StoreError::Relational { kind, .. } | StoreError::Cache { kind, .. } => kind,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Relational { .. } => AppError::DatabaseError(anyhow::Error::new(err)),
            StoreError::Cache { .. } => AppError::CacheError(anyhow::Error::new(err)),
        }
    }
}

/// Durable store holding the greeting row.
#[async_trait]
pub trait GreetingStore: Send + Sync {
    /// Round-trip proving the store answers, not merely that a socket opened.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Read one greeting. `Ok(None)` when no row exists, including when the
    /// table itself is missing after an interrupted reset.
    async fn fetch_greeting(&self) -> Result<Option<String>, StoreError>;

    /// Drop the greetings table if present.
    async fn drop_table(&self) -> Result<(), StoreError>;

    /// Create the greetings table.
    async fn create_table(&self) -> Result<(), StoreError>;

    /// Insert one greeting row.
    async fn insert_greeting(&self, message: &str) -> Result<(), StoreError>;

    /// Release the underlying connections.
    async fn close(&self) {}
}

/// Ephemeral store holding the visit counter.
#[async_trait]
pub trait VisitCounter: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    /// Atomically increment the counter on the store side and return the new
    /// value.
    async fn increment(&self) -> Result<i64, StoreError>;

    /// Overwrite the counter with zero.
    async fn reset(&self) -> Result<(), StoreError>;

    async fn close(&self) {}
}

/// Opens a relational store handle. The liveness check is left to the caller.
#[async_trait]
pub trait RelationalConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn GreetingStore>, StoreError>;
}

/// Opens a cache store handle. The liveness check is left to the caller.
#[async_trait]
pub trait CacheConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn VisitCounter>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_domains_stay_separate() {
        let db: AppError = StoreError::relational("fetch_greeting", "io").into();
        let cache: AppError = StoreError::cache("increment", "io error").into();

        assert!(matches!(db, AppError::DatabaseError(_)));
        assert!(matches!(cache, AppError::CacheError(_)));
    }

    #[test]
    fn test_accessors() {
        let err = StoreError::cache("reset", "connection refused");
        assert_eq!(err.store(), "redis");
        assert_eq!(err.operation(), "reset");
        assert_eq!(err.kind(), "connection refused");
        assert_eq!(
            err.to_string(),
            "cache store reset failed (connection refused)"
        );
    }
}
