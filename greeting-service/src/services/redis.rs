use crate::models::VISITS_KEY;
use crate::services::store::{CacheConnector, StoreError, VisitCounter};
use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, Client, RedisError};
use std::sync::Arc;

/// Short, credential-free label for a redis error.
pub fn classify(err: &RedisError) -> String {
    if err.is_connection_refusal() {
        "connection refused".to_string()
    } else if err.is_timeout() {
        "timeout".to_string()
    } else if err.is_connection_dropped() {
        "connection dropped".to_string()
    } else {
        format!("{:?}", err.kind())
    }
}

/// Visit counter kept in Redis under [`VISITS_KEY`].
///
/// Holds one multiplexed connection shared by every request. It is not a
/// connection manager: a dropped connection surfaces as a request error and
/// is never re-established mid-request.
#[derive(Clone)]
pub struct RedisService {
    conn: MultiplexedConnection,
}

impl RedisService {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        tracing::info!("Connecting to Redis");
        let client = Client::open(url).map_err(|e| StoreError::cache("open", classify(&e)))?;

        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::cache("connect", classify(&e)))?;

        tracing::info!("Redis connection established");

        Ok(Self { conn })
    }
}

#[async_trait]
impl VisitCounter for RedisService {
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::cache("ping", classify(&e)))?;
        Ok(())
    }

    /// Native `INCR`, so concurrent visits never lose an update.
    async fn increment(&self) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("INCR")
            .arg(VISITS_KEY)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::cache("increment", classify(&e)))
    }

    /// Plain `SET visits 0`, no read-modify-write.
    async fn reset(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(VISITS_KEY)
            .arg(0)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::cache("reset", classify(&e)))
    }
}

/// Opens [`RedisService`] connections for a fixed URL.
#[derive(Clone, Debug)]
pub struct RedisConnector {
    url: String,
}

impl RedisConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl CacheConnector for RedisConnector {
    async fn connect(&self) -> Result<Arc<dyn VisitCounter>, StoreError> {
        let service = RedisService::connect(&self.url).await?;
        Ok(Arc::new(service))
    }
}
