//! PostgreSQL-backed greeting store.

use crate::config::DatabaseConfig;
use crate::services::store::{GreetingStore, RelationalConnector, StoreError};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPool, PgPoolOptions};
use sqlx::Connection;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, instrument};

/// SQLSTATE for a relation that does not exist.
const UNDEFINED_TABLE: &str = "42P01";

/// Short, credential-free label for a driver error.
pub fn classify(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Io(_) => "io".to_string(),
        sqlx::Error::Tls(_) => "tls".to_string(),
        sqlx::Error::Configuration(_) => "configuration".to_string(),
        sqlx::Error::Protocol(_) => "protocol".to_string(),
        sqlx::Error::PoolTimedOut => "pool_timeout".to_string(),
        sqlx::Error::PoolClosed => "pool_closed".to_string(),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => "decode".to_string(),
        sqlx::Error::Database(db) => match db.code() {
            Some(code) => format!("database {}", code),
            None => "database".to_string(),
        },
        _ => "other".to_string(),
    }
}

fn is_undefined_table(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNDEFINED_TABLE))
}

fn observe(operation: &'static str, started: Instant) {
    crate::services::metrics::record_db_query(operation, started.elapsed());
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Prove the server answers on one dedicated connection, then open a lazy
    /// pool. A refused or unresponsive server fails this call once, without
    /// any reconnect loop of its own.
    #[instrument(
        skip(config),
        fields(service = "greeting-service", host = %config.host, database = %config.name)
    )]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        info!(
            max_connections = config.max_connections,
            "Connecting to PostgreSQL"
        );

        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(config.password.expose_secret())
            .database(&config.name);

        let mut conn = timeout(config.connect_timeout, PgConnection::connect_with(&options))
            .await
            .map_err(|_| StoreError::relational("connect", "timeout"))?
            .map_err(|e| StoreError::relational("connect", classify(&e)))?;
        conn.ping()
            .await
            .map_err(|e| StoreError::relational("connect", classify(&e)))?;
        if let Err(e) = conn.close().await {
            debug!(kind = %classify(&e), "Liveness connection did not close cleanly");
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Duration::from_secs(600))
            .connect_lazy_with(options);

        info!("PostgreSQL reachable, connection pool ready");

        Ok(Self { pool })
    }

    async fn execute(&self, operation: &'static str, sql: &str) -> Result<(), StoreError> {
        let started = Instant::now();
        sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::relational(operation, classify(&e)))?;
        observe(operation, started);
        Ok(())
    }
}

#[async_trait]
impl GreetingStore for Database {
    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), StoreError> {
        self.execute("ping", "SELECT 1").await
    }

    #[instrument(skip(self))]
    async fn fetch_greeting(&self) -> Result<Option<String>, StoreError> {
        let started = Instant::now();
        let result = sqlx::query_scalar::<_, Option<String>>(
            "SELECT message FROM greetings ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await;
        observe("fetch_greeting", started);

        match result {
            // A NULL message carries nothing to show.
            Ok(row) => Ok(row.flatten()),
            Err(e) if is_undefined_table(&e) => {
                debug!("greetings table missing, treating as empty");
                Ok(None)
            }
            Err(e) => Err(StoreError::relational("fetch_greeting", classify(&e))),
        }
    }

    async fn drop_table(&self) -> Result<(), StoreError> {
        self.execute("drop_table", "DROP TABLE IF EXISTS greetings")
            .await
    }

    async fn create_table(&self) -> Result<(), StoreError> {
        self.execute(
            "create_table",
            "CREATE TABLE greetings (id SERIAL PRIMARY KEY, message TEXT)",
        )
        .await
    }

    async fn insert_greeting(&self, message: &str) -> Result<(), StoreError> {
        let started = Instant::now();
        sqlx::query("INSERT INTO greetings (message) VALUES ($1)")
            .bind(message)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::relational("insert_greeting", classify(&e)))?;
        observe("insert_greeting", started);
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL connection pool closed");
    }
}

/// Opens [`Database`] pools from configuration.
#[derive(Clone, Debug)]
pub struct PostgresConnector {
    config: DatabaseConfig,
}

impl PostgresConnector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RelationalConnector for PostgresConnector {
    async fn connect(&self) -> Result<Arc<dyn GreetingStore>, StoreError> {
        let db = Database::connect(&self.config).await?;
        Ok(Arc::new(db))
    }
}
