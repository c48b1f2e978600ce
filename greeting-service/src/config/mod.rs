//! Configuration module for greeting-service.

use config::Environment;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config::{self as core_config, load_layered};
use service_core::error::AppError;
use service_core::retry::RetryPolicy;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GreetingConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub bootstrap: BootstrapConfig,
}

/// Connection settings for PostgreSQL. Validity is the operator's concern.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret<String>,
    pub name: String,
    pub max_connections: u32,
    /// Upper bound on one connect or pool acquire.
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub addr: String,
}

impl RedisConfig {
    pub fn url(&self) -> String {
        format!("redis://{}", self.addr)
    }
}

#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub db_max_attempts: u32,
    pub db_retry_interval: Duration,
}

impl BootstrapConfig {
    pub fn relational_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.db_max_attempts, self.db_retry_interval)
    }
}

/// Flat view of the unprefixed environment (`DB_HOST` reads as `db_host`).
#[derive(Debug, Deserialize)]
struct Settings {
    #[serde(default = "default_service_name")]
    service_name: String,
    service_version: Option<String>,
    #[serde(default = "default_log_level")]
    log_level: String,
    otlp_endpoint: Option<String>,

    db_host: String,
    #[serde(default = "default_db_port")]
    db_port: u16,
    postgres_user: String,
    postgres_password: Secret<String>,
    postgres_db: String,
    #[serde(default = "default_max_connections")]
    database_max_connections: u32,
    #[serde(default = "default_connect_timeout_ms")]
    database_connect_timeout_ms: u64,

    #[serde(default = "default_redis_addr")]
    redis_addr: String,

    #[serde(default = "default_db_max_attempts")]
    bootstrap_db_max_attempts: u32,
    #[serde(default = "default_db_retry_interval_ms")]
    bootstrap_db_retry_interval_ms: u64,
}

fn default_service_name() -> String {
    "greeting-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_redis_addr() -> String {
    "redis:6379".to_string()
}

fn default_db_max_attempts() -> u32 {
    5
}

fn default_db_retry_interval_ms() -> u64 {
    2000
}

fn require(value: &str, key: &str) -> Result<(), AppError> {
    if value.is_empty() {
        return Err(AppError::ConfigError(anyhow::anyhow!("{} is required", key)));
    }
    Ok(())
}

impl GreetingConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_environment(core_config::Config::load()?, Environment::default())
    }

    /// Build the configuration from an explicit environment source.
    pub fn from_environment(
        common: core_config::Config,
        env: Environment,
    ) -> Result<Self, AppError> {
        let settings: Settings = load_layered(env)?;

        require(&settings.db_host, "DB_HOST")?;
        require(&settings.postgres_user, "POSTGRES_USER")?;
        require(settings.postgres_password.expose_secret(), "POSTGRES_PASSWORD")?;
        require(&settings.postgres_db, "POSTGRES_DB")?;

        Ok(Self {
            common,
            service_name: settings.service_name,
            service_version: settings
                .service_version
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            log_level: settings.log_level,
            otlp_endpoint: settings.otlp_endpoint.filter(|v| !v.is_empty()),
            database: DatabaseConfig {
                host: settings.db_host,
                port: settings.db_port,
                user: settings.postgres_user,
                password: settings.postgres_password,
                name: settings.postgres_db,
                max_connections: settings.database_max_connections,
                connect_timeout: Duration::from_millis(settings.database_connect_timeout_ms),
            },
            redis: RedisConfig {
                addr: settings.redis_addr,
            },
            bootstrap: BootstrapConfig {
                db_max_attempts: settings.bootstrap_db_max_attempts,
                db_retry_interval: Duration::from_millis(settings.bootstrap_db_retry_interval_ms),
            },
        })
    }
}
