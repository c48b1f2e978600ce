use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Listener settings shared by every service, read from `APP__*` variables.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    5000
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        load_layered(Environment::with_prefix("APP").separator("__"))
    }
}

/// Deserialize `T` from an optional `configuration` file overlaid by `env`.
///
/// A `.env` file, when present, is folded into the process environment first.
pub fn load_layered<T: DeserializeOwned>(env: Environment) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let config = Cfg::builder()
        .add_source(File::with_name("configuration").required(false))
        .add_source(env)
        .build()?;

    Ok(config.try_deserialize()?)
}
