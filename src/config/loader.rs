//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::{ClientError, Result};

/// Conventional Alpaca environment variables and the keys they override
const ALPACA_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("APCA_API_KEY_ID", "alpaca.api_key_id"),
    ("APCA_API_SECRET_KEY", "alpaca.api_secret_key"),
    ("APCA_API_BASE_URL", "alpaca.rest_url"),
    ("APCA_API_DATA_URL", "alpaca.data_stream_url"),
    ("APCA_API_STREAM_URL", "alpaca.trade_stream_url"),
    ("APCA_LOG_LEVEL", "settings.log_level"),
];

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Alpaca's own variables (APCA_API_KEY_ID, APCA_API_SECRET_KEY, ...)
/// 2. Environment variables (prefixed with APP_, sections split by `__`)
/// 3. Configuration file (TOML format)
/// 4. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true),
    );

    for (variable, key) in ALPACA_ENV_OVERRIDES {
        builder = builder
            .set_override_option(*key, std::env::var(variable).ok())
            .map_err(|e| ClientError::Configuration(e.to_string()))?;
    }

    let config = builder
        .build()
        .map_err(|e| ClientError::Configuration(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ClientError::Configuration(e.to_string()))
}
