//! Configuration types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::common::errors::{ClientError, Result};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Alpaca brokerage configuration
    #[serde(default)]
    pub alpaca: AlpacaConfig,
    /// Trading loop parameters
    #[serde(default)]
    pub trading: TradingConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl AppConfig {
    /// Reject configurations the agent cannot trade with
    pub fn validate(&self) -> Result<()> {
        if self.alpaca.credentials().is_none() {
            return Err(ClientError::Configuration(
                "Alpaca API key ID and secret key are required".to_string(),
            ));
        }
        self.trading.validate()
    }
}

/// Alpaca platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlpacaConfig {
    /// API key ID (`APCA-API-KEY-ID`)
    #[serde(default)]
    pub api_key_id: Option<String>,
    /// API secret key (`APCA-API-SECRET-KEY`)
    #[serde(default)]
    pub api_secret_key: Option<String>,
    /// Base URL for the trading REST API
    #[serde(default = "default_alpaca_rest_url")]
    pub rest_url: String,
    /// Base URL for the market data stream
    #[serde(default = "default_alpaca_data_stream_url")]
    pub data_stream_url: String,
    /// Market data feed (iex or sip)
    #[serde(default = "default_alpaca_feed")]
    pub feed: String,
    /// URL of the trade updates stream
    #[serde(default = "default_alpaca_trade_stream_url")]
    pub trade_stream_url: String,
}

impl Default for AlpacaConfig {
    fn default() -> Self {
        Self {
            api_key_id: None,
            api_secret_key: None,
            rest_url: default_alpaca_rest_url(),
            data_stream_url: default_alpaca_data_stream_url(),
            feed: default_alpaca_feed(),
            trade_stream_url: default_alpaca_trade_stream_url(),
        }
    }
}

impl AlpacaConfig {
    /// Credentials, if both halves are configured
    pub fn credentials(&self) -> Option<ApiCredentials> {
        match (&self.api_key_id, &self.api_secret_key) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some(ApiCredentials::new(key.clone(), secret.clone()))
            }
            _ => None,
        }
    }
}

fn default_alpaca_rest_url() -> String {
    "https://paper-api.alpaca.markets".to_string()
}

fn default_alpaca_data_stream_url() -> String {
    "wss://stream.data.alpaca.markets/v2".to_string()
}

fn default_alpaca_feed() -> String {
    "iex".to_string()
}

fn default_alpaca_trade_stream_url() -> String {
    "wss://paper-api.alpaca.markets/stream".to_string()
}

/// Parameters of the trading loop and the martingale strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// The single tracked symbol
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Fraction of buying power risked on the first continuation
    #[serde(default = "default_base_bet_fraction")]
    pub base_bet_fraction: Decimal,
    /// Smallest price move that counts toward a streak
    #[serde(default = "default_price_epsilon")]
    pub price_epsilon: Decimal,
    /// Minimum wall-clock gap between processed ticks
    #[serde(default = "default_tick_debounce_ms")]
    pub tick_debounce_ms: u64,
    /// Process only every n-th debounced tick
    #[serde(default = "default_sample_every")]
    pub sample_every: u32,
    /// Page size when listing open orders to cancel
    #[serde(default = "default_open_order_limit")]
    pub open_order_limit: usize,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            base_bet_fraction: default_base_bet_fraction(),
            price_epsilon: default_price_epsilon(),
            tick_debounce_ms: default_tick_debounce_ms(),
            sample_every: default_sample_every(),
            open_order_limit: default_open_order_limit(),
        }
    }
}

impl TradingConfig {
    pub fn tick_debounce(&self) -> Duration {
        Duration::from_millis(self.tick_debounce_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(ClientError::Configuration("trading symbol is empty".to_string()));
        }
        if self.base_bet_fraction <= Decimal::ZERO || self.base_bet_fraction > Decimal::ONE {
            return Err(ClientError::Configuration(format!(
                "base_bet_fraction must be in (0, 1], got {}",
                self.base_bet_fraction
            )));
        }
        if self.price_epsilon <= Decimal::ZERO {
            return Err(ClientError::Configuration(format!(
                "price_epsilon must be positive, got {}",
                self.price_epsilon
            )));
        }
        if self.sample_every == 0 {
            return Err(ClientError::Configuration("sample_every must be at least 1".to_string()));
        }
        if self.open_order_limit == 0 {
            return Err(ClientError::Configuration(
                "open_order_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_symbol() -> String {
    "VTI".to_string()
}

fn default_base_bet_fraction() -> Decimal {
    dec!(0.10)
}

fn default_price_epsilon() -> Decimal {
    dec!(0.01)
}

fn default_tick_debounce_ms() -> u64 {
    1000
}

fn default_sample_every() -> u32 {
    1
}

fn default_open_order_limit() -> usize {
    100
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format (text or json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl AppSettings {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// API credentials for authenticated requests
#[derive(Clone)]
pub struct ApiCredentials {
    pub key_id: String,
    pub secret_key: String,
}

impl ApiCredentials {
    pub fn new(key_id: String, secret_key: String) -> Self {
        Self { key_id, secret_key }
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("key_id", &self.key_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
