//! Broker-neutral types shared by the gateway, the ledger and the strategies

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Limit,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Limit => write!(f, "limit"),
        }
    }
}

/// How long an order stays working
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Expires at the end of the trading day
    Day,
}

impl std::fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeInForce::Day => write!(f, "day"),
        }
    }
}

/// Account figures as reported by the broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub equity: Decimal,
    pub margin_multiplier: Decimal,
}

/// Position for a single symbol as reported by the broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol: String,
    /// Broker quantity, may be fractional
    pub quantity: Decimal,
}

/// A request to place a new order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    /// Whole shares, always positive
    pub quantity: u64,
    pub order_type: OrderType,
    pub limit_price: Option<Decimal>,
    pub time_in_force: TimeInForce,
}

impl OrderRequest {
    /// Create a day limit order
    pub fn day_limit(symbol: impl Into<String>, side: Side, quantity: u64, limit_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            order_type: OrderType::Limit,
            limit_price: Some(limit_price),
            time_in_force: TimeInForce::Day,
        }
    }
}

/// A trade print from the market data stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickEvent {
    pub symbol: String,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl TickEvent {
    pub fn new(symbol: impl Into<String>, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp: Utc::now(),
        }
    }
}

/// Lifecycle event kinds reported for our orders
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderEventKind {
    New,
    Fill,
    PartialFill,
    Rejected,
    Canceled,
    Expired,
    /// Anything the controller has no transition for
    Other(String),
}

impl OrderEventKind {
    /// Returns true when the order can no longer trade
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Fill | Self::Rejected | Self::Canceled | Self::Expired)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "new",
            Self::Fill => "fill",
            Self::PartialFill => "partial_fill",
            Self::Rejected => "rejected",
            Self::Canceled => "canceled",
            Self::Expired => "expired",
            Self::Other(kind) => kind,
        }
    }
}

impl From<&str> for OrderEventKind {
    fn from(value: &str) -> Self {
        match value {
            "new" => Self::New,
            "fill" => Self::Fill,
            "partial_fill" => Self::PartialFill,
            "rejected" => Self::Rejected,
            "canceled" => Self::Canceled,
            "expired" => Self::Expired,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for OrderEventKind {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<OrderEventKind> for String {
    fn from(kind: OrderEventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for OrderEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An update on one of our orders from the trading stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdateEvent {
    pub order_id: String,
    pub symbol: String,
    pub kind: OrderEventKind,
    pub timestamp: DateTime<Utc>,
}

impl OrderUpdateEvent {
    pub fn new(order_id: impl Into<String>, symbol: impl Into<String>, kind: OrderEventKind) -> Self {
        Self {
            order_id: order_id.into(),
            symbol: symbol.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}
