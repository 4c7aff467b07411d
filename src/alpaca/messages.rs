//! Alpaca-specific message types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::types::{OrderRequest, OrderType, Side, TimeInForce};

// ============================================================================
// REST API Types
// ============================================================================

/// Response from GET /v2/account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: String,
    pub equity: Decimal,
    /// Buying power multiplier ("1", "2" or "4")
    pub multiplier: Decimal,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub trading_blocked: Option<bool>,
}

/// Response from GET /v2/positions/{symbol}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionResponse {
    pub symbol: String,
    pub qty: Decimal,
    #[serde(default)]
    pub avg_entry_price: Option<Decimal>,
    #[serde(default)]
    pub market_value: Option<Decimal>,
}

/// An order as returned by the orders endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    #[serde(default)]
    pub client_order_id: Option<String>,
    pub symbol: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub side: Option<Side>,
    #[serde(default)]
    pub qty: Option<Decimal>,
    #[serde(default)]
    pub limit_price: Option<Decimal>,
}

/// Body for POST /v2/orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrderBody {
    pub symbol: String,
    pub qty: String,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<String>,
}

impl From<&OrderRequest> for PlaceOrderBody {
    fn from(request: &OrderRequest) -> Self {
        Self {
            symbol: request.symbol.clone(),
            qty: request.quantity.to_string(),
            side: request.side,
            order_type: request.order_type,
            time_in_force: request.time_in_force,
            limit_price: request.limit_price.map(|price| price.to_string()),
        }
    }
}

/// Error body returned with non-success statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

// ============================================================================
// Streaming Types
// ============================================================================

/// Authentication message, shared by both streams
#[derive(Debug, Clone, Serialize)]
pub struct StreamAuthMessage<'a> {
    pub action: &'static str,
    pub key: &'a str,
    pub secret: &'a str,
}

impl<'a> StreamAuthMessage<'a> {
    pub fn new(key: &'a str, secret: &'a str) -> Self {
        Self {
            action: "auth",
            key,
            secret,
        }
    }
}

/// Market data subscribe/unsubscribe message
#[derive(Debug, Clone, Serialize)]
pub struct DataSubscriptionMessage {
    /// "subscribe" or "unsubscribe"
    pub action: &'static str,
    pub trades: Vec<String>,
}

impl DataSubscriptionMessage {
    pub fn subscribe(symbol: &str) -> Self {
        Self {
            action: "subscribe",
            trades: vec![symbol.to_string()],
        }
    }

    pub fn unsubscribe(symbol: &str) -> Self {
        Self {
            action: "unsubscribe",
            trades: vec![symbol.to_string()],
        }
    }
}

/// A single element of a market data frame (frames are JSON arrays)
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "T")]
pub enum DataStreamMessage {
    #[serde(rename = "success")]
    Success { msg: String },
    #[serde(rename = "error")]
    Error { code: i64, msg: String },
    #[serde(rename = "subscription")]
    Subscription {
        #[serde(default)]
        trades: Vec<String>,
    },
    #[serde(rename = "t")]
    Trade(StreamTrade),
    #[serde(other)]
    Other,
}

/// Trade print from the market data stream
#[derive(Debug, Clone, Deserialize)]
pub struct StreamTrade {
    #[serde(rename = "S")]
    pub symbol: String,
    #[serde(rename = "p")]
    pub price: Decimal,
    #[serde(rename = "s", default)]
    pub size: Option<Decimal>,
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
}

/// Subscribe the trading stream to trade updates
#[derive(Debug, Clone, Serialize)]
pub struct ListenMessage {
    pub action: &'static str,
    pub data: ListenStreams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenStreams {
    pub streams: Vec<String>,
}

impl ListenMessage {
    pub fn trade_updates() -> Self {
        Self {
            action: "listen",
            data: ListenStreams {
                streams: vec!["trade_updates".to_string()],
            },
        }
    }
}

/// Envelope of every trading stream message
#[derive(Debug, Clone, Deserialize)]
pub struct TradingStreamEnvelope {
    pub stream: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Payload of the `authorization` stream
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationData {
    pub status: String,
    #[serde(default)]
    pub action: Option<String>,
}

/// Payload of the `trade_updates` stream
#[derive(Debug, Clone, Deserialize)]
pub struct TradeUpdateData {
    pub event: String,
    pub order: StreamOrder,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub position_qty: Option<Decimal>,
}

/// The order carried by a trade update
#[derive(Debug, Clone, Deserialize)]
pub struct StreamOrder {
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_place_order_body() {
        let request = OrderRequest::day_limit("MKL", Side::Buy, 2, dec!(1.25));
        let body = serde_json::to_value(PlaceOrderBody::from(&request)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "symbol": "MKL",
                "qty": "2",
                "side": "buy",
                "type": "limit",
                "time_in_force": "day",
                "limit_price": "1.25"
            })
        );
    }

    #[test]
    fn test_account_decimals_from_strings() {
        let json = r#"{"id":"acct","equity":"1000.50","multiplier":"2","status":"ACTIVE"}"#;
        let account: AccountResponse = serde_json::from_str(json).unwrap();
        assert_eq!(account.equity, dec!(1000.50));
        assert_eq!(account.multiplier, dec!(2));
    }

    #[test]
    fn test_data_frame() {
        let json = r#"[
            {"T":"success","msg":"authenticated"},
            {"T":"t","S":"VTI","i":52983525029461,"x":"V","p":201.34,"s":100,"t":"2024-01-02T15:30:00.123456Z","c":["@"],"z":"B"},
            {"T":"q","S":"VTI"}
        ]"#;
        let messages: Vec<DataStreamMessage> = serde_json::from_str(json).unwrap();
        assert_eq!(messages.len(), 3);
        assert!(matches!(&messages[0], DataStreamMessage::Success { msg } if msg == "authenticated"));
        match &messages[1] {
            DataStreamMessage::Trade(trade) => {
                assert_eq!(trade.symbol, "VTI");
                assert_eq!(trade.price, dec!(201.34));
            }
            other => panic!("Expected trade, got {:?}", other),
        }
        assert!(matches!(messages[2], DataStreamMessage::Other));
    }

    #[test]
    fn test_trade_update_envelope() {
        let json = r#"{
            "stream": "trade_updates",
            "data": {
                "event": "fill",
                "timestamp": "2024-01-02T15:30:01Z",
                "position_qty": "40",
                "order": {"id": "order-1", "symbol": "VTI", "status": "filled"}
            }
        }"#;
        let envelope: TradingStreamEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.stream, "trade_updates");
        let update: TradeUpdateData = serde_json::from_value(envelope.data).unwrap();
        assert_eq!(update.event, "fill");
        assert_eq!(update.order.id, "order-1");
        assert_eq!(update.position_qty, Some(dec!(40)));
    }
}
