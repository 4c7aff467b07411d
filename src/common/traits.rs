//! Trait definitions for broker gateways

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::errors::Result;
use super::types::{AccountSnapshot, OrderRequest, OrderUpdateEvent, PositionSnapshot, TickEvent};

/// Trait for brokerage connections (Alpaca, test fakes, etc.)
///
/// Every call is a single request/response with no internal retry; a failure
/// surfaces immediately. Streams deliver decoded events into the provided
/// channel from a background task until unsubscribed.
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    /// Cancel every open order on the account
    async fn cancel_all_open_orders(&self) -> Result<()>;

    /// Fetch account equity and margin multiplier
    async fn get_account(&self) -> Result<AccountSnapshot>;

    /// Fetch the position for a symbol
    ///
    /// Returns `ClientError::PositionNotFound` when the account holds none.
    async fn get_position(&self, symbol: &str) -> Result<PositionSnapshot>;

    /// List the IDs of open orders, optionally restricted to one symbol
    async fn list_open_orders(&self, symbol: Option<&str>, limit: usize) -> Result<Vec<String>>;

    /// Cancel a single order
    async fn cancel_order(&self, order_id: &str) -> Result<()>;

    /// Submit an order, returning the broker-assigned order ID
    async fn place_order(&self, request: &OrderRequest) -> Result<String>;

    /// Start forwarding trade ticks for `symbol`
    async fn subscribe_ticks(&self, symbol: &str, sender: mpsc::Sender<TickEvent>) -> Result<()>;

    /// Start forwarding updates for the account's orders
    async fn subscribe_order_updates(&self, sender: mpsc::Sender<OrderUpdateEvent>) -> Result<()>;

    /// Stop the tick stream for `symbol`
    async fn unsubscribe_ticks(&self, symbol: &str) -> Result<()>;

    /// Stop the order update stream
    async fn unsubscribe_order_updates(&self) -> Result<()>;

    /// Name of the brokerage, for logs
    fn broker_name(&self) -> &'static str;
}
