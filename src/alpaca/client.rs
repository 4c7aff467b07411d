//! Alpaca gateway combining the REST and streaming clients

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, instrument};

use super::rest::AlpacaRestClient;
use super::websocket::AlpacaStreamClient;
use crate::common::errors::{ClientError, Result};
use crate::common::traits::BrokerGateway;
use crate::common::types::{
    AccountSnapshot, OrderRequest, OrderUpdateEvent, PositionSnapshot, TickEvent,
};
use crate::config::types::{AlpacaConfig, AppSettings};

/// `BrokerGateway` backed by the Alpaca trading and market data APIs
pub struct AlpacaGateway {
    rest_client: AlpacaRestClient,
    stream_client: AlpacaStreamClient,
}

impl AlpacaGateway {
    /// Create a gateway from configuration; credentials are required
    pub fn new(config: &AlpacaConfig, settings: &AppSettings) -> Result<Self> {
        let credentials = config.credentials().ok_or_else(|| {
            ClientError::Configuration("Alpaca API key ID and secret key are required".to_string())
        })?;

        let rest_client = AlpacaRestClient::with_timeout(
            &config.rest_url,
            credentials.clone(),
            Duration::from_secs(settings.request_timeout_seconds),
        )?;
        let stream_client = AlpacaStreamClient::new(
            &config.data_stream_url,
            &config.feed,
            &config.trade_stream_url,
            credentials,
        );

        Ok(Self {
            rest_client,
            stream_client,
        })
    }
}

#[async_trait]
impl BrokerGateway for AlpacaGateway {
    async fn cancel_all_open_orders(&self) -> Result<()> {
        self.rest_client.cancel_all_orders().await
    }

    async fn get_account(&self) -> Result<AccountSnapshot> {
        let account = self.rest_client.get_account().await?;
        Ok(AccountSnapshot {
            account_id: account.id,
            equity: account.equity,
            margin_multiplier: account.multiplier,
        })
    }

    async fn get_position(&self, symbol: &str) -> Result<PositionSnapshot> {
        let position = self.rest_client.get_position(symbol).await?;
        Ok(PositionSnapshot {
            symbol: position.symbol,
            quantity: position.qty,
        })
    }

    async fn list_open_orders(&self, symbol: Option<&str>, limit: usize) -> Result<Vec<String>> {
        let orders = self.rest_client.list_open_orders(symbol, limit).await?;
        Ok(orders.into_iter().map(|order| order.id).collect())
    }

    async fn cancel_order(&self, order_id: &str) -> Result<()> {
        self.rest_client.cancel_order(order_id).await
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<String> {
        let order = self.rest_client.place_order(request).await?;
        Ok(order.id)
    }

    #[instrument(skip(self, sender))]
    async fn subscribe_ticks(&self, symbol: &str, sender: mpsc::Sender<TickEvent>) -> Result<()> {
        self.stream_client.subscribe_trades(symbol, sender).await?;
        info!("Subscribed to trades for {}", symbol);
        Ok(())
    }

    #[instrument(skip(self, sender))]
    async fn subscribe_order_updates(&self, sender: mpsc::Sender<OrderUpdateEvent>) -> Result<()> {
        self.stream_client.subscribe_trade_updates(sender).await?;
        info!("Subscribed to trade updates");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn unsubscribe_ticks(&self, symbol: &str) -> Result<()> {
        self.stream_client.unsubscribe_trades().await?;
        info!("Unsubscribed from trades for {}", symbol);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn unsubscribe_order_updates(&self) -> Result<()> {
        self.stream_client.unsubscribe_trade_updates().await?;
        info!("Unsubscribed from trade updates");
        Ok(())
    }

    fn broker_name(&self) -> &'static str {
        "alpaca"
    }
}
