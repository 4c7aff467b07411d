//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::mpsc;

use streak_trader::common::errors::{ClientError, Result};
use streak_trader::config::types::TradingConfig;
use streak_trader::{
    AccountSnapshot, BrokerGateway, OrderEventKind, OrderRequest, OrderUpdateEvent,
    PositionSnapshot, TickEvent,
};

pub const SYMBOL: &str = "MKL";

/// Trading config for `SYMBOL` with no debounce
pub fn trading_config() -> TradingConfig {
    TradingConfig {
        symbol: SYMBOL.to_string(),
        tick_debounce_ms: 0,
        ..TradingConfig::default()
    }
}

/// Account worth `equity` at 2x margin
pub fn sample_account(equity: Decimal) -> AccountSnapshot {
    AccountSnapshot {
        account_id: "acct-test".to_string(),
        equity,
        margin_multiplier: dec!(2.00),
    }
}

pub fn sample_position(quantity: Decimal) -> PositionSnapshot {
    PositionSnapshot {
        symbol: SYMBOL.to_string(),
        quantity,
    }
}

pub fn tick(price: Decimal) -> TickEvent {
    TickEvent::new(SYMBOL, price)
}

pub fn order_event(order_id: &str, kind: OrderEventKind) -> OrderUpdateEvent {
    OrderUpdateEvent::new(order_id, SYMBOL, kind)
}

pub fn api_error(message: &str) -> ClientError {
    ClientError::Api {
        status: 500,
        message: message.to_string(),
    }
}

/// In-memory `BrokerGateway` with scripted responses
///
/// Queued responses are consumed first; once a queue is empty the fallback
/// (`account`, `position`) is returned. Every call is recorded by name.
pub struct FakeGateway {
    account: Mutex<AccountSnapshot>,
    position: Mutex<Option<Decimal>>,
    account_queue: Mutex<VecDeque<Result<AccountSnapshot>>>,
    position_queue: Mutex<VecDeque<Result<PositionSnapshot>>>,
    placement_queue: Mutex<VecDeque<Result<String>>>,
    open_orders: Mutex<Vec<String>>,
    fail_cancel_all: Mutex<bool>,
    fail_order_subscription: Mutex<bool>,
    calls: Mutex<Vec<String>>,
    placed: Mutex<Vec<OrderRequest>>,
    canceled: Mutex<Vec<String>>,
    tick_sender: Mutex<Option<mpsc::Sender<TickEvent>>>,
    order_sender: Mutex<Option<mpsc::Sender<OrderUpdateEvent>>>,
}

impl FakeGateway {
    /// Flat account with 1000 equity at 2x margin
    pub fn new() -> Self {
        Self {
            account: Mutex::new(sample_account(dec!(1000))),
            position: Mutex::new(None),
            account_queue: Mutex::new(VecDeque::new()),
            position_queue: Mutex::new(VecDeque::new()),
            placement_queue: Mutex::new(VecDeque::new()),
            open_orders: Mutex::new(Vec::new()),
            fail_cancel_all: Mutex::new(false),
            fail_order_subscription: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
            placed: Mutex::new(Vec::new()),
            canceled: Mutex::new(Vec::new()),
            tick_sender: Mutex::new(None),
            order_sender: Mutex::new(None),
        }
    }

    pub fn with_account(self, account: AccountSnapshot) -> Self {
        *self.account.lock().unwrap() = account;
        self
    }

    pub fn with_position(self, quantity: Decimal) -> Self {
        *self.position.lock().unwrap() = Some(quantity);
        self
    }

    pub fn failing_cancel_all(self) -> Self {
        *self.fail_cancel_all.lock().unwrap() = true;
        self
    }

    pub fn failing_order_subscription(self) -> Self {
        *self.fail_order_subscription.lock().unwrap() = true;
        self
    }

    pub fn set_position(&self, quantity: Option<Decimal>) {
        *self.position.lock().unwrap() = quantity;
    }

    pub fn set_open_orders(&self, order_ids: &[&str]) {
        *self.open_orders.lock().unwrap() = order_ids.iter().map(|id| id.to_string()).collect();
    }

    /// Drop both stream senders, ending the streams
    pub fn close_streams(&self) {
        self.close_tick_stream();
        self.order_sender.lock().unwrap().take();
    }

    /// Drop only the tick sender, as when the market data socket drops
    pub fn close_tick_stream(&self) {
        self.tick_sender.lock().unwrap().take();
    }

    pub fn push_account(&self, response: Result<AccountSnapshot>) {
        self.account_queue.lock().unwrap().push_back(response);
    }

    pub fn push_position(&self, response: Result<PositionSnapshot>) {
        self.position_queue.lock().unwrap().push_back(response);
    }

    pub fn push_placement(&self, response: Result<String>) {
        self.placement_queue.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|call| *call == name).count()
    }

    pub fn placed_orders(&self) -> Vec<OrderRequest> {
        self.placed.lock().unwrap().clone()
    }

    pub fn canceled_orders(&self) -> Vec<String> {
        self.canceled.lock().unwrap().clone()
    }

    pub fn tick_sender(&self) -> Option<mpsc::Sender<TickEvent>> {
        self.tick_sender.lock().unwrap().clone()
    }

    pub fn order_sender(&self) -> Option<mpsc::Sender<OrderUpdateEvent>> {
        self.order_sender.lock().unwrap().clone()
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrokerGateway for FakeGateway {
    async fn cancel_all_open_orders(&self) -> Result<()> {
        self.record("cancel_all_open_orders");
        if *self.fail_cancel_all.lock().unwrap() {
            return Err(api_error("cancel all failed"));
        }
        self.open_orders.lock().unwrap().clear();
        Ok(())
    }

    async fn get_account(&self) -> Result<AccountSnapshot> {
        self.record("get_account");
        if let Some(response) = self.account_queue.lock().unwrap().pop_front() {
            return response;
        }
        Ok(self.account.lock().unwrap().clone())
    }

    async fn get_position(&self, symbol: &str) -> Result<PositionSnapshot> {
        self.record("get_position");
        if let Some(response) = self.position_queue.lock().unwrap().pop_front() {
            return response;
        }
        match *self.position.lock().unwrap() {
            Some(quantity) => Ok(PositionSnapshot {
                symbol: symbol.to_string(),
                quantity,
            }),
            None => Err(ClientError::PositionNotFound(symbol.to_string())),
        }
    }

    async fn list_open_orders(&self, _symbol: Option<&str>, limit: usize) -> Result<Vec<String>> {
        self.record("list_open_orders");
        Ok(self.open_orders.lock().unwrap().iter().take(limit).cloned().collect())
    }

    async fn cancel_order(&self, order_id: &str) -> Result<()> {
        self.record("cancel_order");
        self.canceled.lock().unwrap().push(order_id.to_string());
        self.open_orders.lock().unwrap().retain(|id| id != order_id);
        Ok(())
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<String> {
        self.record("place_order");
        let response = self.placement_queue.lock().unwrap().pop_front();
        let response = match response {
            Some(response) => response,
            None => Ok(format!("order-{}", self.placed.lock().unwrap().len() + 1)),
        };
        if response.is_ok() {
            self.placed.lock().unwrap().push(request.clone());
        }
        response
    }

    async fn subscribe_ticks(&self, _symbol: &str, sender: mpsc::Sender<TickEvent>) -> Result<()> {
        self.record("subscribe_ticks");
        *self.tick_sender.lock().unwrap() = Some(sender);
        Ok(())
    }

    async fn subscribe_order_updates(&self, sender: mpsc::Sender<OrderUpdateEvent>) -> Result<()> {
        self.record("subscribe_order_updates");
        if *self.fail_order_subscription.lock().unwrap() {
            return Err(ClientError::WebSocketConnection("refused".to_string()));
        }
        *self.order_sender.lock().unwrap() = Some(sender);
        Ok(())
    }

    async fn unsubscribe_ticks(&self, _symbol: &str) -> Result<()> {
        self.record("unsubscribe_ticks");
        self.tick_sender.lock().unwrap().take();
        Ok(())
    }

    async fn unsubscribe_order_updates(&self) -> Result<()> {
        self.record("unsubscribe_order_updates");
        self.order_sender.lock().unwrap().take();
        Ok(())
    }

    fn broker_name(&self) -> &'static str {
        "fake"
    }
}
