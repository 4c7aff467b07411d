//! StreakTrader Library
//!
//! A single-symbol equities trading agent that bets against price streaks,
//! doubling its stake as a streak lengthens, over a pluggable brokerage
//! gateway (Alpaca by default).

pub mod alpaca;
pub mod common;
pub mod config;
pub mod controller;
pub mod strategy;

// Re-export commonly used types
pub use common::errors::{ClientError, Result, TradingError, TradingResult};
pub use common::traits::BrokerGateway;
pub use common::types::{
    AccountSnapshot, OrderEventKind, OrderRequest, OrderType, OrderUpdateEvent, PositionSnapshot,
    Side, TickEvent, TimeInForce,
};
pub use config::types::{AppConfig, TradingConfig};
pub use alpaca::client::AlpacaGateway;
pub use alpaca::rest::AlpacaRestClient;
pub use alpaca::websocket::AlpacaStreamClient;

// Controller types
pub use controller::{
    AccountState, Controller, ControllerState, Ledger, OrderEventOutcome, OrderState,
    PositionState, TickOutcome,
};

// Strategy types
pub use strategy::{
    BoxedStrategy, Decision, DecisionContext, MartingaleStrategy, NoOpReason, StreakMove,
    StreakState, StreakTracker, Strategy,
};
