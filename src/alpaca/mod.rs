//! Alpaca module - BrokerGateway implementation over the Alpaca trading API

pub mod auth;
pub mod client;
pub mod messages;
pub mod rest;
pub mod websocket;

pub use client::AlpacaGateway;
