//! Channel type definitions for inter-task communication

use tokio::sync::mpsc;

use super::types::{OrderUpdateEvent, TickEvent};

/// Default channel buffer size
pub const DEFAULT_CHANNEL_SIZE: usize = 1000;

/// Create a new tick channel with the default buffer size
pub fn create_tick_channel() -> (mpsc::Sender<TickEvent>, mpsc::Receiver<TickEvent>) {
    mpsc::channel(DEFAULT_CHANNEL_SIZE)
}

/// Create a new order update channel with the default buffer size
pub fn create_order_update_channel() -> (
    mpsc::Sender<OrderUpdateEvent>,
    mpsc::Receiver<OrderUpdateEvent>,
) {
    mpsc::channel(DEFAULT_CHANNEL_SIZE)
}
