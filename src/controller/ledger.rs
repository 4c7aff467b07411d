//! Local snapshot of account, position and open-order state

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::common::errors::{ClientError, Result};
use crate::common::types::{AccountSnapshot, OrderEventKind, OrderUpdateEvent, PositionSnapshot};

/// Account equity and margin as last fetched from the broker
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountState {
    pub account_id: String,
    pub equity: Decimal,
    pub margin_multiplier: Decimal,
}

impl AccountState {
    pub fn buying_power(&self) -> Decimal {
        self.equity * self.margin_multiplier
    }
}

/// Whole-share position in the tracked symbol
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PositionState {
    pub symbol: String,
    pub quantity: i64,
}

/// The single order we are tracking, if any
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderState {
    pub order_id: Option<String>,
}

impl OrderState {
    pub fn is_open(&self) -> bool {
        self.order_id.is_some()
    }

    fn matches(&self, order_id: &str) -> bool {
        self.order_id.as_deref() == Some(order_id)
    }
}

/// What applying an order update did to the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEventOutcome {
    /// A `new` event started tracking the order
    Tracked,
    /// A fill; `cleared` is true if it was the tracked order
    Filled { cleared: bool },
    /// A partial fill; tracking unchanged
    PartiallyFilled,
    /// Rejected, canceled or expired; `cleared` as above
    Closed { cleared: bool },
    /// Event kind without a transition
    Unexpected(String),
}

impl OrderEventOutcome {
    /// Fills change the position, so the caller must re-fetch it
    pub fn requires_position_refresh(&self) -> bool {
        matches!(self, Self::Filled { .. } | Self::PartiallyFilled)
    }
}

/// Authoritative local state for one symbol
///
/// Owned by the controller. Performs no I/O: the controller fetches from the
/// gateway and hands the results in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ledger {
    account: AccountState,
    position: PositionState,
    order: OrderState,
}

impl Ledger {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            account: AccountState::default(),
            position: PositionState {
                symbol: symbol.into(),
                quantity: 0,
            },
            order: OrderState::default(),
        }
    }

    pub fn account(&self) -> &AccountState {
        &self.account
    }

    pub fn position(&self) -> &PositionState {
        &self.position
    }

    pub fn order(&self) -> &OrderState {
        &self.order
    }

    pub fn symbol(&self) -> &str {
        &self.position.symbol
    }

    pub fn buying_power(&self) -> Decimal {
        self.account.buying_power()
    }

    /// Store a fetched account; on error the previous values are kept
    pub fn apply_account(&mut self, fetched: Result<AccountSnapshot>) -> Result<()> {
        let snapshot = fetched?;
        self.account = AccountState {
            account_id: snapshot.account_id,
            equity: snapshot.equity,
            margin_multiplier: snapshot.margin_multiplier,
        };
        Ok(())
    }

    /// Store a fetched position
    ///
    /// `PositionNotFound` means the account is flat and is not an error.
    /// Fractional quantities are truncated to whole shares.
    pub fn apply_position(&mut self, fetched: Result<PositionSnapshot>) -> Result<()> {
        let quantity = match fetched {
            Ok(snapshot) => snapshot.quantity.trunc().to_i64().ok_or_else(|| {
                ClientError::InvalidResponse(format!(
                    "position quantity out of range: {}",
                    snapshot.quantity
                ))
            })?,
            Err(ClientError::PositionNotFound(_)) => 0,
            Err(e) => return Err(e),
        };
        self.position.quantity = quantity;
        Ok(())
    }

    /// Start tracking an order we just placed
    pub fn track_order(&mut self, order_id: impl Into<String>) {
        self.order.order_id = Some(order_id.into());
    }

    /// Apply an order-lifecycle event for the tracked symbol
    pub fn apply_order_event(&mut self, event: &OrderUpdateEvent) -> OrderEventOutcome {
        if event.kind.is_terminal() {
            let cleared = self.clear_if_tracked(&event.order_id);
            return match event.kind {
                OrderEventKind::Fill => OrderEventOutcome::Filled { cleared },
                _ => OrderEventOutcome::Closed { cleared },
            };
        }

        match &event.kind {
            OrderEventKind::New => {
                self.order.order_id = Some(event.order_id.clone());
                OrderEventOutcome::Tracked
            }
            OrderEventKind::PartialFill => OrderEventOutcome::PartiallyFilled,
            other => OrderEventOutcome::Unexpected(other.as_str().to_string()),
        }
    }

    fn clear_if_tracked(&mut self, order_id: &str) -> bool {
        if self.order.matches(order_id) {
            self.order.order_id = None;
            true
        } else {
            false
        }
    }
}
