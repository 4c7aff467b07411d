//! The trading controller: startup reconciliation and the event dispatch loop

use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::ledger::{Ledger, OrderEventOutcome};
use crate::common::channels::{create_order_update_channel, create_tick_channel};
use crate::common::errors::{Result, TradingError, TradingResult};
use crate::common::traits::BrokerGateway;
use crate::common::types::{OrderRequest, OrderUpdateEvent, Side, TickEvent};
use crate::config::types::TradingConfig;
use crate::strategy::{BoxedStrategy, Decision, DecisionContext, StreakTracker};

/// Lifecycle of a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Ready,
    Running,
    ShuttingDown,
}

/// What the controller did with a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick was for another symbol
    UnrelatedSymbol,
    /// Arrived inside the debounce window
    Debounced,
    /// Passed the debounce but fell between samples
    Skipped,
    /// First processed tick; only recorded the price
    Seeded,
    /// Ran the strategy and acted on its decision
    Evaluated(Decision),
}

/// Drives one symbol: owns the ledger and streak state, dispatches gateway
/// events to the strategy and places orders.
pub struct Controller<G: BrokerGateway> {
    gateway: Arc<G>,
    strategy: BoxedStrategy,
    config: TradingConfig,
    ledger: Ledger,
    streak: StreakTracker,
    last_price: Option<Decimal>,
    last_processed_at: Option<Instant>,
    debounced_ticks: u64,
    state: ControllerState,
}

impl<G: BrokerGateway> Controller<G> {
    pub fn new(gateway: Arc<G>, strategy: BoxedStrategy, config: TradingConfig) -> Self {
        Self {
            gateway,
            strategy,
            ledger: Ledger::new(config.symbol.clone()),
            streak: StreakTracker::with_epsilon(config.price_epsilon),
            config,
            last_price: None,
            last_processed_at: None,
            debounced_ticks: 0,
            state: ControllerState::Uninitialized,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn streak(&self) -> &StreakTracker {
        &self.streak
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn last_price(&self) -> Option<Decimal> {
        self.last_price
    }

    /// Establish a known starting state
    ///
    /// Cancels every open order on the account so stale orders cannot hold
    /// buying power, then loads the position and the account. Any failure is
    /// fatal.
    #[instrument(skip(self), fields(symbol = %self.config.symbol, broker = self.gateway.broker_name()))]
    pub async fn initialize(&mut self) -> TradingResult<()> {
        if self.state != ControllerState::Uninitialized {
            return Err(TradingError::InvalidState(format!(
                "initialize called in state {:?}",
                self.state
            )));
        }

        self.gateway
            .cancel_all_open_orders()
            .await
            .map_err(|source| TradingError::Startup {
                stage: "canceling all open orders",
                source,
            })?;

        self.refresh_position()
            .await
            .map_err(|source| TradingError::Startup {
                stage: "fetching position",
                source,
            })?;

        self.refresh_account()
            .await
            .map_err(|source| TradingError::Startup {
                stage: "fetching account",
                source,
            })?;

        self.state = ControllerState::Ready;
        info!(
            position = self.ledger.position().quantity,
            equity = %self.ledger.account().equity.round_dp(2),
            buying_power = %self.ledger.buying_power().round_dp(2),
            strategy = self.strategy.name(),
            "Loaded initial state"
        );
        Ok(())
    }

    /// Re-fetch the account; on failure the stale values are kept
    pub async fn refresh_account(&mut self) -> Result<()> {
        let fetched = self.gateway.get_account().await;
        self.ledger.apply_account(fetched)
    }

    /// Re-fetch the position; a missing position means flat
    pub async fn refresh_position(&mut self) -> Result<()> {
        let fetched = self.gateway.get_position(&self.config.symbol).await;
        self.ledger.apply_position(fetched)
    }

    /// Cancel open orders for the tracked symbol
    async fn cancel_symbol_orders(&self) -> Result<usize> {
        let order_ids = self
            .gateway
            .list_open_orders(Some(&self.config.symbol), self.config.open_order_limit)
            .await?;
        for order_id in &order_ids {
            debug!(order_id = %order_id, "Canceling pre-existing order");
            self.gateway.cancel_order(order_id).await?;
        }
        Ok(order_ids.len())
    }

    /// Subscribe to both streams and dispatch events until `shutdown` resolves,
    /// then unsubscribe.
    ///
    /// A stream that closes on its own stops the loop with
    /// `TradingError::StreamEnded`; nothing reconnects it.
    pub async fn run<F>(&mut self, shutdown: F) -> TradingResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        if self.state != ControllerState::Ready {
            return Err(TradingError::InvalidState(format!(
                "run called in state {:?}",
                self.state
            )));
        }

        let canceled = self
            .cancel_symbol_orders()
            .await
            .map_err(|source| TradingError::Startup {
                stage: "canceling open orders for symbol",
                source,
            })?;
        if canceled > 0 {
            info!(canceled, symbol = %self.config.symbol, "Canceled pre-existing orders");
        }

        let (tick_tx, mut tick_rx) = create_tick_channel();
        let (order_tx, mut order_rx) = create_order_update_channel();

        self.gateway
            .subscribe_ticks(&self.config.symbol, tick_tx)
            .await
            .map_err(|source| TradingError::Startup {
                stage: "subscribing to ticks",
                source,
            })?;

        if let Err(source) = self.gateway.subscribe_order_updates(order_tx).await {
            self.shutdown().await;
            return Err(TradingError::Startup {
                stage: "subscribing to order updates",
                source,
            });
        }

        self.state = ControllerState::Running;
        info!(symbol = %self.config.symbol, "Listening for ticks and order updates");

        tokio::pin!(shutdown);

        let ended = loop {
            // order updates first so a tick sees the latest order state
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Received shutdown signal");
                    break None;
                }
                update = order_rx.recv() => match update {
                    Some(update) => {
                        self.handle_order_update(&update).await;
                    }
                    None => break Some("order update"),
                },
                tick = tick_rx.recv() => match tick {
                    Some(tick) => {
                        self.handle_tick(&tick).await;
                    }
                    None => break Some("tick"),
                },
            }
        };

        self.shutdown().await;

        match ended {
            None => Ok(()),
            Some(stream) => {
                error!(stream, symbol = %self.config.symbol, "Stream ended without a shutdown signal");
                Err(TradingError::StreamEnded(stream))
            }
        }
    }

    /// Unsubscribe from both streams; failures are logged only
    pub async fn shutdown(&mut self) {
        self.state = ControllerState::ShuttingDown;
        info!(symbol = %self.config.symbol, "Closing data streams");

        if let Err(e) = self.gateway.unsubscribe_ticks(&self.config.symbol).await {
            warn!(error = %e, symbol = %self.config.symbol, "Failed to unsubscribe from ticks");
        }
        if let Err(e) = self.gateway.unsubscribe_order_updates().await {
            warn!(error = %e, "Failed to unsubscribe from order updates");
        }
    }

    /// Handle one trade tick
    pub async fn handle_tick(&mut self, tick: &TickEvent) -> TickOutcome {
        if tick.symbol != self.config.symbol {
            debug!(symbol = %tick.symbol, "Ignoring tick for unrelated symbol");
            return TickOutcome::UnrelatedSymbol;
        }

        let now = Instant::now();
        if let Some(last) = self.last_processed_at {
            if now.duration_since(last) < self.config.tick_debounce() {
                return TickOutcome::Debounced;
            }
        }
        self.last_processed_at = Some(now);

        self.debounced_ticks += 1;
        if (self.debounced_ticks - 1) % u64::from(self.config.sample_every.max(1)) != 0 {
            return TickOutcome::Skipped;
        }

        let Some(previous_price) = self.last_price.replace(tick.price) else {
            info!(symbol = %tick.symbol, price = %tick.price, "Seeded reference price");
            return TickOutcome::Seeded;
        };

        let movement = self.streak.observe(previous_price, tick.price);
        let ctx = DecisionContext {
            previous_price,
            new_price: tick.price,
            movement,
            position: self.ledger.position().quantity,
            buying_power: self.ledger.buying_power(),
        };
        let decision = self.strategy.decide(&ctx);

        info!(
            symbol = %tick.symbol,
            previous_price = %previous_price.round_dp(2),
            tick_price = %tick.price.round_dp(2),
            streak_count = self.streak.state().count,
            increasing = self.streak.state().increasing,
            ?decision,
            "Handled tick"
        );

        self.act_on(decision, tick.price).await;

        if let Err(e) = self.refresh_account().await {
            error!(error = %e, symbol = %tick.symbol, "Failed to refresh account after tick");
        }

        TickOutcome::Evaluated(decision)
    }

    async fn act_on(&mut self, decision: Decision, price: Decimal) {
        let Some(target_position) = decision.target_position() else {
            debug!(?decision, "No action");
            return;
        };

        match self.send_limit_order(target_position, price).await {
            Ok(order_id) => {
                info!(order_id = %order_id, target_position, price = %price, "Placed limit order");
            }
            Err(e) if e.is_benign() => {
                debug!(reason = %e, target_position, "Skipped order");
            }
            Err(e) => {
                error!(
                    error = %e,
                    symbol = %self.config.symbol,
                    price = %price,
                    target_position,
                    "Order placement failed"
                );
            }
        }
    }

    /// Move the position toward `target_position` with a day limit order
    ///
    /// Negative targets are treated as flat. Fails with `NoOpOrder` when the
    /// position would not change and with `OrderOutstanding` while another
    /// order is working; neither touches the gateway. On success the returned
    /// broker order ID becomes the tracked order.
    pub async fn send_limit_order(
        &mut self,
        target_position: i64,
        target_price: Decimal,
    ) -> TradingResult<String> {
        let current = self.ledger.position().quantity;
        let delta = target_position.max(0) - current.max(0);
        if delta == 0 {
            return Err(TradingError::NoOpOrder);
        }

        if let Some(order_id) = &self.ledger.order().order_id {
            return Err(TradingError::OrderOutstanding(order_id.clone()));
        }

        let side = if delta > 0 { Side::Buy } else { Side::Sell };
        let request = OrderRequest::day_limit(
            self.config.symbol.clone(),
            side,
            delta.unsigned_abs(),
            target_price,
        );

        let order_id = self.gateway.place_order(&request).await?;
        self.ledger.track_order(order_id.clone());
        Ok(order_id)
    }

    /// Handle one order-lifecycle event
    ///
    /// Returns `None` when the event belongs to another symbol.
    pub async fn handle_order_update(&mut self, event: &OrderUpdateEvent) -> Option<OrderEventOutcome> {
        if event.symbol != self.config.symbol {
            debug!(symbol = %event.symbol, order_id = %event.order_id, "Ignoring order update for unrelated symbol");
            return None;
        }

        info!(event = %event.kind, order_id = %event.order_id, "Handling order update");

        let outcome = self.ledger.apply_order_event(event);

        if outcome.requires_position_refresh() {
            match self.refresh_position().await {
                Ok(()) => info!(
                    symbol = %event.symbol,
                    position = self.ledger.position().quantity,
                    "Updated position"
                ),
                Err(e) => error!(
                    error = %e,
                    order_id = %event.order_id,
                    "Failed to refresh position after fill"
                ),
            }
        }

        if let OrderEventOutcome::Unexpected(kind) = &outcome {
            warn!(event = %kind, order_id = %event.order_id, "Unexpected order event type");
        }

        Some(outcome)
    }
}
