//! Controller module: local state and event dispatch for one tracked symbol
//!
//! ```text
//!  BrokerGateway ──ticks──────────▶ ┌──────────────┐
//!                ──order updates──▶ │  Controller  │──place/cancel──▶ BrokerGateway
//!                                   │   Ledger     │
//!                                   │ StreakTracker│
//!                                   │   Strategy   │
//!                                   └──────────────┘
//! ```
//!
//! The controller is the only writer of the [`Ledger`] and the streak state.
//! Handlers run one at a time inside [`Controller::run`].

mod event_loop;
mod ledger;

pub use event_loop::{Controller, ControllerState, TickOutcome};
pub use ledger::{AccountState, Ledger, OrderEventOutcome, OrderState, PositionState};
