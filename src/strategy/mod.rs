//! Strategy module for trade decision making
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CONTROLLER (owns state)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Tick arrives                                               │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  StreakTracker.observe() → Insignificant/Continued/Reversed │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  Strategy.decide(ctx) → NoOp / Flatten / OpenOrAdjust       │
//! │       │                                                     │
//! │       ▼ (if actionable)                                     │
//! │  Controller places a day limit order                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`Strategy`]: Trait for implementing trading strategies
//! - [`Decision`]: NoOp / FlattenPosition / OpenOrAdjust
//! - [`StreakTracker`]: Classifies price moves into streaks
//! - [`MartingaleStrategy`]: Contrarian streak-doubling sizing
//! - [`DecisionContext`]: Read-only state provided to strategies

mod martingale;
mod streak;
mod traits;
mod types;

pub use types::{Decision, DecisionContext, NoOpReason, StreakMove, StreakState};

pub use traits::{BoxedStrategy, Strategy};

pub use streak::{StreakTracker, DEFAULT_PRICE_EPSILON};

pub use martingale::{MartingaleStrategy, DEFAULT_BASE_BET_FRACTION};
