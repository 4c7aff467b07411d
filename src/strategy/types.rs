use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A run of same-direction meaningful price moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Price at which the current run began
    pub start_price: Decimal,
    /// Number of continuations since the run began
    pub count: u32,
    pub increasing: bool,
}

impl Default for StreakState {
    fn default() -> Self {
        Self {
            start_price: Decimal::ZERO,
            count: 0,
            increasing: true,
        }
    }
}

/// Classification of one price observation against the current streak
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakMove {
    /// The move was smaller than epsilon; the streak is untouched
    Insignificant,
    /// Same direction as the streak; carries the incremented state
    Continued(StreakState),
    /// Opposite direction; carries the freshly reset state
    Reversed(StreakState),
}

impl StreakMove {
    /// Streak state after the observation, if it changed
    pub fn streak(&self) -> Option<&StreakState> {
        match self {
            Self::Insignificant => None,
            Self::Continued(streak) | Self::Reversed(streak) => Some(streak),
        }
    }

    pub fn is_meaningful(&self) -> bool {
        !matches!(self, Self::Insignificant)
    }
}

/// Read-only inputs to a strategy decision
///
/// Built by the controller from its ledger and streak tracker for every
/// processed tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionContext {
    pub previous_price: Decimal,
    pub new_price: Decimal,
    pub movement: StreakMove,
    /// Current signed share position
    pub position: i64,
    /// equity × margin multiplier
    pub buying_power: Decimal,
}

/// Why a strategy chose not to act
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoOpReason {
    /// Price moved less than epsilon
    InsignificantMove,
    /// Streak reversed while flat; the new streak must continue first
    AwaitingContinuation,
    /// The computed target equals the current position
    AlreadyAtTarget,
    /// Not even one share fits in the available buying power
    InsufficientBuyingPower,
    /// The computed share count does not fit in a position
    SizeOutOfRange,
}

impl std::fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsignificantMove => write!(f, "insignificant move"),
            Self::AwaitingContinuation => write!(f, "awaiting continuation"),
            Self::AlreadyAtTarget => write!(f, "no-op order requested"),
            Self::InsufficientBuyingPower => write!(f, "insufficient buying power"),
            Self::SizeOutOfRange => write!(f, "order size out of range"),
        }
    }
}

/// Strategy decision output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No action should be taken
    NoOp(NoOpReason),
    /// Bring the position back to zero
    FlattenPosition,
    /// Move the position to `target_position` (`delta` shares from now)
    OpenOrAdjust { target_position: i64, delta: i64 },
}

impl Decision {
    /// Returns true if the decision requires an order
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Self::NoOp(_))
    }

    /// Target position the controller should order toward
    pub fn target_position(&self) -> Option<i64> {
        match self {
            Self::NoOp(_) => None,
            Self::FlattenPosition => Some(0),
            Self::OpenOrAdjust { target_position, .. } => Some(*target_position),
        }
    }
}
