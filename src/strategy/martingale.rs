//! Streak-doubling (martingale) position sizing
//!
//! Each continuation of a streak doubles the stake:
//! `target_value = 2^count × base_bet_fraction × buying_power`, capped at
//! `buying_power − price` so at least one share of headroom remains. The bet
//! leans against the streak: a rising streak targets a short (which the order
//! path clamps to flat), a falling streak targets a long.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::strategy::traits::Strategy;
use crate::strategy::types::{Decision, DecisionContext, NoOpReason, StreakMove};

/// Fraction of buying power staked on the first continuation
pub const DEFAULT_BASE_BET_FRACTION: Decimal = dec!(0.10);

#[derive(Debug, Clone)]
pub struct MartingaleStrategy {
    base_bet_fraction: Decimal,
}

impl MartingaleStrategy {
    pub fn new(base_bet_fraction: Decimal) -> Self {
        Self { base_bet_fraction }
    }

    pub fn base_bet_fraction(&self) -> Decimal {
        self.base_bet_fraction
    }

    /// Notional value to hold after `count` continuations
    ///
    /// `None` when the price is not positive or not even one share fits in
    /// `buying_power`. Overflow of the doubling saturates at the headroom cap.
    pub fn target_value(&self, count: u32, buying_power: Decimal, price: Decimal) -> Option<Decimal> {
        if price <= Decimal::ZERO {
            return None;
        }
        let headroom = buying_power - price;
        if headroom <= Decimal::ZERO {
            return None;
        }

        let doubled = 2u64
            .checked_pow(count)
            .map(Decimal::from)
            .and_then(|multiplier| multiplier.checked_mul(self.base_bet_fraction))
            .and_then(|stake| stake.checked_mul(buying_power));

        Some(match doubled {
            Some(value) => value.min(headroom),
            None => headroom,
        })
    }

    /// Whole shares worth `target_value` at `price`, truncated toward zero
    ///
    /// `None` when the share count does not fit in an `i64` (or the division
    /// overflows, for vanishingly small prices).
    pub fn target_quantity(target_value: Decimal, price: Decimal) -> Option<i64> {
        target_value.checked_div(price)?.trunc().to_i64()
    }
}

impl Default for MartingaleStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_BET_FRACTION)
    }
}

impl Strategy for MartingaleStrategy {
    fn name(&self) -> &'static str {
        "martingale"
    }

    fn decide(&self, ctx: &DecisionContext) -> Decision {
        let streak = match ctx.movement {
            StreakMove::Insignificant => return Decision::NoOp(NoOpReason::InsignificantMove),
            StreakMove::Reversed(_) if ctx.position != 0 => return Decision::FlattenPosition,
            StreakMove::Reversed(_) => return Decision::NoOp(NoOpReason::AwaitingContinuation),
            StreakMove::Continued(streak) => streak,
        };

        let Some(target_value) = self.target_value(streak.count, ctx.buying_power, ctx.new_price) else {
            return Decision::NoOp(NoOpReason::InsufficientBuyingPower);
        };

        let Some(quantity) = Self::target_quantity(target_value, ctx.new_price) else {
            return Decision::NoOp(NoOpReason::SizeOutOfRange);
        };
        let target_position = if streak.increasing { -quantity } else { quantity };
        let Some(delta) = target_position.checked_sub(ctx.position) else {
            return Decision::NoOp(NoOpReason::SizeOutOfRange);
        };

        if delta == 0 {
            Decision::NoOp(NoOpReason::AlreadyAtTarget)
        } else {
            Decision::OpenOrAdjust { target_position, delta }
        }
    }
}
