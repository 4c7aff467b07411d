//! Streak detection over consecutive price moves

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::strategy::types::{StreakMove, StreakState};

/// Smallest price change treated as a real move
pub const DEFAULT_PRICE_EPSILON: Decimal = dec!(0.01);

/// Tracks the current run of same-direction price moves
///
/// Starts out increasing with an empty count. A meaningful move in the
/// streak's direction increments the count; a meaningful move against it
/// resets the count and flips the direction.
#[derive(Debug, Clone)]
pub struct StreakTracker {
    epsilon: Decimal,
    state: StreakState,
}

impl StreakTracker {
    pub fn new() -> Self {
        Self::with_epsilon(DEFAULT_PRICE_EPSILON)
    }

    pub fn with_epsilon(epsilon: Decimal) -> Self {
        Self {
            epsilon,
            state: StreakState::default(),
        }
    }

    pub fn state(&self) -> &StreakState {
        &self.state
    }

    pub fn epsilon(&self) -> Decimal {
        self.epsilon
    }

    /// Classify `new_price` against `previous_price` and update the streak
    pub fn observe(&mut self, previous_price: Decimal, new_price: Decimal) -> StreakMove {
        if (new_price - previous_price).abs() < self.epsilon {
            return StreakMove::Insignificant;
        }

        let increasing = new_price > previous_price;
        if increasing == self.state.increasing {
            self.state.count = self.state.count.saturating_add(1);
            StreakMove::Continued(self.state)
        } else {
            self.state = StreakState {
                start_price: new_price,
                count: 0,
                increasing,
            };
            StreakMove::Reversed(self.state)
        }
    }
}

impl Default for StreakTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_small_move_is_ignored() {
        let mut tracker = StreakTracker::new();
        assert_eq!(tracker.observe(dec!(10.00), dec!(10.005)), StreakMove::Insignificant);
        assert_eq!(tracker.state(), &StreakState::default());
    }

    #[test]
    fn test_exact_epsilon_counts() {
        let mut tracker = StreakTracker::new();
        let movement = tracker.observe(dec!(10.00), dec!(10.01));
        assert!(matches!(movement, StreakMove::Continued(s) if s.count == 1 && s.increasing));
    }

    #[test]
    fn test_reversal_resets() {
        let mut tracker = StreakTracker::new();
        tracker.observe(dec!(10.00), dec!(10.10));
        tracker.observe(dec!(10.10), dec!(10.20));
        assert_eq!(tracker.state().count, 2);

        let movement = tracker.observe(dec!(10.20), dec!(10.05));
        assert_eq!(
            movement,
            StreakMove::Reversed(StreakState {
                start_price: dec!(10.05),
                count: 0,
                increasing: false,
            })
        );

        let movement = tracker.observe(dec!(10.05), dec!(9.90));
        assert!(matches!(movement, StreakMove::Continued(s) if s.count == 1 && !s.increasing));
        assert_eq!(tracker.state().start_price, dec!(10.05));
    }

    #[test]
    fn test_custom_epsilon() {
        let mut tracker = StreakTracker::with_epsilon(dec!(0.50));
        assert_eq!(tracker.observe(dec!(10.00), dec!(10.25)), StreakMove::Insignificant);
        assert!(tracker.observe(dec!(10.00), dec!(10.50)).is_meaningful());
    }

    proptest! {
        #[test]
        fn prop_count_grows_by_one_then_resets(
            start_cents in 100i64..100_000,
            steps in prop::collection::vec(1i64..500, 1..40),
            drop_cents in 1i64..500,
        ) {
            let mut tracker = StreakTracker::new();
            let mut price = Decimal::new(start_cents, 2);

            for (i, step) in steps.iter().enumerate() {
                let next = price + Decimal::new(*step, 2);
                let movement = tracker.observe(price, next);
                prop_assert_eq!(movement.streak().map(|s| s.count), Some(i as u32 + 1));
                prop_assert!(matches!(movement, StreakMove::Continued(_)));
                price = next;
            }

            let next = price - Decimal::new(drop_cents, 2);
            let movement = tracker.observe(price, next);
            prop_assert!(matches!(movement, StreakMove::Reversed(s) if s.count == 0 && !s.increasing));
        }
    }
}
