use crate::strategy::types::{Decision, DecisionContext};

/// Core strategy trait
///
/// Strategies map a [`DecisionContext`] to a [`Decision`]. They hold only
/// their own parameters; position, buying power and streak state are owned by
/// the controller and handed in read-only.
///
/// # Implementation Notes
///
/// - `decide` should be fast - no blocking I/O
/// - the controller performs the resulting order placement
///
/// # Example
///
/// ```ignore
/// struct FlattenOnReversal;
///
/// impl Strategy for FlattenOnReversal {
///     fn name(&self) -> &'static str { "flatten_on_reversal" }
///
///     fn decide(&self, ctx: &DecisionContext) -> Decision {
///         match ctx.movement {
///             StreakMove::Reversed(_) if ctx.position != 0 => Decision::FlattenPosition,
///             _ => Decision::NoOp(NoOpReason::AwaitingContinuation),
///         }
///     }
/// }
/// ```
pub trait Strategy: Send + Sync {
    /// Unique identifier for this strategy
    fn name(&self) -> &'static str;

    /// Decide what to do about the latest processed tick
    fn decide(&self, ctx: &DecisionContext) -> Decision;
}

/// Boxed strategy for dynamic dispatch
pub type BoxedStrategy = Box<dyn Strategy>;
