//! Strategy boundary (spec §4.2 Strategies, which is explicitly out of
//! scope for signal-generation math — see Non-goals). This crate keeps only
//! the seam: the `Strategy` trait every bot cycles through, plus two test
//! doubles (`AlwaysHoldStrategy`, `FixedSignalStrategy`) used to exercise the
//! engine's fan-out and weighted-vote combination without depending on real
//! indicator math.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** Pure logic crate. No databases, no APIs, no
//!   execution. Depends only on `core-types` and `seasonal`.
//! - **Strategy Agnostic Engine:** The `engine` crate operates on any
//!   `Strategy` trait object without knowing its internals.

pub mod error;
pub mod test_doubles;

pub use error::StrategyError;
pub use test_doubles::{AlwaysHoldStrategy, FixedSignalStrategy};

use core_types::{Bar, Signal};
use seasonal::SeasonalContext;

/// The interface every bot cycles through once per symbol per evaluation
/// tick (spec §4.7 Bot Instance worker loop, step "strategy fan-out").
///
/// `&mut self` because most real strategies carry indicator state across
/// calls. `Send + Sync` because strategy instances are shared across the
/// bot's `tokio::task` and the optimizer's evaluation loop.
pub trait Strategy: Send + Sync {
    /// Evaluates the strategy against the latest bar history for `symbol`,
    /// informed by the current seasonal context.
    ///
    /// Returns `Ok(None)` when there is nothing actionable to signal —
    /// this is the common case, not an error.
    fn analyze(
        &mut self,
        symbol: &str,
        bars: &[Bar],
        seasonal_context: &SeasonalContext,
    ) -> Result<Option<Signal>, StrategyError>;

    /// A human-readable name used as `Signal::strategy_name` and in
    /// telemetry/logging.
    fn name(&self) -> &str;
}
