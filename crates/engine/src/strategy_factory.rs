//! Maps a `BotConfig.strategies` name to a concrete `Strategy` instance.
//! Grounded on the teacher's `util::create_strategy_from_live_config`, which
//! did the same job for the teacher's concrete indicator strategies; since
//! the `strategies` crate now ships only the two test doubles (see
//! SPEC_FULL.md's Strategy boundary module), this factory's recognized set
//! is exactly those two.

use strategies::{AlwaysHoldStrategy, FixedSignalStrategy, Strategy};

use crate::error::EngineError;

pub fn build(name: &str) -> Result<Box<dyn Strategy>, EngineError> {
    match name {
        "always_hold" => Ok(Box::new(AlwaysHoldStrategy::new(name))),
        "fixed_buy" => Ok(Box::new(FixedSignalStrategy::new(
            name,
            core_types::SignalKind::Buy,
            rust_decimal_macros::dec!(0.8),
            rust_decimal_macros::dec!(0.9),
        ))),
        "fixed_sell" => Ok(Box::new(FixedSignalStrategy::new(
            name,
            core_types::SignalKind::Sell,
            rust_decimal_macros::dec!(0.8),
            rust_decimal_macros::dec!(0.9),
        ))),
        other => Err(EngineError::UnknownStrategy(other.to_string())),
    }
}
