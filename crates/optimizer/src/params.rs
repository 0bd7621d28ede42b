//! The closed set of strategy parameters the auto-optimizer is allowed to
//! touch (spec §4.9), grounded on `auto_optimizer.py`'s `ADJUSTABLE_PARAMETERS`
//! table. A bot's live parameter set is an opaque `HashMap<String, Decimal>`
//! owned by whoever registers it (the engine, in production; a plain map in
//! tests) — the optimizer never assumes a parameter struct shape beyond these
//! twelve names.

use std::collections::HashMap;

use core_types::ParamDirection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Inclusive bounds and tuning direction for one adjustable parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamLimits {
    pub min: Decimal,
    pub max: Decimal,
    pub direction: ParamDirection,
}

impl ParamLimits {
    pub fn clamp(&self, value: Decimal) -> Decimal {
        value.max(self.min).min(self.max)
    }
}

/// The twelve adjustable parameter names, matching the Python original
/// exactly so a value persisted by one side round-trips through the other.
pub const ADJUSTABLE_PARAMETER_NAMES: [&str; 12] = [
    "stop_loss_pct",
    "take_profit_pct",
    "position_size_pct",
    "max_positions",
    "rsi_oversold",
    "rsi_overbought",
    "ma_fast_period",
    "ma_slow_period",
    "momentum_threshold",
    "volume_threshold",
    "min_confidence",
    "signal_strength_threshold",
];

/// Builds the full `name -> limits` table. Kept as a function rather than a
/// `static` because `ParamDirection` has no `const` constructor ergonomics
/// worth fighting for here; the table is tiny and built once per call site.
pub fn adjustable_parameters() -> HashMap<String, ParamLimits> {
    use ParamDirection::{MaximizeProfit, MinimizeLoss, Optimize};

    let entries: [(&str, Decimal, Decimal, ParamDirection); 12] = [
        ("stop_loss_pct", dec!(0.01), dec!(0.10), MinimizeLoss),
        ("take_profit_pct", dec!(0.02), dec!(0.20), MaximizeProfit),
        ("position_size_pct", dec!(0.01), dec!(0.10), Optimize),
        ("max_positions", dec!(1), dec!(10), Optimize),
        ("rsi_oversold", dec!(20), dec!(40), Optimize),
        ("rsi_overbought", dec!(60), dec!(80), Optimize),
        ("ma_fast_period", dec!(5), dec!(20), Optimize),
        ("ma_slow_period", dec!(20), dec!(100), Optimize),
        ("momentum_threshold", dec!(0.02), dec!(0.15), Optimize),
        ("volume_threshold", dec!(1.0), dec!(3.0), Optimize),
        ("min_confidence", dec!(0.5), dec!(0.9), Optimize),
        ("signal_strength_threshold", dec!(0.3), dec!(0.8), Optimize),
    ];

    entries
        .into_iter()
        .map(|(name, min, max, direction)| (name.to_string(), ParamLimits { min, max, direction }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_table_carries_every_named_parameter() {
        let table = adjustable_parameters();
        for name in ADJUSTABLE_PARAMETER_NAMES {
            assert!(table.contains_key(name), "missing limits for {name}");
        }
    }

    #[test]
    fn clamp_caps_at_the_configured_bounds() {
        let limits = ParamLimits { min: dec!(0.01), max: dec!(0.10), direction: ParamDirection::Optimize };
        assert_eq!(limits.clamp(dec!(0.50)), dec!(0.10));
        assert_eq!(limits.clamp(dec!(-1)), dec!(0.01));
        assert_eq!(limits.clamp(dec!(0.05)), dec!(0.05));
    }
}
