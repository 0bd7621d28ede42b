//! Optimization mode presets (spec §4.9), grounded on
//! `auto_optimizer.py::BotAutoOptimizer.set_mode`. Each mode dials in a
//! different `max_adjustment_pct` / `min_trades_for_analysis` /
//! `cooldown_minutes` / `max_adjustments_per_day` combination; everything
//! else in `OptimizerConfig` is left untouched by a mode switch.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OptimizationMode {
    Conservative,
    Moderate,
    Aggressive,
}

#[derive(Debug, Clone, Copy)]
pub struct ModePreset {
    pub max_adjustment_pct: Decimal,
    pub min_trades_for_analysis: u32,
    pub cooldown_minutes: u32,
    pub max_adjustments_per_day: u32,
}

impl OptimizationMode {
    pub fn preset(self) -> ModePreset {
        match self {
            OptimizationMode::Conservative => ModePreset {
                max_adjustment_pct: dec!(0.10),
                min_trades_for_analysis: 20,
                cooldown_minutes: 60,
                max_adjustments_per_day: 3,
            },
            OptimizationMode::Moderate => ModePreset {
                max_adjustment_pct: dec!(0.20),
                min_trades_for_analysis: 10,
                cooldown_minutes: 30,
                max_adjustments_per_day: 5,
            },
            OptimizationMode::Aggressive => ModePreset {
                max_adjustment_pct: dec!(0.35),
                min_trades_for_analysis: 5,
                cooldown_minutes: 15,
                max_adjustments_per_day: 10,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggressive_allows_bigger_faster_adjustments_than_conservative() {
        let conservative = OptimizationMode::Conservative.preset();
        let aggressive = OptimizationMode::Aggressive.preset();
        assert!(aggressive.max_adjustment_pct > conservative.max_adjustment_pct);
        assert!(aggressive.cooldown_minutes < conservative.cooldown_minutes);
        assert!(aggressive.max_adjustments_per_day > conservative.max_adjustments_per_day);
    }
}
