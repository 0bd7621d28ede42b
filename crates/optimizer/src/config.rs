//! Per-bot optimizer configuration (spec §4.9), grounded on
//! `auto_optimizer.py::OptimizationConfig`. Defaults mirror the Python
//! dataclass defaults exactly.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::mode::OptimizationMode;

#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub enabled: bool,
    pub mode: OptimizationMode,

    pub min_trades_for_analysis: u32,
    pub analysis_window_hours: i64,
    pub evaluation_interval_minutes: u32,

    pub max_adjustment_pct: Decimal,
    pub min_adjustment_pct: Decimal,
    pub cooldown_minutes: u32,

    pub min_win_rate: Decimal,
    pub target_win_rate: Decimal,
    pub max_drawdown_pct: Decimal,
    pub min_profit_factor: f64,

    pub max_adjustments_per_day: u32,
    pub revert_on_worse_performance: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: OptimizationMode::Moderate,
            min_trades_for_analysis: 10,
            analysis_window_hours: 24,
            evaluation_interval_minutes: 60,
            max_adjustment_pct: dec!(0.20),
            min_adjustment_pct: dec!(0.05),
            cooldown_minutes: 30,
            min_win_rate: dec!(0.40),
            target_win_rate: dec!(0.55),
            max_drawdown_pct: dec!(0.15),
            min_profit_factor: 1.2,
            max_adjustments_per_day: 5,
            revert_on_worse_performance: true,
        }
    }
}

impl OptimizerConfig {
    /// Applies a mode's preset onto this config, leaving every other field
    /// (thresholds, window sizes, the revert flag) untouched.
    pub fn apply_mode(&mut self, mode: OptimizationMode) {
        let preset = mode.preset();
        self.mode = mode;
        self.max_adjustment_pct = preset.max_adjustment_pct;
        self.min_trades_for_analysis = preset.min_trades_for_analysis;
        self.cooldown_minutes = preset.cooldown_minutes;
        self.max_adjustments_per_day = preset.max_adjustments_per_day;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_moderate_baseline() {
        let config = OptimizerConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.mode, OptimizationMode::Moderate);
        assert_eq!(config.max_adjustments_per_day, 5);
    }

    #[test]
    fn apply_mode_only_touches_mode_scoped_fields() {
        let mut config = OptimizerConfig::default();
        let target_before = config.target_win_rate;
        config.apply_mode(OptimizationMode::Aggressive);
        assert_eq!(config.mode, OptimizationMode::Aggressive);
        assert_eq!(config.max_adjustments_per_day, 10);
        assert_eq!(config.target_win_rate, target_before);
    }
}
