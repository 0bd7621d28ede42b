//! Persisted per-bot optimizer state (spec §6.4): tagged-union JSON with a
//! version field so readers accept older versions, mirroring
//! `compliance::snapshot::ComplianceSnapshot`. Trade/PnL/metrics history
//! rings are not persisted — they rebuild from live trading within
//! `min_trades_for_analysis` trades of a restart, and carrying them would
//! mean serializing up to 1000-entry `VecDeque`s on every adjustment.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use core_types::{BotId, ParameterAdjustment};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::mode::OptimizationMode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "version")]
pub enum OptimizerState {
    #[serde(rename = "1")]
    V1 {
        bot_id: BotId,
        enabled: bool,
        mode: OptimizationMode,
        baseline_params: HashMap<String, Decimal>,
        best_params: HashMap<String, Decimal>,
        best_performance: Decimal,
        adjustments: Vec<ParameterAdjustment>,
        last_adjustment_time: Option<DateTime<Utc>>,
        adjustments_today: u32,
        last_reset_date: Option<NaiveDate>,
    },
}

impl OptimizerState {
    pub fn bot_id(&self) -> &BotId {
        match self {
            OptimizerState::V1 { bot_id, .. } => bot_id,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OptimizerState {
        OptimizerState::V1 {
            bot_id: "bot-1".to_string(),
            enabled: true,
            mode: OptimizationMode::Moderate,
            baseline_params: HashMap::new(),
            best_params: HashMap::new(),
            best_performance: Decimal::ZERO,
            adjustments: Vec::new(),
            last_adjustment_time: None,
            adjustments_today: 0,
            last_reset_date: None,
        }
    }

    #[test]
    fn round_trips_through_json() {
        let state = sample();
        let json = state.to_json().unwrap();
        assert!(json.contains("\"version\":\"1\""));
        assert_eq!(OptimizerState::from_json(&json).unwrap(), state);
    }
}
