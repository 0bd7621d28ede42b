//! Owns one `BotAutoOptimizer` per registered bot (spec §4.9), grounded on
//! `auto_optimizer.py::AutoOptimizerManager`. Unlike the Python original's
//! module-level `get_auto_optimizer_manager()` singleton, this manager is an
//! explicit value a caller's `AppContext` owns (spec §9 Design Notes: no
//! singletons).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use core_types::BotId;
use events::{TelemetryEvent, TelemetrySink};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::bot_optimizer::{BotAutoOptimizer, OptimizerStatus};
use crate::config::OptimizerConfig;
use crate::error::OptimizerError;
use crate::mode::OptimizationMode;

type ParamMap = HashMap<String, Decimal>;

/// Priority-ordered hint surfaced by `get_recommendations` (spec §4.9).
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub bot_id: BotId,
    pub priority: RecommendationPriority,
    pub issue: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

pub struct AutoOptimizerManager {
    optimizers: Mutex<HashMap<BotId, BotAutoOptimizer>>,
    telemetry: TelemetrySink,
}

impl AutoOptimizerManager {
    pub fn new(telemetry: TelemetrySink) -> Self {
        Self { optimizers: Mutex::new(HashMap::new()), telemetry }
    }

    pub async fn register_bot(
        &self,
        bot_id: BotId,
        get_params: impl Fn() -> ParamMap + Send + Sync + 'static,
        set_params: impl Fn(ParamMap) + Send + Sync + 'static,
        config: OptimizerConfig,
    ) -> Result<(), OptimizerError> {
        let mut optimizers = self.optimizers.lock().await;
        if optimizers.contains_key(&bot_id) {
            return Err(OptimizerError::AlreadyRegistered(bot_id));
        }
        optimizers.insert(bot_id.clone(), BotAutoOptimizer::new(bot_id, get_params, set_params, config));
        Ok(())
    }

    pub async fn unregister_bot(&self, bot_id: &str) {
        self.optimizers.lock().await.remove(bot_id);
    }

    pub async fn enable_bot(&self, bot_id: &str, mode: OptimizationMode) -> Result<(), OptimizerError> {
        let mut optimizers = self.optimizers.lock().await;
        let optimizer = optimizers.get_mut(bot_id).ok_or_else(|| OptimizerError::UnknownBot(bot_id.to_string()))?;
        optimizer.set_mode(mode);
        optimizer.enable();
        Ok(())
    }

    pub async fn disable_bot(&self, bot_id: &str) -> Result<(), OptimizerError> {
        let mut optimizers = self.optimizers.lock().await;
        let optimizer = optimizers.get_mut(bot_id).ok_or_else(|| OptimizerError::UnknownBot(bot_id.to_string()))?;
        optimizer.disable();
        Ok(())
    }

    pub async fn enable_all(&self, mode: OptimizationMode) -> usize {
        let mut optimizers = self.optimizers.lock().await;
        for optimizer in optimizers.values_mut() {
            optimizer.set_mode(mode);
            optimizer.enable();
        }
        optimizers.len()
    }

    pub async fn disable_all(&self) -> usize {
        let mut optimizers = self.optimizers.lock().await;
        for optimizer in optimizers.values_mut() {
            optimizer.disable();
        }
        optimizers.len()
    }

    pub async fn record_trade(&self, bot_id: &str, pnl: Decimal, now: DateTime<Utc>) {
        if let Some(optimizer) = self.optimizers.lock().await.get_mut(bot_id) {
            optimizer.record_trade(pnl, now);
        }
    }

    /// Evaluates every enabled, due bot and publishes a `ParameterAdjustment`
    /// telemetry event for anything that changed. A bot is "due" when it has
    /// never evaluated or its own `evaluation_interval_minutes` has elapsed —
    /// each bot runs on its own cadence rather than a single global tick.
    pub async fn tick(&self, now: DateTime<Utc>) {
        let mut optimizers = self.optimizers.lock().await;
        for optimizer in optimizers.values_mut() {
            if !optimizer.is_enabled() {
                continue;
            }
            let due = match optimizer.last_evaluated() {
                None => true,
                Some(last) => now - last >= chrono::Duration::minutes(optimizer.config().evaluation_interval_minutes as i64),
            };
            if !due {
                continue;
            }

            let before = optimizer.get_status(now).total_adjustments;
            optimizer.evaluate_and_adjust(now);
            let status = optimizer.get_status(now);
            if status.total_adjustments > before {
                for adjustment in status.recent_adjustments.iter().rev().take(status.total_adjustments - before) {
                    self.telemetry.publish(TelemetryEvent::ParameterAdjustment {
                        bot_id: optimizer.bot_id().to_string(),
                        adjustment: adjustment.clone(),
                    });
                }
            }
        }
    }

    pub async fn get_status(&self, bot_id: &str, now: DateTime<Utc>) -> Result<OptimizerStatus, OptimizerError> {
        self.optimizers
            .lock()
            .await
            .get(bot_id)
            .map(|o| o.get_status(now))
            .ok_or_else(|| OptimizerError::UnknownBot(bot_id.to_string()))
    }

    pub async fn get_all_status(&self, now: DateTime<Utc>) -> Vec<OptimizerStatus> {
        self.optimizers.lock().await.values().map(|o| o.get_status(now)).collect()
    }

    /// Snapshots every registered bot's durable state (spec §6.4), for a
    /// caller to hand to `database::save_optimizer_state` one at a time.
    pub async fn export_state(&self) -> Vec<crate::state::OptimizerState> {
        self.optimizers.lock().await.values().map(|o| o.to_state()).collect()
    }

    /// Restores a previously-saved snapshot onto an already-registered bot.
    pub async fn import_state(&self, state: crate::state::OptimizerState) -> Result<(), OptimizerError> {
        let mut optimizers = self.optimizers.lock().await;
        let optimizer =
            optimizers.get_mut(state.bot_id()).ok_or_else(|| OptimizerError::UnknownBot(state.bot_id().clone()))?;
        optimizer.restore_state(state);
        Ok(())
    }

    /// Priority-sorted recommendations across all registered bots, matching
    /// the Python original's `get_recommendations` thresholds.
    pub async fn get_recommendations(&self, now: DateTime<Utc>) -> Vec<Recommendation> {
        let optimizers = self.optimizers.lock().await;
        let mut recommendations = Vec::new();

        for optimizer in optimizers.values() {
            let Some(metrics) = optimizer.calculate_metrics(now) else { continue };

            if metrics.win_rate < rust_decimal_macros::dec!(0.40) {
                recommendations.push(Recommendation {
                    bot_id: optimizer.bot_id().to_string(),
                    priority: RecommendationPriority::High,
                    issue: "low win rate".to_string(),
                    suggestion: "enable auto-optimization in conservative mode".to_string(),
                });
            }

            if metrics.max_drawdown > rust_decimal_macros::dec!(0.15) {
                recommendations.push(Recommendation {
                    bot_id: optimizer.bot_id().to_string(),
                    priority: RecommendationPriority::High,
                    issue: "high drawdown".to_string(),
                    suggestion: "reduce position sizes and tighten stops".to_string(),
                });
            }

            if metrics.profit_factor.map(|pf| pf < 1.2).unwrap_or(false) {
                recommendations.push(Recommendation {
                    bot_id: optimizer.bot_id().to_string(),
                    priority: RecommendationPriority::Medium,
                    issue: "poor risk/reward".to_string(),
                    suggestion: "adjust take profit and stop loss ratios".to_string(),
                });
            }
        }

        recommendations.sort_by_key(|r| r.priority);
        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    fn manager() -> AutoOptimizerManager {
        AutoOptimizerManager::new(TelemetrySink::new(16))
    }

    async fn register(manager: &AutoOptimizerManager, bot_id: &str) {
        let store = Arc::new(StdMutex::new(HashMap::from([("min_confidence".to_string(), Decimal::new(6, 1))])));
        let get_store = Arc::clone(&store);
        let set_store = Arc::clone(&store);
        manager
            .register_bot(
                bot_id.to_string(),
                move || get_store.lock().unwrap().clone(),
                move |p| *set_store.lock().unwrap() = p,
                OptimizerConfig { min_trades_for_analysis: 1, ..OptimizerConfig::default() },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn registering_the_same_bot_twice_is_rejected() {
        let manager = manager();
        register(&manager, "bot-1").await;
        let mut store = HashMap::new();
        store.insert("x".to_string(), Decimal::ZERO);
        let result = manager.register_bot("bot-1".to_string(), move || store.clone(), |_| {}, OptimizerConfig::default()).await;
        assert!(matches!(result, Err(OptimizerError::AlreadyRegistered(_))));
    }

    #[tokio::test]
    async fn enable_bot_applies_the_requested_mode() {
        let manager = manager();
        register(&manager, "bot-1").await;
        manager.enable_bot("bot-1", OptimizationMode::Aggressive).await.unwrap();
        let status = manager.get_status("bot-1", Utc::now()).await.unwrap();
        assert!(status.enabled);
        assert_eq!(status.mode, OptimizationMode::Aggressive);
    }

    #[tokio::test]
    async fn unregistering_a_bot_removes_it_from_status_queries() {
        let manager = manager();
        register(&manager, "bot-1").await;
        manager.unregister_bot("bot-1").await;
        let result = manager.get_status("bot-1", Utc::now()).await;
        assert!(matches!(result, Err(OptimizerError::UnknownBot(_))));
    }
}
