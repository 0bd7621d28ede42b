//! Per-bot auto-optimizer (spec §4.9), grounded on
//! `auto_optimizer.py::BotAutoOptimizer`. Owns bounded history rings and the
//! `get_params`/`set_params` callbacks a registrant supplies instead of a
//! back-reference to the bot itself (spec §9 Design Notes: no cyclic
//! references between `engine` and `optimizer`).

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, NaiveDate, Utc};
use core_types::{AdjustmentType, BotId, ParameterAdjustment, PerformanceMetrics, Trend};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::OptimizerConfig;
use crate::mode::OptimizationMode;
use crate::params::{adjustable_parameters, ParamLimits};

const TRADE_HISTORY_CAP: usize = 500;
const PNL_HISTORY_CAP: usize = 1000;
const METRICS_HISTORY_CAP: usize = 1000;
const RECENT_ADJUSTMENTS_LIMIT: usize = 10;

/// One closed trade, as reported by whatever records fills for this bot.
#[derive(Debug, Clone)]
pub struct TradeResult {
    pub pnl: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// A snapshot of a `BotAutoOptimizer`'s state, cheap to clone for reporting.
#[derive(Debug, Clone)]
pub struct OptimizerStatus {
    pub bot_id: BotId,
    pub enabled: bool,
    pub mode: OptimizationMode,
    pub current_metrics: Option<PerformanceMetrics>,
    pub total_adjustments: usize,
    pub adjustments_today: u32,
    pub last_adjustment_time: Option<DateTime<Utc>>,
    pub recent_adjustments: Vec<ParameterAdjustment>,
    pub best_performance: Decimal,
}

type ParamMap = HashMap<String, Decimal>;

pub struct BotAutoOptimizer {
    bot_id: BotId,
    config: OptimizerConfig,
    limits: HashMap<String, ParamLimits>,

    get_params: Box<dyn Fn() -> ParamMap + Send + Sync>,
    set_params: Box<dyn Fn(ParamMap) + Send + Sync>,

    trade_results: VecDeque<TradeResult>,
    pnl_history: VecDeque<Decimal>,
    metrics_history: VecDeque<PerformanceMetrics>,

    adjustments: Vec<ParameterAdjustment>,
    last_adjustment_time: Option<DateTime<Utc>>,
    adjustments_today: u32,
    last_reset_date: Option<NaiveDate>,

    baseline_params: ParamMap,
    best_params: ParamMap,
    best_performance: Decimal,

    last_evaluated: Option<DateTime<Utc>>,
}

impl BotAutoOptimizer {
    pub fn new(
        bot_id: BotId,
        get_params: impl Fn() -> ParamMap + Send + Sync + 'static,
        set_params: impl Fn(ParamMap) + Send + Sync + 'static,
        config: OptimizerConfig,
    ) -> Self {
        Self {
            bot_id,
            config,
            limits: adjustable_parameters(),
            get_params: Box::new(get_params),
            set_params: Box::new(set_params),
            trade_results: VecDeque::new(),
            pnl_history: VecDeque::new(),
            metrics_history: VecDeque::new(),
            adjustments: Vec::new(),
            last_adjustment_time: None,
            adjustments_today: 0,
            last_reset_date: None,
            baseline_params: HashMap::new(),
            best_params: HashMap::new(),
            best_performance: Decimal::ZERO,
            last_evaluated: None,
        }
    }

    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Enables auto-optimization and snapshots the current params as the
    /// baseline `reset()` reverts to.
    pub fn enable(&mut self) {
        self.config.enabled = true;
        self.baseline_params = (self.get_params)();
    }

    pub fn disable(&mut self) {
        self.config.enabled = false;
    }

    pub fn set_mode(&mut self, mode: OptimizationMode) {
        self.config.apply_mode(mode);
    }

    /// Records a closed trade's P&L for later analysis.
    pub fn record_trade(&mut self, pnl: Decimal, now: DateTime<Utc>) {
        self.trade_results.push_back(TradeResult { pnl, timestamp: now });
        if self.trade_results.len() > TRADE_HISTORY_CAP {
            self.trade_results.pop_front();
        }
        self.pnl_history.push_back(pnl);
        if self.pnl_history.len() > PNL_HISTORY_CAP {
            self.pnl_history.pop_front();
        }
    }

    fn record_metrics(&mut self, metrics: PerformanceMetrics) {
        self.metrics_history.push_back(metrics);
        if self.metrics_history.len() > METRICS_HISTORY_CAP {
            self.metrics_history.pop_front();
        }
    }

    /// Computes current performance over the analysis window, falling back
    /// to the full trade history if nothing falls inside the window. `None`
    /// if there isn't yet enough history to analyze.
    pub fn calculate_metrics(&self, now: DateTime<Utc>) -> Option<PerformanceMetrics> {
        if self.trade_results.len() < self.config.min_trades_for_analysis as usize {
            return None;
        }

        let cutoff = now - chrono::Duration::hours(self.config.analysis_window_hours);
        let mut recent: Vec<&TradeResult> =
            self.trade_results.iter().filter(|t| t.timestamp >= cutoff).collect();
        if recent.is_empty() {
            recent = self.trade_results.iter().collect();
        }

        let total = recent.len() as u64;
        let winners: Vec<&&TradeResult> = recent.iter().filter(|t| t.pnl > Decimal::ZERO).collect();
        let losers: Vec<&&TradeResult> = recent.iter().filter(|t| t.pnl < Decimal::ZERO).collect();

        let total_pnl: Decimal = recent.iter().map(|t| t.pnl).sum();
        let total_wins: Decimal = winners.iter().map(|t| t.pnl).sum();
        let total_losses: Decimal = losers.iter().map(|t| t.pnl).sum::<Decimal>().abs();

        let win_rate = if total > 0 {
            Decimal::from(winners.len() as u64) / Decimal::from(total)
        } else {
            Decimal::ZERO
        };
        let avg_win = if !winners.is_empty() { total_wins / Decimal::from(winners.len() as u64) } else { Decimal::ZERO };
        let avg_loss = if !losers.is_empty() { total_losses / Decimal::from(losers.len() as u64) } else { Decimal::ZERO };
        let profit_factor =
            if total_losses > Decimal::ZERO { (total_wins / total_losses).to_f64() } else { None };

        let mut peak = Decimal::ZERO;
        let mut max_dd = Decimal::ZERO;
        let mut cumulative = Decimal::ZERO;
        for t in &recent {
            cumulative += t.pnl;
            peak = peak.max(cumulative);
            let dd = if peak > Decimal::ZERO { (peak - cumulative) / peak } else { Decimal::ZERO };
            max_dd = max_dd.max(dd);
        }

        let sharpe_ratio = self.sharpe_ratio();
        let trend = self.trend();

        Some(PerformanceMetrics {
            bot_id: self.bot_id.clone(),
            timestamp: Some(now),
            total_trades: total,
            winning_trades: winners.len() as u64,
            losing_trades: losers.len() as u64,
            total_pnl,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            max_drawdown: max_dd,
            sharpe_ratio,
            trend: Some(trend),
        })
    }

    /// Simplified annualized Sharpe ratio: `mean / stdev * sqrt(252)` over
    /// the raw per-trade P&L history. Computed in `f64`, matching
    /// `PerformanceMetrics.sharpe_ratio`'s `Option<f64>` shape.
    fn sharpe_ratio(&self) -> Option<f64> {
        if self.pnl_history.len() < 2 {
            return None;
        }
        let values: Vec<f64> = self.pnl_history.iter().filter_map(|d| d.to_f64()).collect();
        if values.len() < 2 {
            return None;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
        let stdev = variance.sqrt();
        if stdev <= 0.0 {
            return Some(0.0);
        }
        Some((mean / stdev) * 252f64.sqrt())
    }

    fn trend(&self) -> Trend {
        if self.metrics_history.len() < 3 {
            return Trend::Neutral;
        }
        let recent: Vec<Decimal> =
            self.metrics_history.iter().rev().take(3).rev().map(|m| m.total_pnl).collect();
        if recent.windows(2).all(|w| w[0] < w[1]) {
            Trend::Improving
        } else if recent.windows(2).all(|w| w[0] > w[1]) {
            Trend::Declining
        } else {
            Trend::Neutral
        }
    }

    /// Runs one evaluation cycle: daily-counter reset, daily-limit and
    /// cooldown gates, metrics calculation, analysis, and application. A
    /// no-op (not an error) whenever a gate holds or there isn't enough
    /// history yet — the caller (`AutoOptimizerManager::tick`) just tries
    /// again next interval.
    pub fn evaluate_and_adjust(&mut self, now: DateTime<Utc>) {
        if !self.config.enabled {
            return;
        }

        let today = now.date_naive();
        if self.last_reset_date != Some(today) {
            self.adjustments_today = 0;
            self.last_reset_date = Some(today);
        }

        if self.adjustments_today >= self.config.max_adjustments_per_day {
            return;
        }

        if let Some(last) = self.last_adjustment_time {
            let cooldown = chrono::Duration::minutes(self.config.cooldown_minutes as i64);
            if now - last < cooldown {
                return;
            }
        }

        let Some(metrics) = self.calculate_metrics(now) else { return };
        self.record_metrics(metrics.clone());

        let adjustments = self.analyze_performance(&metrics);
        if !adjustments.is_empty() {
            self.apply_adjustments(adjustments, &metrics, now);
        }
        self.last_evaluated = Some(now);
    }

    pub fn last_evaluated(&self) -> Option<DateTime<Utc>> {
        self.last_evaluated
    }

    /// The five-rule adjustment cascade (spec §4.9 step 4), each rule
    /// independent and additive — a bot can trip several at once (e.g. low
    /// win rate and high drawdown in the same cycle).
    fn analyze_performance(&self, metrics: &PerformanceMetrics) -> Vec<ParameterAdjustment> {
        let mut adjustments = Vec::new();
        let params = (self.get_params)();

        if metrics.win_rate < self.config.min_win_rate {
            adjustments.extend(self.suggest_entry_improvements(&params, metrics));
        }

        if metrics.max_drawdown > self.config.max_drawdown_pct {
            adjustments.extend(self.suggest_risk_reduction(&params, metrics));
        }

        if metrics.profit_factor.map(|pf| pf < self.config.min_profit_factor).unwrap_or(false) {
            adjustments.extend(self.suggest_risk_reward_improvements(&params, metrics));
        }

        if metrics.trend == Some(Trend::Declining) {
            adjustments.extend(self.suggest_trend_reversal(&params, metrics));
        }

        if metrics.trend == Some(Trend::Improving) && metrics.win_rate > self.config.target_win_rate {
            adjustments.extend(self.suggest_optimization(&params, metrics));
        }

        adjustments
    }

    fn limit(&self, name: &str) -> ParamLimits {
        self.limits.get(name).copied().unwrap_or(ParamLimits {
            min: Decimal::MIN,
            max: Decimal::MAX,
            direction: core_types::ParamDirection::Optimize,
        })
    }

    fn adjustment(
        &self,
        params: &ParamMap,
        name: &str,
        new_value: Decimal,
        kind: AdjustmentType,
        reason: String,
    ) -> Option<ParameterAdjustment> {
        let current = *params.get(name)?;
        let new_value = self.limit(name).clamp(new_value);
        if new_value == current {
            return None;
        }
        Some(ParameterAdjustment {
            parameter_name: name.to_string(),
            old_value: current,
            new_value,
            adjustment_type: kind,
            reason,
            timestamp: Utc::now(),
            performance_before: None,
            performance_after: None,
        })
    }

    /// Low win rate: tighten entry criteria. Limited to 2 suggestions per
    /// cycle, matching the Python original.
    fn suggest_entry_improvements(&self, params: &ParamMap, metrics: &PerformanceMetrics) -> Vec<ParameterAdjustment> {
        let mut suggestions = Vec::new();

        if let Some(current) = params.get("min_confidence").copied() {
            let new_val = current * (Decimal::ONE + self.config.max_adjustment_pct);
            if let Some(adj) = self.adjustment(
                params,
                "min_confidence",
                new_val,
                AdjustmentType::Increase,
                format!("low win rate ({}%): raising entry threshold", (metrics.win_rate * dec!(100)).round_dp(1)),
            ) {
                suggestions.push(adj);
            }
        }

        if params.contains_key("signal_strength_threshold") {
            let current = params["signal_strength_threshold"];
            let new_val = current * dec!(1.1);
            if let Some(adj) = self.adjustment(
                params,
                "signal_strength_threshold",
                new_val,
                AdjustmentType::Increase,
                "requiring stronger signals for entry".to_string(),
            ) {
                suggestions.push(adj);
            }
        }

        suggestions.truncate(2);
        suggestions
    }

    /// High drawdown: reduce risk. Always suggests both when present (the
    /// Python original does not gate these on whether the value actually
    /// moved after clamping).
    fn suggest_risk_reduction(&self, params: &ParamMap, metrics: &PerformanceMetrics) -> Vec<ParameterAdjustment> {
        let mut suggestions = Vec::new();

        if let Some(current) = params.get("position_size_pct").copied() {
            let new_val = current * (Decimal::ONE - self.config.max_adjustment_pct);
            suggestions.push(ParameterAdjustment {
                parameter_name: "position_size_pct".to_string(),
                old_value: current,
                new_value: self.limit("position_size_pct").clamp(new_val),
                adjustment_type: AdjustmentType::Decrease,
                reason: format!(
                    "high drawdown ({}%): reducing position size",
                    (metrics.max_drawdown * dec!(100)).round_dp(1)
                ),
                timestamp: Utc::now(),
                performance_before: None,
                performance_after: None,
            });
        }

        if let Some(current) = params.get("stop_loss_pct").copied() {
            let new_val = current * dec!(0.85);
            suggestions.push(ParameterAdjustment {
                parameter_name: "stop_loss_pct".to_string(),
                old_value: current,
                new_value: self.limit("stop_loss_pct").clamp(new_val),
                adjustment_type: AdjustmentType::Decrease,
                reason: "tightening stop loss to limit losses".to_string(),
                timestamp: Utc::now(),
                performance_before: None,
                performance_after: None,
            });
        }

        suggestions.truncate(2);
        suggestions
    }

    /// Poor profit factor: raise the profit target.
    fn suggest_risk_reward_improvements(
        &self,
        params: &ParamMap,
        metrics: &PerformanceMetrics,
    ) -> Vec<ParameterAdjustment> {
        let Some(current) = params.get("take_profit_pct").copied() else { return Vec::new() };
        let new_val = current * dec!(1.15);
        vec![ParameterAdjustment {
            parameter_name: "take_profit_pct".to_string(),
            old_value: current,
            new_value: self.limit("take_profit_pct").clamp(new_val),
            adjustment_type: AdjustmentType::Increase,
            reason: format!(
                "low profit factor ({:.2}): raising profit targets",
                metrics.profit_factor.unwrap_or(0.0)
            ),
            timestamp: Utc::now(),
            performance_before: None,
            performance_after: None,
        }]
    }

    /// Declining trend: revert toward the best-known parameter set, if one
    /// exists and current performance has slipped 10% below it.
    fn suggest_trend_reversal(&self, params: &ParamMap, metrics: &PerformanceMetrics) -> Vec<ParameterAdjustment> {
        if self.best_params.is_empty() || !self.config.revert_on_worse_performance {
            return Vec::new();
        }
        if metrics.total_pnl >= self.best_performance * dec!(0.9) {
            return Vec::new();
        }

        let mut suggestions: Vec<ParameterAdjustment> = self
            .best_params
            .iter()
            .filter(|(name, best_val)| params.get(*name).map(|v| v != *best_val).unwrap_or(false))
            .map(|(name, best_val)| ParameterAdjustment {
                parameter_name: name.clone(),
                old_value: params[name],
                new_value: *best_val,
                adjustment_type: AdjustmentType::Reset,
                reason: "reverting to best-performing configuration".to_string(),
                timestamp: Utc::now(),
                performance_before: None,
                performance_after: None,
            })
            .collect();
        suggestions.truncate(3);
        suggestions
    }

    /// Improving trend with a strong win rate: a small, conservative
    /// position-size increase.
    fn suggest_optimization(&self, params: &ParamMap, metrics: &PerformanceMetrics) -> Vec<ParameterAdjustment> {
        if metrics.win_rate <= dec!(0.60) {
            return Vec::new();
        }
        let Some(current) = params.get("position_size_pct").copied() else { return Vec::new() };
        let new_val = current * dec!(1.05);
        self.adjustment(
            params,
            "position_size_pct",
            new_val,
            AdjustmentType::Increase,
            format!(
                "strong performance ({}% win rate): slight position increase",
                (metrics.win_rate * dec!(100)).round_dp(1)
            ),
        )
        .into_iter()
        .collect()
    }

    fn apply_adjustments(
        &mut self,
        mut adjustments: Vec<ParameterAdjustment>,
        metrics: &PerformanceMetrics,
        now: DateTime<Utc>,
    ) {
        if adjustments.is_empty() {
            return;
        }

        let current_params = (self.get_params)();
        let mut new_params = current_params.clone();

        for adj in &mut adjustments {
            new_params.insert(adj.parameter_name.clone(), adj.new_value);
            adj.performance_before = Some(metrics.total_pnl);
        }
        self.adjustments.append(&mut adjustments);

        (self.set_params)(new_params);

        self.last_adjustment_time = Some(now);
        self.adjustments_today += 1;

        if metrics.total_pnl > self.best_performance {
            self.best_performance = metrics.total_pnl;
            self.best_params = current_params;
        }
    }

    pub fn get_status(&self, now: DateTime<Utc>) -> OptimizerStatus {
        OptimizerStatus {
            bot_id: self.bot_id.clone(),
            enabled: self.config.enabled,
            mode: self.config.mode,
            current_metrics: self.calculate_metrics(now),
            total_adjustments: self.adjustments.len(),
            adjustments_today: self.adjustments_today,
            last_adjustment_time: self.last_adjustment_time,
            recent_adjustments: self
                .adjustments
                .iter()
                .rev()
                .take(RECENT_ADJUSTMENTS_LIMIT)
                .rev()
                .cloned()
                .collect(),
            best_performance: self.best_performance,
        }
    }

    /// Reverts live params to the baseline captured at `enable()` and clears
    /// all adjustment bookkeeping. Trade/metrics history is left intact —
    /// only the tuning state resets.
    pub fn reset(&mut self) {
        if !self.baseline_params.is_empty() {
            (self.set_params)(self.baseline_params.clone());
        }
        self.adjustments.clear();
        self.adjustments_today = 0;
        self.last_adjustment_time = None;
        self.best_params.clear();
        self.best_performance = Decimal::ZERO;
    }

    /// Snapshots the durable bits of this optimizer's state (spec §6.4) for
    /// `database::save_optimizer_state`. Ring buffers are deliberately
    /// excluded — see `crate::state`.
    pub fn to_state(&self) -> crate::state::OptimizerState {
        crate::state::OptimizerState::V1 {
            bot_id: self.bot_id.clone(),
            enabled: self.config.enabled,
            mode: self.config.mode,
            baseline_params: self.baseline_params.clone(),
            best_params: self.best_params.clone(),
            best_performance: self.best_performance,
            adjustments: self.adjustments.clone(),
            last_adjustment_time: self.last_adjustment_time,
            adjustments_today: self.adjustments_today,
            last_reset_date: self.last_reset_date,
        }
    }

    /// Restores a previously-saved snapshot onto a freshly constructed
    /// optimizer (same `bot_id`, config and limits as at registration time).
    pub fn restore_state(&mut self, state: crate::state::OptimizerState) {
        let crate::state::OptimizerState::V1 {
            enabled,
            mode,
            baseline_params,
            best_params,
            best_performance,
            adjustments,
            last_adjustment_time,
            adjustments_today,
            last_reset_date,
            ..
        } = state;

        self.config.enabled = enabled;
        self.config.apply_mode(mode);
        self.baseline_params = baseline_params;
        self.best_params = best_params;
        self.best_performance = best_performance;
        self.adjustments = adjustments;
        self.last_adjustment_time = last_adjustment_time;
        self.adjustments_today = adjustments_today;
        self.last_reset_date = last_reset_date;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn optimizer_with_params(
        initial: ParamMap,
        config: OptimizerConfig,
    ) -> (BotAutoOptimizer, Arc<Mutex<ParamMap>>) {
        let store = Arc::new(Mutex::new(initial));
        let get_store = Arc::clone(&store);
        let set_store = Arc::clone(&store);
        let mut optimizer = BotAutoOptimizer::new(
            "bot-1".to_string(),
            move || get_store.lock().unwrap().clone(),
            move |p| *set_store.lock().unwrap() = p,
            config,
        );
        optimizer.enable();
        (optimizer, store)
    }

    fn base_config() -> OptimizerConfig {
        OptimizerConfig { min_trades_for_analysis: 3, ..OptimizerConfig::default() }
    }

    fn params() -> ParamMap {
        let mut p = HashMap::new();
        p.insert("min_confidence".to_string(), dec!(0.6));
        p.insert("signal_strength_threshold".to_string(), dec!(0.5));
        p.insert("position_size_pct".to_string(), dec!(0.05));
        p.insert("stop_loss_pct".to_string(), dec!(0.04));
        p.insert("take_profit_pct".to_string(), dec!(0.06));
        p
    }

    #[test]
    fn ring_buffers_evict_the_oldest_entry_past_capacity() {
        let (mut optimizer, _) = optimizer_with_params(params(), base_config());
        let now = Utc::now();
        for i in 0..(TRADE_HISTORY_CAP + 10) {
            optimizer.record_trade(Decimal::from(i as i64), now);
        }
        assert_eq!(optimizer.trade_results.len(), TRADE_HISTORY_CAP);
        assert_eq!(optimizer.trade_results.front().unwrap().pnl, Decimal::from(10));
    }

    #[test]
    fn not_enough_trades_yields_no_metrics() {
        let (optimizer, _) = optimizer_with_params(params(), base_config());
        assert!(optimizer.calculate_metrics(Utc::now()).is_none());
    }

    #[test]
    fn a_losing_streak_tightens_entry_criteria() {
        let (mut optimizer, store) = optimizer_with_params(params(), base_config());
        let now = Utc::now();
        for _ in 0..5 {
            optimizer.record_trade(dec!(-10), now);
        }
        optimizer.evaluate_and_adjust(now);

        let updated = store.lock().unwrap();
        assert!(updated["min_confidence"] > dec!(0.6));
    }

    #[test]
    fn every_applied_value_stays_within_its_configured_bounds() {
        let mut p = params();
        p.insert("min_confidence".to_string(), dec!(0.89));
        let (mut optimizer, store) = optimizer_with_params(p, base_config());
        let now = Utc::now();
        for _ in 0..5 {
            optimizer.record_trade(dec!(-10), now);
        }
        optimizer.evaluate_and_adjust(now);

        let updated = store.lock().unwrap();
        assert!(updated["min_confidence"] <= dec!(0.9));
    }

    #[test]
    fn cooldown_blocks_a_second_adjustment_in_the_same_window() {
        let (mut optimizer, store) = optimizer_with_params(params(), base_config());
        let now = Utc::now();
        for _ in 0..5 {
            optimizer.record_trade(dec!(-10), now);
        }
        optimizer.evaluate_and_adjust(now);
        let after_first = store.lock().unwrap()["min_confidence"];

        optimizer.record_trade(dec!(-10), now);
        optimizer.evaluate_and_adjust(now + chrono::Duration::minutes(1));
        let after_second = store.lock().unwrap()["min_confidence"];

        assert_eq!(after_first, after_second);
    }

    #[test]
    fn daily_limit_stops_further_adjustments() {
        let mut config = base_config();
        config.max_adjustments_per_day = 1;
        config.cooldown_minutes = 0;
        let (mut optimizer, _store) = optimizer_with_params(params(), config);
        let now = Utc::now();

        optimizer.record_trade(dec!(-10), now);
        optimizer.record_trade(dec!(-10), now);
        optimizer.record_trade(dec!(-10), now);
        optimizer.evaluate_and_adjust(now);
        let after_first_cycle = optimizer.adjustments.len();
        assert!(after_first_cycle > 0);

        optimizer.record_trade(dec!(-10), now + chrono::Duration::minutes(1));
        optimizer.evaluate_and_adjust(now + chrono::Duration::minutes(1));

        assert_eq!(optimizer.adjustments.len(), after_first_cycle);
    }

    #[test]
    fn reset_restores_the_params_captured_at_enable_time() {
        let (mut optimizer, store) = optimizer_with_params(params(), base_config());
        let baseline = store.lock().unwrap().clone();
        let now = Utc::now();
        for _ in 0..5 {
            optimizer.record_trade(dec!(-10), now);
        }
        optimizer.evaluate_and_adjust(now);
        assert_ne!(*store.lock().unwrap(), baseline);

        optimizer.reset();
        assert_eq!(*store.lock().unwrap(), baseline);
        assert_eq!(optimizer.adjustments_today, 0);
    }
}
