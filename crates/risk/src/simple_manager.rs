use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};

use core_types::OrderSide;

use crate::error::RiskError;

#[derive(Debug, Clone)]
pub struct RiskLimits {
    pub max_position_size: Decimal,
    pub max_portfolio_pct: Decimal,
    pub daily_loss_limit_pct: Decimal,
    pub weekly_loss_limit_pct: Decimal,
    pub max_drawdown_pct: Decimal,
    pub vix_pause_threshold: Decimal,
    pub vix_extreme_threshold: Decimal,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_size: dec!(10_000),
            max_portfolio_pct: dec!(10),
            daily_loss_limit_pct: dec!(3),
            weekly_loss_limit_pct: dec!(8),
            max_drawdown_pct: dec!(10),
            vix_pause_threshold: dec!(35),
            vix_extreme_threshold: dec!(50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskDecision {
    Approved,
    Reduced { quantity: Decimal, reason: String },
    Rejected { reason: String },
}

/// Single process-wide instance, portfolio-scoped (spec §4.5). Stateless
/// per-call aside from the mutable fields below, all written only via
/// `update_pnl`/`update_vix`/`resume_trading`/`reset_kill_switch`.
///
/// Replaces the teacher's `SimpleRiskManager`, which sized a position from a
/// stop-loss distance — a different question from this manager's job, which
/// is to *gate* an already-sized order. The `thiserror`-based error type,
/// `tracing` density, and `dec!()` literal style are kept from
/// `examples/AllanBico-zenith/crates/risk/src/simple_manager.rs`.
pub struct SimpleRiskManager {
    limits: RiskLimits,
    portfolio_value: Decimal,
    daily_pnl: Decimal,
    weekly_pnl: Decimal,
    max_drawdown: Decimal,
    vix: Decimal,
    paused: bool,
    killed: bool,
}

impl SimpleRiskManager {
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            limits,
            portfolio_value: Decimal::ZERO,
            daily_pnl: Decimal::ZERO,
            weekly_pnl: Decimal::ZERO,
            max_drawdown: Decimal::ZERO,
            vix: Decimal::ZERO,
            paused: false,
            killed: false,
        }
    }

    pub fn set_portfolio_value(&mut self, value: Decimal) {
        self.portfolio_value = value;
    }

    pub fn update_vix(&mut self, vix: Decimal) {
        self.vix = vix;
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Only a programmatic reset clears the kill switch; `resume_trading`
    /// can only clear `paused` (kill-switch stickiness, spec §4.5 / S5).
    pub fn resume_trading(&mut self) -> bool {
        if self.killed {
            warn!("resume_trading called while kill switch is active; kill switch stays set");
            return false;
        }
        self.paused = false;
        true
    }

    pub fn reset_kill_switch(&mut self) {
        info!("risk manager kill switch explicitly reset");
        self.killed = false;
    }

    pub fn check_order(
        &self,
        _symbol: &str,
        qty: Decimal,
        price: Decimal,
        _side: OrderSide,
    ) -> Result<RiskDecision, RiskError> {
        if self.killed {
            warn!("order rejected: kill switch is active");
            return Ok(RiskDecision::Rejected { reason: "kill switch".to_string() });
        }
        if self.paused {
            warn!("order rejected: trading is paused");
            return Ok(RiskDecision::Rejected { reason: "trading paused".to_string() });
        }
        if self.vix >= self.limits.vix_extreme_threshold {
            warn!(vix = %self.vix, "order rejected: VIX at extreme level");
            return Ok(RiskDecision::Rejected { reason: "VIX extreme".to_string() });
        }

        let mut quantity = qty;
        let mut reduced = false;

        if self.vix >= self.limits.vix_pause_threshold {
            quantity /= dec!(2);
            reduced = true;
            info!(vix = %self.vix, new_quantity = %quantity, "quantity halved due to elevated VIX");
        }

        let notional_cap = self
            .limits
            .max_position_size
            .min(self.limits.max_portfolio_pct / dec!(100) * self.portfolio_value);
        let notional = quantity * price;
        if notional > notional_cap && price > Decimal::ZERO {
            quantity = notional_cap / price;
            reduced = true;
            info!(cap = %notional_cap, new_quantity = %quantity, "quantity capped to notional limit");
        }

        if reduced {
            Ok(RiskDecision::Reduced { quantity, reason: "risk caps applied".to_string() })
        } else {
            Ok(RiskDecision::Approved)
        }
    }

    /// Sticky kill switch (spec §4.5 / S5 / Testable Properties "Kill-switch
    /// stickiness"): once `killed = true`, only `reset_kill_switch` clears it.
    pub fn update_pnl(&mut self, daily: Decimal, weekly: Decimal, drawdown: Decimal) {
        self.daily_pnl = daily;
        self.weekly_pnl = weekly;
        self.max_drawdown = drawdown;

        let daily_limit = self.limits.daily_loss_limit_pct / dec!(100) * self.portfolio_value;
        if daily.abs() >= daily_limit && daily_limit > Decimal::ZERO {
            warn!(daily_pnl = %daily, limit = %daily_limit, "daily loss limit breached; pausing trading");
            self.paused = true;
        }

        if self.max_drawdown >= self.limits.max_drawdown_pct {
            warn!(drawdown = %self.max_drawdown, limit = %self.limits.max_drawdown_pct, "max drawdown breached; engaging kill switch");
            self.killed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SimpleRiskManager {
        let mut mgr = SimpleRiskManager::new(RiskLimits::default());
        mgr.set_portfolio_value(dec!(100_000));
        mgr
    }

    #[test]
    fn kill_switch_is_sticky() {
        let mut mgr = manager();
        mgr.update_pnl(dec!(0), dec!(0), dec!(12));
        assert!(mgr.is_killed());
        assert!(!mgr.resume_trading());
        let decision = mgr.check_order("AAPL", dec!(10), dec!(100), OrderSide::Buy).unwrap();
        assert_eq!(decision, RiskDecision::Rejected { reason: "kill switch".to_string() });
        mgr.reset_kill_switch();
        assert!(!mgr.is_killed());
    }

    #[test]
    fn vix_extreme_rejects() {
        let mut mgr = manager();
        mgr.update_vix(dec!(55));
        let decision = mgr.check_order("AAPL", dec!(10), dec!(100), OrderSide::Buy).unwrap();
        assert_eq!(decision, RiskDecision::Rejected { reason: "VIX extreme".to_string() });
    }

    #[test]
    fn vix_pause_threshold_halves_quantity() {
        let mut mgr = manager();
        mgr.update_vix(dec!(40));
        let decision = mgr.check_order("AAPL", dec!(10), dec!(10), OrderSide::Buy).unwrap();
        assert_eq!(decision, RiskDecision::Reduced { quantity: dec!(5), reason: "risk caps applied".to_string() });
    }

    #[test]
    fn notional_cap_reduces_quantity() {
        let mut mgr = manager();
        // max_position_size=10_000, max_portfolio_pct=10% of 100_000=10_000 -> cap 10_000
        let decision = mgr.check_order("AAPL", dec!(1000), dec!(100), OrderSide::Buy).unwrap();
        assert_eq!(decision, RiskDecision::Reduced { quantity: dec!(100), reason: "risk caps applied".to_string() });
    }
}
