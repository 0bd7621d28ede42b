use std::collections::HashMap;

use calendar::Calendar;
use chrono::{DateTime, NaiveDate, Utc};
use core_types::{
    AccountType, ComplianceAction, ComplianceScope, ComplianceViolation, DayTrade, OrderSide,
    TradeHistoryEntry, UnsettledPosition, ViolationKind, ViolationSeverity,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::ComplianceError;

const PDT_THRESHOLD: usize = 4;
const PDT_LOOKBACK_DAYS: u32 = 5;
const PDT_EQUITY_MINIMUM: &str = "25000";
const GOOD_FAITH_RESTRICTION_DAYS: i64 = 90;
const FREERIDING_RESTRICTION_DAYS: i64 = 90;
const WASH_SALE_WINDOW_DAYS: i64 = 30;
const DAY_TRADE_RETENTION_DAYS: i64 = 7;
const TRADE_HISTORY_RETENTION_DAYS: i64 = 60;
const DECLINED_CONFIRM_RESTRICTION_WINDOW_DAYS: i64 = 365;
const DECLINED_CONFIRM_STRIKES: usize = 3;

#[derive(Debug, Clone)]
struct IntradayPosition {
    quantity: Decimal,
    avg_price: Decimal,
    open_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub allowed: bool,
    pub action: ComplianceAction,
    pub violations: Vec<ComplianceViolation>,
    pub warnings: Vec<String>,
    pub requires_confirmation: bool,
    pub stop_trading: bool,
}

impl CheckResult {
    fn allow() -> Self {
        Self {
            allowed: true,
            action: ComplianceAction::Allow,
            violations: Vec::new(),
            warnings: Vec::new(),
            requires_confirmation: false,
            stop_trading: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PdtStatus {
    pub day_trade_count: usize,
    pub remaining_before_pdt: usize,
    pub is_pattern_day_trader: bool,
}

#[derive(Debug, Clone)]
pub struct ComplianceStatus {
    pub scope: ComplianceScope,
    pub pdt: PdtStatus,
    pub trading_stopped: bool,
    pub stop_reason: Option<String>,
    pub restricted_until: Option<NaiveDate>,
    pub restriction_type: Option<String>,
    pub recent_violations: Vec<ComplianceViolation>,
}

/// One instance per `(broker, account_id, account_type)` (spec §9 Open
/// Question resolution, replacing the Python original's process-wide
/// singleton). `Paper` accounts short-circuit every check to `Allow`.
/// Grounded on `examples/original_source/src/compliance/compliance_manager.py`.
pub struct ComplianceManager {
    scope: ComplianceScope,
    equity: Decimal,
    buying_power: Decimal,
    day_trading_buying_power: Decimal,
    is_pattern_day_trader: bool,

    day_trades: Vec<DayTrade>,
    intraday_positions: HashMap<String, IntradayPosition>,
    unsettled_positions: Vec<UnsettledPosition>,
    trade_history: HashMap<String, Vec<TradeHistoryEntry>>,
    violations: Vec<ComplianceViolation>,

    restricted_until: Option<NaiveDate>,
    restriction_type: Option<String>,
    trading_stopped: bool,
    stop_reason: Option<String>,

    declined_confirmations: Vec<(ViolationKind, DateTime<Utc>)>,
}

impl ComplianceManager {
    pub fn new(scope: ComplianceScope) -> Self {
        Self {
            scope,
            equity: Decimal::ZERO,
            buying_power: Decimal::ZERO,
            day_trading_buying_power: Decimal::ZERO,
            is_pattern_day_trader: false,
            day_trades: Vec::new(),
            intraday_positions: HashMap::new(),
            unsettled_positions: Vec::new(),
            trade_history: HashMap::new(),
            violations: Vec::new(),
            restricted_until: None,
            restriction_type: None,
            trading_stopped: false,
            stop_reason: None,
            declined_confirmations: Vec::new(),
        }
    }

    pub fn update_account(
        &mut self,
        equity: Decimal,
        buying_power: Decimal,
        day_trading_buying_power: Decimal,
        is_pattern_day_trader: bool,
    ) {
        self.equity = equity;
        self.buying_power = buying_power;
        self.day_trading_buying_power = day_trading_buying_power;
        self.is_pattern_day_trader = is_pattern_day_trader;
    }

    fn equity_minimum() -> Decimal {
        PDT_EQUITY_MINIMUM.parse().expect("constant parses")
    }

    fn pdt_applies(&self) -> bool {
        self.scope.account_type == AccountType::Margin && self.equity < Self::equity_minimum()
    }

    fn count_recent_day_trades(&self, cal: &dyn Calendar, today: NaiveDate) -> usize {
        let window = cal.last_n_business_days(today, PDT_LOOKBACK_DAYS);
        let oldest = match window.first() {
            Some(d) => *d,
            None => return 0,
        };
        self.day_trades.iter().filter(|dt| dt.trade_date >= oldest).count()
    }

    fn avg_buy_price_in_window(&self, symbol: &str, now: DateTime<Utc>) -> Option<Decimal> {
        let cutoff = now - chrono::Duration::days(WASH_SALE_WINDOW_DAYS);
        let history = self.trade_history.get(symbol)?;
        let recent_buys: Vec<&TradeHistoryEntry> = history
            .iter()
            .filter(|e| matches!(e.side, OrderSide::Buy) && e.timestamp >= cutoff)
            .collect();
        if recent_buys.is_empty() {
            return None;
        }
        let total_qty: Decimal = recent_buys.iter().map(|e| e.quantity).sum();
        if total_qty.is_zero() {
            return None;
        }
        let weighted: Decimal = recent_buys.iter().map(|e| e.quantity * e.price).sum();
        Some(weighted / total_qty)
    }

    /// Pre-trade check (spec §4.4.1). Short-circuits on the first
    /// `Block`/`StopDay`; otherwise collects every applicable violation and
    /// aggregates via `StopDay > Block > Confirm > Warn > Allow`.
    pub fn check_order(
        &self,
        cal: &dyn Calendar,
        now: DateTime<Utc>,
        symbol: &str,
        side: OrderSide,
        qty: Decimal,
        est_price: Decimal,
        is_closing: bool,
    ) -> Result<CheckResult, ComplianceError> {
        if self.scope.account_type == AccountType::Paper {
            return Ok(CheckResult::allow());
        }

        if self.trading_stopped {
            return Ok(self.blocked_result(
                ViolationKind::PdtViolation,
                "Trading halted",
                self.stop_reason.clone().unwrap_or_default(),
                now,
                ComplianceAction::StopDay,
            ));
        }

        let today = now.date_naive();
        if let Some(until) = self.restricted_until {
            if today < until {
                return Ok(self.blocked_result(
                    ViolationKind::SettlementRisk,
                    "Account restricted",
                    format!(
                        "Account is restricted until {} ({})",
                        until,
                        self.restriction_type.clone().unwrap_or_default()
                    ),
                    now,
                    ComplianceAction::Block,
                ));
            }
        }

        let mut violations = Vec::new();
        let warnings: Vec<String> = Vec::new();
        let mut strongest = ComplianceAction::Allow;

        if self.pdt_applies() {
            let would_be_day_trade = match side {
                OrderSide::Sell => self
                    .intraday_positions
                    .get(symbol)
                    .is_some_and(|p| p.open_time.date_naive() == today),
                OrderSide::Buy => is_closing,
            };
            if would_be_day_trade {
                let count = self.count_recent_day_trades(cal, today);
                if count >= PDT_THRESHOLD {
                    let v = violation(
                        ViolationKind::PdtViolation,
                        ViolationSeverity::Critical,
                        ComplianceAction::Block,
                        "Pattern Day Trader limit reached",
                        format!("{count} day trades in the last {PDT_LOOKBACK_DAYS} business days; this order would violate FINRA Rule 4210 (Pattern Day Trader)"),
                        "FINRA 4210",
                        now,
                    );
                    strongest = strongest.max(v.action);
                    violations.push(v);
                } else if count == 3 {
                    let v = violation(
                        ViolationKind::PdtWarning,
                        ViolationSeverity::Warning,
                        ComplianceAction::Confirm,
                        "One more day trade triggers PDT",
                        "This would be your 4th day trade in 5 business days".to_string(),
                        "FINRA 4210",
                        now,
                    );
                    strongest = strongest.max(v.action);
                    violations.push(v);
                } else if count >= 2 {
                    let remaining = PDT_THRESHOLD - 1 - count;
                    let v = violation(
                        ViolationKind::PdtWarning,
                        ViolationSeverity::Info,
                        ComplianceAction::Warn,
                        "Approaching Pattern Day Trader limit",
                        format!("{remaining} day trade(s) remaining before PDT flag"),
                        "FINRA 4210",
                        now,
                    );
                    strongest = strongest.max(v.action);
                    violations.push(v);
                }
            }
        }

        if self.scope.account_type == AccountType::Cash && matches!(side, OrderSide::Sell) {
            let unsettled_qty: Decimal = self
                .unsettled_positions
                .iter()
                .filter(|p| p.symbol == symbol)
                .map(|p| p.quantity)
                .sum();
            if unsettled_qty >= qty && unsettled_qty > Decimal::ZERO {
                let v = violation(
                    ViolationKind::GoodFaith,
                    ViolationSeverity::Warning,
                    ComplianceAction::Confirm,
                    "Good-faith violation risk",
                    format!("Selling {qty} shares of {symbol} purchased with unsettled funds"),
                    "Regulation T",
                    now,
                );
                strongest = strongest.max(v.action);
                violations.push(v);
            }
        }

        if self.scope.account_type == AccountType::Cash && matches!(side, OrderSide::Buy) {
            let order_value = qty * est_price;
            let settled_buying_power = self.buying_power
                - self
                    .unsettled_positions
                    .iter()
                    .map(|p| p.cost_basis)
                    .sum::<Decimal>();
            if order_value > settled_buying_power && order_value <= self.buying_power {
                let v = violation(
                    ViolationKind::Freeriding,
                    ViolationSeverity::Warning,
                    ComplianceAction::Confirm,
                    "Freeriding violation risk",
                    format!("Order value {order_value} exceeds settled buying power {settled_buying_power}"),
                    "Regulation T",
                    now,
                );
                strongest = strongest.max(v.action);
                violations.push(v);
            }
        }

        if self.scope.account_type == AccountType::Margin
            && self.is_pattern_day_trader
            && matches!(side, OrderSide::Buy)
        {
            let used_dtbp: Decimal = self
                .day_trades
                .iter()
                .filter(|dt| dt.trade_date == today)
                .map(|dt| dt.buy_price * dt.quantity)
                .sum();
            let order_value = qty * est_price;
            let remaining = self.day_trading_buying_power - used_dtbp;
            if order_value > remaining {
                let v = violation(
                    ViolationKind::MarginCall,
                    ViolationSeverity::Critical,
                    ComplianceAction::Block,
                    "Day Trading Buying Power exceeded",
                    format!("Order value {order_value} exceeds remaining DTBP {remaining}"),
                    "FINRA 4210",
                    now,
                );
                strongest = strongest.max(v.action);
                violations.push(v);
            }
        }

        if matches!(side, OrderSide::Buy) {
            if let Some(history) = self.trade_history.get(symbol) {
                let cutoff = now - chrono::Duration::days(WASH_SALE_WINDOW_DAYS);
                if history.iter().any(|e| matches!(e.side, OrderSide::Sell) && e.timestamp >= cutoff) {
                    let v = violation(
                        ViolationKind::WashSale,
                        ViolationSeverity::Info,
                        ComplianceAction::Warn,
                        "Possible wash sale",
                        format!("{symbol} was sold within the last {WASH_SALE_WINDOW_DAYS} days"),
                        "IRS wash sale rule",
                        now,
                    );
                    strongest = strongest.max(v.action);
                    violations.push(v);
                }
            }
        }

        Ok(CheckResult {
            allowed: !matches!(strongest, ComplianceAction::Block | ComplianceAction::StopDay),
            action: strongest,
            requires_confirmation: matches!(strongest, ComplianceAction::Confirm),
            stop_trading: matches!(strongest, ComplianceAction::StopDay),
            warnings,
            violations,
        })
    }

    fn blocked_result(
        &self,
        kind: ViolationKind,
        title: &str,
        description: String,
        now: DateTime<Utc>,
        action: ComplianceAction,
    ) -> CheckResult {
        let v = violation(kind, ViolationSeverity::Critical, action, title, description, "internal", now);
        CheckResult {
            allowed: false,
            action,
            requires_confirmation: false,
            stop_trading: matches!(action, ComplianceAction::StopDay),
            warnings: Vec::new(),
            violations: vec![v],
        }
    }

    /// Post-trade recording (spec §4.4.2).
    pub fn record_trade(
        &mut self,
        cal: &dyn Calendar,
        symbol: &str,
        side: OrderSide,
        qty: Decimal,
        price: Decimal,
        ts: DateTime<Utc>,
    ) -> Vec<ComplianceViolation> {
        self.trade_history.entry(symbol.to_string()).or_default().push(TradeHistoryEntry {
            side,
            quantity: qty,
            price,
            timestamp: ts,
        });

        let mut new_violations = Vec::new();
        let today = ts.date_naive();

        match side {
            OrderSide::Buy => {
                let entry = self.intraday_positions.entry(symbol.to_string()).or_insert(IntradayPosition {
                    quantity: Decimal::ZERO,
                    avg_price: price,
                    open_time: ts,
                });
                let total_qty = entry.quantity + qty;
                if total_qty > Decimal::ZERO {
                    entry.avg_price = (entry.avg_price * entry.quantity + price * qty) / total_qty;
                }
                entry.quantity = total_qty;

                if self.scope.account_type == AccountType::Cash {
                    self.unsettled_positions.push(UnsettledPosition {
                        symbol: symbol.to_string(),
                        quantity: qty,
                        purchase_date: today,
                        settlement_date: cal.settlement_date(today),
                        cost_basis: qty * price,
                    });
                }
            }
            OrderSide::Sell => {
                if let Some(pos) = self.intraday_positions.get(symbol).cloned() {
                    if pos.open_time.date_naive() == today {
                        let matched_qty = qty.min(pos.quantity);
                        let day_trade = DayTrade {
                            symbol: symbol.to_string(),
                            trade_date: today,
                            buy_time: pos.open_time,
                            sell_time: ts,
                            quantity: matched_qty,
                            buy_price: pos.avg_price,
                            sell_price: price,
                        };
                        self.day_trades.push(day_trade);

                        let remaining = pos.quantity - matched_qty;
                        if remaining <= Decimal::ZERO {
                            self.intraday_positions.remove(symbol);
                        } else if let Some(p) = self.intraday_positions.get_mut(symbol) {
                            p.quantity = remaining;
                        }

                        if self.pdt_applies() {
                            let count = self.count_recent_day_trades(cal, today);
                            if count >= PDT_THRESHOLD && !self.trading_stopped {
                                self.trading_stopped = true;
                                self.stop_reason = Some(format!(
                                    "{count} day trades in {PDT_LOOKBACK_DAYS} business days triggers Pattern Day Trader status"
                                ));
                                let v = violation(
                                    ViolationKind::PdtViolation,
                                    ViolationSeverity::Critical,
                                    ComplianceAction::StopDay,
                                    "Pattern Day Trader status triggered",
                                    self.stop_reason.clone().unwrap(),
                                    "FINRA 4210",
                                    ts,
                                );
                                new_violations.push(v);
                            }
                        }
                    }
                }

                if let Some(avg_buy) = self.avg_buy_price_in_window(symbol, ts) {
                    if price < avg_buy {
                        new_violations.push(violation(
                            ViolationKind::WashSale,
                            ViolationSeverity::Info,
                            ComplianceAction::Warn,
                            "Wash sale loss",
                            format!("Sold {symbol} at {price}, below the recent average buy price {avg_buy}"),
                            "IRS wash sale rule",
                            ts,
                        ));
                    }
                }
            }
        }

        self.violations.extend(new_violations.clone());
        new_violations
    }

    /// Called after a `Confirm` outcome was declined by the caller. Three
    /// declines of the same kind within 12 months escalates to a 90-day
    /// restriction (SPEC_FULL supplement; see DESIGN.md).
    pub fn declined_confirmation(&mut self, kind: ViolationKind, now: DateTime<Utc>) {
        let cutoff = now - chrono::Duration::days(DECLINED_CONFIRM_RESTRICTION_WINDOW_DAYS);
        self.declined_confirmations.retain(|(_, ts)| *ts >= cutoff);
        self.declined_confirmations.push((kind, now));

        let strikes = self.declined_confirmations.iter().filter(|(k, _)| *k == kind).count();
        if strikes >= DECLINED_CONFIRM_STRIKES {
            let days = match kind {
                ViolationKind::GoodFaith => GOOD_FAITH_RESTRICTION_DAYS,
                ViolationKind::Freeriding => FREERIDING_RESTRICTION_DAYS,
                _ => return,
            };
            self.restrict(format!("{kind:?} repeated {strikes} times"), now.date_naive() + chrono::Duration::days(days));
        }
    }

    pub fn restrict(&mut self, reason: String, until: NaiveDate) {
        warn!(scope = ?self.scope, reason = %reason, until = %until, "account restricted");
        self.restricted_until = Some(until);
        self.restriction_type = Some(reason);
    }

    /// Daily reset (spec §4.4.3), called at market open or session rollover.
    pub fn reset_daily(&mut self, today: NaiveDate) {
        self.trading_stopped = false;
        self.stop_reason = None;
        self.intraday_positions.clear();

        self.unsettled_positions.retain(|p| p.settlement_date > today);
        self.day_trades
            .retain(|dt| (today - dt.trade_date).num_days() <= DAY_TRADE_RETENTION_DAYS);
        for history in self.trade_history.values_mut() {
            history.retain(|e| (today - e.timestamp.date_naive()).num_days() <= TRADE_HISTORY_RETENTION_DAYS);
        }
        info!(scope = ?self.scope, "daily compliance reset complete");
    }

    pub fn get_status(&self, cal: &dyn Calendar, today: NaiveDate) -> PdtStatus {
        let count = self.count_recent_day_trades(cal, today);
        PdtStatus {
            day_trade_count: count,
            remaining_before_pdt: PDT_THRESHOLD.saturating_sub(count + 1),
            is_pattern_day_trader: self.is_pattern_day_trader,
        }
    }

    pub fn full_status(&self, cal: &dyn Calendar, today: NaiveDate) -> ComplianceStatus {
        let mut recent = self.violations.clone();
        recent.sort_by_key(|v| v.timestamp);
        let recent: Vec<_> = recent.into_iter().rev().take(10).collect();
        ComplianceStatus {
            scope: self.scope.clone(),
            pdt: self.get_status(cal, today),
            trading_stopped: self.trading_stopped,
            stop_reason: self.stop_reason.clone(),
            restricted_until: self.restricted_until,
            restriction_type: self.restriction_type.clone(),
            recent_violations: recent,
        }
    }

    pub fn get_day_trades(&self) -> &[DayTrade] {
        &self.day_trades
    }

    pub fn scope(&self) -> &ComplianceScope {
        &self.scope
    }

    pub fn to_snapshot(&self) -> crate::snapshot::ComplianceSnapshot {
        crate::snapshot::ComplianceSnapshot::V1 {
            broker_name: self.scope.broker_name.clone(),
            account_id: self.scope.account_id.clone(),
            account_type: self.scope.account_type,
            equity: self.equity,
            buying_power: self.buying_power,
            day_trading_buying_power: self.day_trading_buying_power,
            is_pattern_day_trader: self.is_pattern_day_trader,
            day_trades: self.day_trades.clone(),
            unsettled_positions: self.unsettled_positions.clone(),
            trade_history: self.trade_history.clone(),
            violations: self.violations.clone(),
            restricted_until: self.restricted_until,
            restriction_type: self.restriction_type.clone(),
            trading_stopped: self.trading_stopped,
            stop_reason: self.stop_reason.clone(),
        }
    }

    pub fn from_snapshot(snapshot: crate::snapshot::ComplianceSnapshot) -> Self {
        let crate::snapshot::ComplianceSnapshot::V1 {
            broker_name,
            account_id,
            account_type,
            equity,
            buying_power,
            day_trading_buying_power,
            is_pattern_day_trader,
            day_trades,
            unsettled_positions,
            trade_history,
            violations,
            restricted_until,
            restriction_type,
            trading_stopped,
            stop_reason,
        } = snapshot;
        Self {
            scope: ComplianceScope { broker_name, account_id, account_type },
            equity,
            buying_power,
            day_trading_buying_power,
            is_pattern_day_trader,
            day_trades,
            intraday_positions: HashMap::new(),
            unsettled_positions,
            trade_history,
            violations,
            restricted_until,
            restriction_type,
            trading_stopped,
            stop_reason,
            declined_confirmations: Vec::new(),
        }
    }
}

fn violation(
    kind: ViolationKind,
    severity: ViolationSeverity,
    action: ComplianceAction,
    title: &str,
    description: String,
    regulation: &str,
    timestamp: DateTime<Utc>,
) -> ComplianceViolation {
    ComplianceViolation {
        kind,
        severity,
        action,
        title: title.to_string(),
        description,
        regulation: regulation.to_string(),
        details: HashMap::new(),
        timestamp,
    }
}
