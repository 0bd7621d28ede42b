use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{
    AccountType, AdjustmentType, ComplianceAction, InstrumentType, OrderSide, OrderStatus,
    OrderType, SignalKind, Trend, ViolationKind, ViolationSeverity,
};

pub type BotId = String;
pub type BrokerName = String;
pub type DataSourceName = String;
pub type AccountId = String;

/// Produced by a strategy. Lifetime: produced inside one bot cycle, consumed
/// immediately by the combiner, never persisted (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub kind: SignalKind,
    pub strategy_name: String,
    pub strength: Decimal,
    pub confidence: Decimal,
    pub entry_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Signal {
    /// A signal is actionable iff `kind != Hold` and `strength * confidence > 0`.
    pub fn is_actionable(&self) -> bool {
        self.kind != SignalKind::Hold && self.strength * self.confidence > Decimal::ZERO
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OptionsParams {
    pub expiration_days_min: Option<u32>,
    pub expiration_days_max: Option<u32>,
    pub delta_target: Option<Decimal>,
    pub use_spreads: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FuturesParams {
    pub contract_month: Option<String>,
    pub margin_requirement_pct: Option<Decimal>,
    pub roll_days_before_expiry: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CommodityParams {
    pub storage_cost_pct: Option<Decimal>,
    pub seasonal_weighting: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CryptoParams {
    pub trade_24_7: bool,
    pub max_leverage: Option<Decimal>,
    pub funding_rate_threshold: Option<Decimal>,
}

/// Immutable-from-the-outside view of a bot's behavior (spec §3). Every
/// mutation is whole-field replacement; never mutate a field of a live
/// `BotConfig` in place across threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub name: String,
    pub instrument_type: InstrumentType,
    pub symbols: Vec<String>,
    pub strategies: Vec<String>,
    pub strategy_weights: HashMap<String, Decimal>,
    pub max_position_size: Decimal,
    pub max_positions: u32,
    pub max_daily_loss_pct: Decimal,
    pub trade_frequency_seconds: u64,
    pub confirm_policy: crate::enums::ConfirmPolicy,
    pub options: Option<OptionsParams>,
    pub futures: Option<FuturesParams>,
    pub commodity: Option<CommodityParams>,
    pub crypto: Option<CryptoParams>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotStats {
    pub trades_today: u64,
    pub signals_generated: u64,
    pub daily_pnl: Decimal,
    pub total_pnl: Decimal,
    pub win_rate: Decimal,
    pub open_positions: u32,
    pub last_trade_time: Option<DateTime<Utc>>,
    pub errors_count: u64,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Uuid,
    pub client_order_id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub status: OrderStatus,
    pub filled_quantity: Decimal,
    pub avg_fill_price: Option<Decimal>,
    pub strategy_name: String,
    pub broker_name: BrokerName,
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub reason: Option<String>,
}

impl Order {
    pub fn is_day_trade_close(&self) -> bool {
        matches!(self.side, OrderSide::Sell)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub account_id: AccountId,
    pub symbol: String,
    pub quantity: Decimal,
    pub avg_cost: Decimal,
    pub current_price: Decimal,
}

impl Position {
    pub fn market_value(&self) -> Decimal {
        self.quantity * self.current_price
    }

    pub fn unrealized_pnl(&self) -> Decimal {
        (self.current_price - self.avg_cost) * self.quantity
    }

    pub fn unrealized_pnl_pct(&self) -> Decimal {
        if self.avg_cost.is_zero() {
            Decimal::ZERO
        } else {
            (self.current_price - self.avg_cost) / self.avg_cost * Decimal::from(100)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub order_id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub fee: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,
    pub bid_size: Decimal,
    pub ask_size: Decimal,
    pub volume: Decimal,
    pub timestamp: DateTime<Utc>,
    pub source: DataSourceName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTrade {
    pub symbol: String,
    pub trade_date: NaiveDate,
    pub buy_time: DateTime<Utc>,
    pub sell_time: DateTime<Utc>,
    pub quantity: Decimal,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
}

impl DayTrade {
    pub fn pnl(&self) -> Decimal {
        (self.sell_price - self.buy_price) * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsettledPosition {
    pub symbol: String,
    pub quantity: Decimal,
    pub purchase_date: NaiveDate,
    pub settlement_date: NaiveDate,
    pub cost_basis: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeHistoryEntry {
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceViolation {
    pub kind: ViolationKind,
    pub severity: ViolationSeverity,
    pub action: ComplianceAction,
    pub title: String,
    pub description: String,
    pub regulation: String,
    pub details: HashMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub bot_id: BotId,
    pub timestamp: Option<DateTime<Utc>>,
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub total_pnl: Decimal,
    pub win_rate: Decimal,
    pub profit_factor: Option<f64>,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub max_drawdown: Decimal,
    pub sharpe_ratio: Option<f64>,
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterAdjustment {
    pub parameter_name: String,
    pub old_value: Decimal,
    pub new_value: Decimal,
    pub adjustment_type: AdjustmentType,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub performance_before: Option<Decimal>,
    pub performance_after: Option<Decimal>,
}

/// `(broker, account_id, account_type)` triple used to key a
/// `ComplianceManager` instance (spec §9 Open Question resolution).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComplianceScope {
    pub broker_name: BrokerName,
    pub account_id: AccountId,
    pub account_type: AccountType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn signal_requires_nonzero_strength_and_confidence() {
        let mut signal = Signal {
            symbol: "AAPL".into(),
            kind: SignalKind::Buy,
            strategy_name: "test".into(),
            strength: dec!(0.8),
            confidence: dec!(0.0),
            entry_price: None,
            stop_loss: None,
            take_profit: None,
            metadata: HashMap::new(),
        };
        assert!(!signal.is_actionable());
        signal.confidence = dec!(0.5);
        assert!(signal.is_actionable());
        signal.kind = SignalKind::Hold;
        assert!(!signal.is_actionable());
    }

    #[test]
    fn position_pnl_math() {
        let position = Position {
            account_id: "acct-1".into(),
            symbol: "MSFT".into(),
            quantity: dec!(10),
            avg_cost: dec!(100),
            current_price: dec!(110),
        };
        assert_eq!(position.market_value(), dec!(1100));
        assert_eq!(position.unrealized_pnl(), dec!(100));
        assert_eq!(position.unrealized_pnl_pct(), dec!(10));
    }
}
