use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use core_types::BotId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::structures::{broker_fee_structures, FeeStructure, FeeType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeFee {
    pub trade_id: String,
    pub bot_id: Option<BotId>,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub fee_type: FeeType,
    pub amount: Decimal,
    pub broker: String,
    pub trade_value: Decimal,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct FeeReport {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_fees: Decimal,
    pub fee_breakdown: HashMap<FeeType, Decimal>,
    pub fees_by_broker: HashMap<String, Decimal>,
    pub fees_by_bot: HashMap<String, Decimal>,
    pub trade_count: usize,
    pub avg_fee_per_trade: Decimal,
    pub fees_as_pct_of_volume: Decimal,
    pub fees_as_pct_of_portfolio: Decimal,
    pub total_trade_volume: Decimal,
    pub portfolio_value: Decimal,
}

/// Expense analytics over every recorded trade fee (spec §4.12), grounded
/// on `examples/original_source/src/fees/fee_tracker.py`'s `FeeTracker`. No
/// process-wide singleton — the root binary's `AppContext` owns one
/// instance per run (spec §9 Design Notes).
pub struct FeeTracker {
    fees: Vec<TradeFee>,
    fee_structures: HashMap<String, FeeStructure>,
    default_broker: String,
    portfolio_value: Decimal,
}

impl FeeTracker {
    pub fn new(default_broker: impl Into<String>) -> Self {
        Self {
            fees: Vec::new(),
            fee_structures: broker_fee_structures(),
            default_broker: default_broker.into(),
            portfolio_value: Decimal::ZERO,
        }
    }

    pub fn set_portfolio_value(&mut self, value: Decimal) {
        self.portfolio_value = value;
    }

    pub fn add_broker_fee_structure(&mut self, broker_id: impl Into<String>, structure: FeeStructure) {
        self.fee_structures.insert(broker_id.into(), structure);
    }

    fn structure_for(&self, broker: Option<&str>) -> &FeeStructure {
        let key = broker.unwrap_or(&self.default_broker);
        self.fee_structures
            .get(key)
            .or_else(|| self.fee_structures.get("ibkr_pro"))
            .expect("ibkr_pro is always present in the default table")
    }

    pub fn calculate_stock_fee(
        &self,
        quantity: Decimal,
        price: Decimal,
        broker: Option<&str>,
        is_sell: bool,
    ) -> HashMap<FeeType, Decimal> {
        let structure = self.structure_for(broker);
        let mut fees = HashMap::new();
        let trade_value = (quantity * price).abs();

        if structure.stock_commission_flat > Decimal::ZERO {
            fees.insert(FeeType::Commission, structure.stock_commission_flat);
        } else if structure.stock_commission_per_share > Decimal::ZERO {
            let mut commission = quantity.abs() * structure.stock_commission_per_share;
            commission = commission.max(structure.stock_commission_min);
            if structure.stock_commission_max_pct > Decimal::ZERO {
                let max_fee = trade_value * (structure.stock_commission_max_pct / Decimal::from(100));
                commission = commission.min(max_fee);
            }
            fees.insert(FeeType::Commission, commission);
        }

        let mut regulatory = Decimal::ZERO;
        if is_sell {
            regulatory += (trade_value / Decimal::from(1_000_000)) * structure.sec_fee_per_million;
        }
        let finra_fee = (quantity.abs() * structure.finra_taf_per_share).min(structure.finra_taf_max);
        regulatory += finra_fee;
        fees.insert(FeeType::Regulatory, regulatory);

        fees
    }

    pub fn calculate_options_fee(
        &self,
        contracts: Decimal,
        price_per_contract: Decimal,
        broker: Option<&str>,
        is_assignment: bool,
        is_exercise: bool,
    ) -> HashMap<FeeType, Decimal> {
        let structure = self.structure_for(broker);
        let mut fees = HashMap::new();
        let trade_value = (contracts * price_per_contract * Decimal::from(100)).abs();

        fees.insert(FeeType::Commission, contracts.abs() * structure.options_per_contract);

        if is_assignment && structure.options_assignment_fee > Decimal::ZERO {
            fees.insert(FeeType::Clearing, structure.options_assignment_fee);
        }
        if is_exercise && structure.options_exercise_fee > Decimal::ZERO {
            fees.insert(FeeType::Clearing, structure.options_exercise_fee);
        }

        fees.insert(
            FeeType::Regulatory,
            (trade_value / Decimal::from(1_000_000)) * structure.sec_fee_per_million,
        );

        fees
    }

    pub fn calculate_futures_fee(&self, contracts: Decimal, broker: Option<&str>) -> HashMap<FeeType, Decimal> {
        let structure = self.structure_for(broker);
        let mut fees = HashMap::new();
        fees.insert(FeeType::Commission, contracts.abs() * structure.futures_per_contract);
        fees.insert(FeeType::Exchange, contracts.abs() * structure.futures_exchange_fee);
        fees
    }

    pub fn calculate_crypto_fee(
        &self,
        quantity: Decimal,
        price: Decimal,
        broker: Option<&str>,
        is_maker: bool,
    ) -> HashMap<FeeType, Decimal> {
        let structure = self.structure_for(broker.or(Some("coinbase")));
        let mut fees = HashMap::new();
        let trade_value = (quantity * price).abs();

        let fee_pct = if is_maker { structure.crypto_maker_pct } else { structure.crypto_taker_pct };
        fees.insert(FeeType::Commission, trade_value * (fee_pct / Decimal::from(100)));

        if structure.crypto_spread_pct > Decimal::ZERO {
            fees.insert(FeeType::Spread, trade_value * (structure.crypto_spread_pct / Decimal::from(100)));
        }

        fees
    }

    pub fn record_trade_fee(
        &mut self,
        trade_id: impl Into<String>,
        symbol: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
        fees: HashMap<FeeType, Decimal>,
        broker: impl Into<String>,
        bot_id: Option<BotId>,
    ) -> Vec<TradeFee> {
        let trade_id = trade_id.into();
        let symbol = symbol.into();
        let broker = broker.into();
        let trade_value = (quantity * price).abs();
        let mut recorded = Vec::new();

        for (fee_type, amount) in fees {
            if amount > Decimal::ZERO {
                let fee = TradeFee {
                    trade_id: trade_id.clone(),
                    bot_id: bot_id.clone(),
                    timestamp: Utc::now(),
                    symbol: symbol.clone(),
                    fee_type,
                    amount,
                    broker: broker.clone(),
                    trade_value,
                    quantity,
                };
                self.fees.push(fee.clone());
                recorded.push(fee);
            }
        }

        recorded
    }

    fn filter<'a>(
        &'a self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        bot_id: Option<&str>,
        broker: Option<&str>,
    ) -> Vec<&'a TradeFee> {
        self.fees
            .iter()
            .filter(|f| start.is_none_or(|s| f.timestamp.date_naive() >= s))
            .filter(|f| end.is_none_or(|e| f.timestamp.date_naive() <= e))
            .filter(|f| bot_id.is_none_or(|b| f.bot_id.as_deref() == Some(b)))
            .filter(|f| broker.is_none_or(|b| f.broker == b))
            .collect()
    }

    pub fn get_total_fees(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Decimal {
        self.filter(start, end, None, None).iter().map(|f| f.amount).sum()
    }

    pub fn get_fee_breakdown(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> HashMap<FeeType, Decimal> {
        let mut breakdown = HashMap::new();
        for fee in self.filter(start, end, None, None) {
            *breakdown.entry(fee.fee_type).or_insert(Decimal::ZERO) += fee.amount;
        }
        breakdown
    }

    pub fn get_fees_by_broker(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> HashMap<String, Decimal> {
        let mut by_broker = HashMap::new();
        for fee in self.filter(start, end, None, None) {
            *by_broker.entry(fee.broker.clone()).or_insert(Decimal::ZERO) += fee.amount;
        }
        by_broker
    }

    pub fn get_fees_by_bot(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> HashMap<String, Decimal> {
        let mut by_bot = HashMap::new();
        for fee in self.filter(start, end, None, None) {
            let bot = fee.bot_id.clone().unwrap_or_else(|| "manual".to_string());
            *by_bot.entry(bot).or_insert(Decimal::ZERO) += fee.amount;
        }
        by_bot
    }

    pub fn generate_report(&self, start: NaiveDate, end: NaiveDate) -> FeeReport {
        let fees = self.filter(Some(start), Some(end), None, None);
        let total_fees: Decimal = fees.iter().map(|f| f.amount).sum();
        let total_volume: Decimal = fees.iter().map(|f| f.trade_value).sum();
        let trade_count = fees.iter().map(|f| f.trade_id.as_str()).collect::<std::collections::HashSet<_>>().len();

        FeeReport {
            period_start: start,
            period_end: end,
            total_fees,
            fee_breakdown: self.get_fee_breakdown(Some(start), Some(end)),
            fees_by_broker: self.get_fees_by_broker(Some(start), Some(end)),
            fees_by_bot: self.get_fees_by_bot(Some(start), Some(end)),
            trade_count,
            avg_fee_per_trade: if trade_count > 0 {
                total_fees / Decimal::from(trade_count)
            } else {
                Decimal::ZERO
            },
            fees_as_pct_of_volume: if total_volume > Decimal::ZERO {
                total_fees / total_volume * Decimal::from(100)
            } else {
                Decimal::ZERO
            },
            fees_as_pct_of_portfolio: if self.portfolio_value > Decimal::ZERO {
                total_fees / self.portfolio_value * Decimal::from(100)
            } else {
                Decimal::ZERO
            },
            total_trade_volume: total_volume,
            portfolio_value: self.portfolio_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn stock_fee_applies_flat_commission_for_zero_commission_brokers() {
        let tracker = FeeTracker::new("alpaca");
        let fees = tracker.calculate_stock_fee(dec!(100), dec!(50), Some("alpaca"), false);
        assert!(!fees.contains_key(&FeeType::Commission));
        assert!(fees.contains_key(&FeeType::Regulatory));
    }

    #[test]
    fn stock_fee_respects_minimum_commission() {
        let tracker = FeeTracker::new("ibkr_pro");
        let fees = tracker.calculate_stock_fee(dec!(1), dec!(50), Some("ibkr_pro"), false);
        assert_eq!(*fees.get(&FeeType::Commission).unwrap(), dec!(1.00));
    }

    #[test]
    fn recording_zero_fees_is_skipped() {
        let mut tracker = FeeTracker::new("alpaca");
        let mut fees = HashMap::new();
        fees.insert(FeeType::Commission, Decimal::ZERO);
        let recorded = tracker.record_trade_fee("t1", "AAPL", dec!(10), dec!(100), fees, "alpaca", None);
        assert!(recorded.is_empty());
    }

    #[test]
    fn generate_report_aggregates_by_broker_and_bot() {
        let mut tracker = FeeTracker::new("ibkr_pro");
        let fees = tracker.calculate_stock_fee(dec!(100), dec!(50), Some("ibkr_pro"), true);
        tracker.record_trade_fee("t1", "AAPL", dec!(100), dec!(50), fees, "ibkr_pro", Some("bot-1".to_string()));

        let today = Utc::now().date_naive();
        let report = tracker.generate_report(today, today);
        assert_eq!(report.trade_count, 1);
        assert!(report.total_fees > Decimal::ZERO);
        assert_eq!(*report.fees_by_bot.get("bot-1").unwrap(), report.total_fees);
    }
}
