use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeType {
    Commission,
    Spread,
    Exchange,
    Regulatory,
    Clearing,
    Data,
    Platform,
    MarginInterest,
    CryptoNetwork,
    Other,
}

/// Fee schedule for one broker (spec §4.12). Grounded on
/// `examples/original_source/src/fees/fee_tracker.py`'s `BrokerFeeStructure`
/// and its `BROKER_FEE_STRUCTURES` table, converted from `float` percentages
/// to `Decimal`.
#[derive(Debug, Clone)]
pub struct FeeStructure {
    pub broker_name: String,

    pub stock_commission_per_share: Decimal,
    pub stock_commission_min: Decimal,
    pub stock_commission_max_pct: Decimal,
    pub stock_commission_flat: Decimal,

    pub options_per_contract: Decimal,
    pub options_assignment_fee: Decimal,
    pub options_exercise_fee: Decimal,

    pub futures_per_contract: Decimal,
    pub futures_exchange_fee: Decimal,

    pub crypto_maker_pct: Decimal,
    pub crypto_taker_pct: Decimal,
    pub crypto_spread_pct: Decimal,

    pub sec_fee_per_million: Decimal,
    pub finra_taf_per_share: Decimal,
    pub finra_taf_max: Decimal,

    pub margin_interest_rate: Decimal,
}

impl Default for FeeStructure {
    fn default() -> Self {
        Self {
            broker_name: String::new(),
            stock_commission_per_share: Decimal::ZERO,
            stock_commission_min: Decimal::ZERO,
            stock_commission_max_pct: Decimal::ZERO,
            stock_commission_flat: Decimal::ZERO,
            options_per_contract: dec!(0.65),
            options_assignment_fee: Decimal::ZERO,
            options_exercise_fee: Decimal::ZERO,
            futures_per_contract: dec!(2.25),
            futures_exchange_fee: dec!(1.50),
            crypto_maker_pct: dec!(0.40),
            crypto_taker_pct: dec!(0.60),
            crypto_spread_pct: Decimal::ZERO,
            sec_fee_per_million: dec!(8.00),
            finra_taf_per_share: dec!(0.000119),
            finra_taf_max: dec!(5.95),
            margin_interest_rate: Decimal::ZERO,
        }
    }
}

/// The pre-configured broker fee schedules (spec §4.12's required table).
pub fn broker_fee_structures() -> HashMap<String, FeeStructure> {
    let mut table = HashMap::new();

    table.insert(
        "ibkr_pro".to_string(),
        FeeStructure {
            broker_name: "Interactive Brokers Pro".to_string(),
            stock_commission_per_share: dec!(0.005),
            stock_commission_min: dec!(1.00),
            stock_commission_max_pct: dec!(0.5),
            options_per_contract: dec!(0.65),
            futures_per_contract: dec!(0.85),
            futures_exchange_fee: dec!(1.50),
            crypto_maker_pct: dec!(0.18),
            crypto_taker_pct: dec!(0.18),
            margin_interest_rate: dec!(6.83),
            ..Default::default()
        },
    );
    table.insert(
        "ibkr_lite".to_string(),
        FeeStructure {
            broker_name: "Interactive Brokers Lite".to_string(),
            options_per_contract: dec!(0.65),
            futures_per_contract: dec!(0.85),
            margin_interest_rate: dec!(6.83),
            ..Default::default()
        },
    );
    table.insert(
        "alpaca".to_string(),
        FeeStructure {
            broker_name: "Alpaca".to_string(),
            crypto_maker_pct: dec!(0.15),
            crypto_taker_pct: dec!(0.25),
            ..Default::default()
        },
    );
    table.insert(
        "schwab".to_string(),
        FeeStructure {
            broker_name: "Charles Schwab".to_string(),
            options_per_contract: dec!(0.65),
            futures_per_contract: dec!(2.25),
            ..Default::default()
        },
    );
    table.insert(
        "tradier".to_string(),
        FeeStructure {
            broker_name: "Tradier".to_string(),
            options_per_contract: dec!(0.35),
            ..Default::default()
        },
    );
    table.insert(
        "robinhood".to_string(),
        FeeStructure {
            broker_name: "Robinhood".to_string(),
            options_per_contract: Decimal::ZERO,
            crypto_spread_pct: dec!(0.5),
            ..Default::default()
        },
    );
    table.insert(
        "coinbase".to_string(),
        FeeStructure {
            broker_name: "Coinbase".to_string(),
            crypto_maker_pct: dec!(0.40),
            crypto_taker_pct: dec!(0.60),
            ..Default::default()
        },
    );
    table.insert(
        "coinbase_pro".to_string(),
        FeeStructure {
            broker_name: "Coinbase Pro".to_string(),
            crypto_maker_pct: dec!(0.04),
            crypto_taker_pct: dec!(0.06),
            ..Default::default()
        },
    );

    table
}
