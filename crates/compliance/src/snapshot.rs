use core_types::{
    AccountType, BrokerName, ComplianceScope, ComplianceViolation, DayTrade, TradeHistoryEntry,
    UnsettledPosition,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ComplianceError;

/// Persisted compliance state (spec §6.4): tagged-union JSON with a version
/// field so readers accept older versions. `ComplianceManager` itself is not
/// `Serialize` (it owns no I/O-facing types that need it); the snapshot is
/// the serialization boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "version")]
pub enum ComplianceSnapshot {
    #[serde(rename = "1")]
    V1 {
        broker_name: BrokerName,
        account_id: String,
        account_type: AccountType,
        equity: rust_decimal::Decimal,
        buying_power: rust_decimal::Decimal,
        day_trading_buying_power: rust_decimal::Decimal,
        is_pattern_day_trader: bool,
        day_trades: Vec<DayTrade>,
        unsettled_positions: Vec<UnsettledPosition>,
        trade_history: HashMap<String, Vec<TradeHistoryEntry>>,
        violations: Vec<ComplianceViolation>,
        restricted_until: Option<chrono::NaiveDate>,
        restriction_type: Option<String>,
        trading_stopped: bool,
        stop_reason: Option<String>,
    },
}

impl ComplianceSnapshot {
    pub fn scope(&self) -> ComplianceScope {
        match self {
            ComplianceSnapshot::V1 { broker_name, account_id, account_type, .. } => ComplianceScope {
                broker_name: broker_name.clone(),
                account_id: account_id.clone(),
                account_type: *account_type,
            },
        }
    }

    pub fn to_json(&self) -> Result<String, ComplianceError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self, ComplianceError> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn arb_snapshot() -> impl Strategy<Value = ComplianceSnapshot> {
        (any::<i64>(), any::<bool>()).prop_map(|(equity_cents, is_pdt)| ComplianceSnapshot::V1 {
            broker_name: "alpaca".to_string(),
            account_id: "acct-1".to_string(),
            account_type: AccountType::Margin,
            equity: Decimal::new(equity_cents, 2),
            buying_power: Decimal::ZERO,
            day_trading_buying_power: Decimal::ZERO,
            is_pattern_day_trader: is_pdt,
            day_trades: Vec::new(),
            unsettled_positions: Vec::new(),
            trade_history: HashMap::new(),
            violations: Vec::new(),
            restricted_until: None,
            restriction_type: None,
            trading_stopped: false,
            stop_reason: None,
        })
    }

    proptest! {
        #[test]
        fn snapshot_round_trips(snapshot in arb_snapshot()) {
            let json = snapshot.to_json().unwrap();
            let decoded = ComplianceSnapshot::from_json(&json).unwrap();
            prop_assert_eq!(snapshot, decoded);
        }
    }

    #[test]
    fn scope_extraction() {
        let snapshot = ComplianceSnapshot::V1 {
            broker_name: "alpaca".into(),
            account_id: "acct-1".into(),
            account_type: AccountType::Cash,
            equity: Decimal::ZERO,
            buying_power: Decimal::ZERO,
            day_trading_buying_power: Decimal::ZERO,
            is_pattern_day_trader: false,
            day_trades: Vec::new(),
            unsettled_positions: Vec::new(),
            trade_history: HashMap::new(),
            violations: Vec::new(),
            restricted_until: None,
            restriction_type: None,
            trading_stopped: false,
            stop_reason: None,
        };
        assert_eq!(snapshot.scope().account_id, "acct-1");
    }
}
