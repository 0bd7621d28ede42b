use crate::error::ExecutorError;
use core_types::{AccountId, Execution, OrderSide, Position};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Tracks cash and open positions for one account (spec §4.6 "Record" step).
///
/// Average-cost bookkeeping kept from the teacher's original portfolio ledger
/// (`update_with_execution` / `calculate_total_equity`), generalized from a
/// single-asset backtest ledger keyed by `Execution { client_order_id, .. }`
/// to the spec's `Order`/`Position` types keyed by `AccountId` + symbol.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub account_id: AccountId,
    pub cash: Decimal,
    pub positions: HashMap<String, Position>,
}

impl Portfolio {
    pub fn new(account_id: AccountId, initial_cash: Decimal) -> Self {
        Self {
            account_id,
            cash: initial_cash,
            positions: HashMap::new(),
        }
    }

    /// Applies a fill to cash and the relevant position, opening, adding to,
    /// reducing, or closing it as needed. Never lets cash go negative.
    /// Returns the realized PnL (net of fee) when the fill closes or reduces
    /// a position, `None` for an opening or adding fill — the distinction
    /// the order pipeline needs to know whether to feed this trade to the
    /// auto-optimizer (spec §4.9), which only cares about closed trades.
    pub fn update_with_execution(&mut self, execution: &Execution) -> Result<Option<Decimal>, ExecutorError> {
        let cost = execution.price * execution.quantity;
        let symbol = &execution.symbol;

        match execution.side {
            OrderSide::Buy => self.cash -= cost,
            OrderSide::Sell => self.cash += cost,
        }
        self.cash -= execution.fee;

        if self.cash.is_sign_negative() {
            return Err(ExecutorError::InsufficientCash {
                required: cost.to_string(),
                available: (self.cash + cost).to_string(),
            });
        }

        let account_id = self.account_id.clone();
        let position = self.positions.entry(symbol.clone()).or_insert_with(|| Position {
            account_id,
            symbol: symbol.clone(),
            quantity: Decimal::ZERO,
            avg_cost: Decimal::ZERO,
            current_price: execution.price,
        });

        let is_closing_trade = match execution.side {
            OrderSide::Buy => position.quantity.is_sign_negative(),
            OrderSide::Sell => position.quantity.is_sign_positive() && !position.quantity.is_zero(),
        };

        let mut realized_pnl = None;
        if is_closing_trade {
            let held = position.quantity.abs();
            if execution.quantity > held {
                return Err(ExecutorError::InvalidClosingQuantity {
                    requested: execution.quantity.to_string(),
                    available: held.to_string(),
                });
            }
            let avg_cost = position.avg_cost;
            let gross = match execution.side {
                OrderSide::Sell => (execution.price - avg_cost) * execution.quantity,
                OrderSide::Buy => (avg_cost - execution.price) * execution.quantity,
            };
            realized_pnl = Some(gross - execution.fee);

            match execution.side {
                OrderSide::Sell => position.quantity -= execution.quantity,
                OrderSide::Buy => position.quantity += execution.quantity,
            }
        } else {
            let existing_value = position.avg_cost * position.quantity.abs();
            let new_value = execution.price * execution.quantity;
            let signed_qty = match execution.side {
                OrderSide::Buy => execution.quantity,
                OrderSide::Sell => -execution.quantity,
            };
            let total_quantity = position.quantity + signed_qty;

            if !total_quantity.is_zero() {
                position.avg_cost = (existing_value + new_value) / total_quantity.abs();
            }
            position.quantity = total_quantity;
        }

        position.current_price = execution.price;

        if position.quantity.is_zero() {
            self.positions.remove(symbol);
        }

        Ok(realized_pnl)
    }

    /// Equity = cash + market value of every open position, marked at
    /// `market_prices`. Missing a price for an open position is a caller bug.
    pub fn calculate_total_equity(
        &self,
        market_prices: &HashMap<String, Decimal>,
    ) -> Result<Decimal, ExecutorError> {
        let mut positions_value = Decimal::ZERO;

        for (symbol, position) in &self.positions {
            let current_price = market_prices.get(symbol).ok_or_else(|| {
                ExecutorError::PortfolioError(format!("missing market price for symbol: {symbol}"))
            })?;
            positions_value += position.quantity * *current_price;
        }

        Ok(self.cash + positions_value)
    }

    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn buy(symbol: &str, qty: Decimal, price: Decimal) -> Execution {
        Execution {
            order_id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            side: OrderSide::Buy,
            quantity: qty,
            price,
            fee: Decimal::ZERO,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn opening_a_position_sets_avg_cost() {
        let mut p = Portfolio::new("acct-1".to_string(), dec!(10_000));
        p.update_with_execution(&buy("AAPL", dec!(10), dec!(100))).unwrap();
        let pos = p.get_position("AAPL").unwrap();
        assert_eq!(pos.quantity, dec!(10));
        assert_eq!(pos.avg_cost, dec!(100));
        assert_eq!(p.cash, dec!(9_000));
    }

    #[test]
    fn adding_to_a_position_averages_cost() {
        let mut p = Portfolio::new("acct-1".to_string(), dec!(10_000));
        p.update_with_execution(&buy("AAPL", dec!(10), dec!(100))).unwrap();
        p.update_with_execution(&buy("AAPL", dec!(10), dec!(120))).unwrap();
        let pos = p.get_position("AAPL").unwrap();
        assert_eq!(pos.quantity, dec!(20));
        assert_eq!(pos.avg_cost, dec!(110));
    }

    #[test]
    fn closing_a_position_removes_it() {
        let mut p = Portfolio::new("acct-1".to_string(), dec!(10_000));
        p.update_with_execution(&buy("AAPL", dec!(10), dec!(100))).unwrap();
        let mut sell = buy("AAPL", dec!(10), dec!(110));
        sell.side = OrderSide::Sell;
        p.update_with_execution(&sell).unwrap();
        assert!(p.get_position("AAPL").is_none());
    }

    #[test]
    fn opening_a_position_reports_no_realized_pnl() {
        let mut p = Portfolio::new("acct-1".to_string(), dec!(10_000));
        let realized = p.update_with_execution(&buy("AAPL", dec!(10), dec!(100))).unwrap();
        assert_eq!(realized, None);
    }

    #[test]
    fn closing_a_position_reports_realized_pnl_net_of_fee() {
        let mut p = Portfolio::new("acct-1".to_string(), dec!(10_000));
        p.update_with_execution(&buy("AAPL", dec!(10), dec!(100))).unwrap();
        let mut sell = buy("AAPL", dec!(10), dec!(110));
        sell.side = OrderSide::Sell;
        sell.fee = dec!(5);
        let realized = p.update_with_execution(&sell).unwrap();
        assert_eq!(realized, Some(dec!(95)));
    }

    #[test]
    fn overselling_is_rejected() {
        let mut p = Portfolio::new("acct-1".to_string(), dec!(10_000));
        p.update_with_execution(&buy("AAPL", dec!(10), dec!(100))).unwrap();
        let mut sell = buy("AAPL", dec!(20), dec!(110));
        sell.side = OrderSide::Sell;
        let err = p.update_with_execution(&sell).unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidClosingQuantity { .. }));
    }
}
