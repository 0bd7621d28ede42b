use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use core_types::{AccountType, Order, OrderStatus, Position};
use rust_decimal_macros::dec;
use tokio::sync::Mutex;

use crate::{Broker, BrokerAccount, BrokerError, OrderRequest};

/// In-memory broker used for `trading_mode: paper` and in tests. Fills every
/// order immediately at the order's limit price (or a fixed synthetic price
/// for market orders), never rejects for external reasons.
pub struct PaperBroker {
    name: String,
    orders: Mutex<HashMap<String, Order>>,
    account_id: String,
}

impl PaperBroker {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            orders: Mutex::new(HashMap::new()),
            account_id: "paper-account".to_string(),
        }
    }
}

#[async_trait]
impl Broker for PaperBroker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<(), BrokerError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BrokerError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, BrokerError> {
        Ok(true)
    }

    async fn get_accounts(&self) -> Result<Vec<BrokerAccount>, BrokerError> {
        Ok(vec![BrokerAccount {
            account_id: self.account_id.clone(),
            account_type: AccountType::Paper,
            equity: dec!(100_000),
            buying_power: dec!(100_000),
            day_trading_buying_power: dec!(400_000),
            is_pattern_day_trader: false,
        }])
    }

    async fn get_positions(&self, _account_id: &str) -> Result<Vec<Position>, BrokerError> {
        Ok(Vec::new())
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<Order, BrokerError> {
        let fill_price = order.limit_price.unwrap_or(dec!(0));
        let now = Utc::now();
        let filled = Order {
            order_id: uuid::Uuid::new_v4(),
            client_order_id: order.client_order_id,
            symbol: order.symbol.clone(),
            side: order.side,
            order_type: order.order_type,
            quantity: order.quantity,
            limit_price: order.limit_price,
            stop_price: order.stop_price,
            status: OrderStatus::Filled,
            filled_quantity: order.quantity,
            avg_fill_price: Some(fill_price),
            strategy_name: String::new(),
            broker_name: self.name.clone(),
            submitted_at: Some(now),
            updated_at: now,
            reason: None,
        };
        self.orders
            .lock()
            .await
            .insert(filled.order_id.to_string(), filled.clone());
        Ok(filled)
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), BrokerError> {
        let mut orders = self.orders.lock().await;
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| BrokerError::OrderNotFound(order_id.to_string()))?;
        if !order.status.is_terminal() {
            order.status = OrderStatus::Cancelled;
            order.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn get_order(&self, order_id: &str) -> Result<Order, BrokerError> {
        self.orders
            .lock()
            .await
            .get(order_id)
            .cloned()
            .ok_or_else(|| BrokerError::OrderNotFound(order_id.to_string()))
    }

    async fn get_open_orders(&self) -> Result<Vec<Order>, BrokerError> {
        Ok(self
            .orders
            .lock()
            .await
            .values()
            .filter(|o| !o.status.is_terminal())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{OrderSide, OrderType};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[tokio::test]
    async fn paper_broker_fills_immediately() {
        let broker = PaperBroker::new("paper");
        let request = OrderRequest {
            client_order_id: Uuid::new_v4(),
            symbol: "AAPL".into(),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            quantity: dec!(10),
            limit_price: Some(dec!(150)),
            stop_price: None,
        };
        let order = broker.submit_order(&request).await.unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.filled_quantity, dec!(10));
    }
}
