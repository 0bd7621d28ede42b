use std::collections::HashMap;
use std::sync::Arc;

use core_types::{Order, OrderStatus};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::error::ExecutorError;

/// Per-order-locked index of all orders known to this process (spec §5
/// "Orders index" row: per-order lock, read by status/reconciliation,
/// written by the order pipeline and by broker fill callbacks).
///
/// Enforces `OrderStatus::can_transition_to` at the single point where any
/// order's status can change: a regression (e.g. a stale `Submitted` update
/// arriving after `Filled`) is dropped and logged, never panics and never
/// clobbers a more advanced status.
#[derive(Default)]
pub struct OrderIndex {
    orders: Mutex<HashMap<Uuid, Arc<Mutex<Order>>>>,
}

impl OrderIndex {
    pub fn new() -> Self {
        Self { orders: Mutex::new(HashMap::new()) }
    }

    pub async fn insert(&self, order: Order) {
        let mut orders = self.orders.lock().await;
        orders.insert(order.order_id, Arc::new(Mutex::new(order)));
    }

    async fn handle_for(&self, order_id: Uuid) -> Option<Arc<Mutex<Order>>> {
        self.orders.lock().await.get(&order_id).cloned()
    }

    pub async fn get(&self, order_id: Uuid) -> Option<Order> {
        let handle = self.handle_for(order_id).await?;
        Some(handle.lock().await.clone())
    }

    /// Applies a status update if and only if it is a monotone advance.
    /// Returns `Ok(true)` if applied, `Ok(false)` if silently dropped as a
    /// regression, `Err` if the order is unknown.
    pub async fn apply_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
        filled_quantity: Option<Decimal>,
    ) -> Result<bool, ExecutorError> {
        let handle = self
            .handle_for(order_id)
            .await
            .ok_or(ExecutorError::OrderNotFound(order_id))?;
        let mut order = handle.lock().await;

        if !order.status.can_transition_to(new_status) {
            warn!(
                order_id = %order_id,
                from = ?order.status,
                to = ?new_status,
                "dropping non-monotone order status transition"
            );
            return Ok(false);
        }

        order.status = new_status;
        if let Some(qty) = filled_quantity {
            order.filled_quantity = qty;
        }
        order.updated_at = chrono::Utc::now();
        Ok(true)
    }

    pub async fn open_orders(&self) -> Vec<Order> {
        let orders = self.orders.lock().await;
        let mut out = Vec::new();
        for handle in orders.values() {
            let order = handle.lock().await;
            if !order.status.is_terminal() {
                out.push(order.clone());
            }
        }
        out
    }

    /// At-most-one-in-flight per symbol (spec §5): true if an open, non-terminal
    /// order already exists for `symbol`.
    pub async fn has_in_flight(&self, symbol: &str) -> bool {
        let orders = self.orders.lock().await;
        for handle in orders.values() {
            let order = handle.lock().await;
            if order.symbol == symbol && !order.status.is_terminal() {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::{OrderSide, OrderType};
    use rust_decimal_macros::dec;

    fn new_order(symbol: &str) -> Order {
        Order {
            order_id: Uuid::new_v4(),
            client_order_id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            quantity: dec!(10),
            limit_price: None,
            stop_price: None,
            status: OrderStatus::Pending,
            filled_quantity: Decimal::ZERO,
            avg_fill_price: None,
            strategy_name: "test".to_string(),
            broker_name: "paper".to_string(),
            submitted_at: None,
            updated_at: Utc::now(),
            reason: None,
        }
    }

    #[tokio::test]
    async fn monotone_transitions_are_applied() {
        let index = OrderIndex::new();
        let order = new_order("AAPL");
        let id = order.order_id;
        index.insert(order).await;

        assert!(index.apply_status(id, OrderStatus::Submitted, None).await.unwrap());
        assert!(index.apply_status(id, OrderStatus::Filled, None).await.unwrap());
    }

    #[tokio::test]
    async fn regressions_are_dropped_not_applied() {
        let index = OrderIndex::new();
        let order = new_order("AAPL");
        let id = order.order_id;
        index.insert(order).await;

        index.apply_status(id, OrderStatus::Filled, None).await.unwrap();
        let applied = index.apply_status(id, OrderStatus::Submitted, None).await.unwrap();
        assert!(!applied);
        assert_eq!(index.get(id).await.unwrap().status, OrderStatus::Filled);
    }

    #[tokio::test]
    async fn in_flight_detection_tracks_open_orders() {
        let index = OrderIndex::new();
        let order = new_order("AAPL");
        let id = order.order_id;
        index.insert(order).await;
        assert!(index.has_in_flight("AAPL").await);

        index.apply_status(id, OrderStatus::Filled, None).await.unwrap();
        assert!(!index.has_in_flight("AAPL").await);
    }
}
