//! Broker Registry (spec §4.2, §6.2). Exposes the broker capability set as a
//! trait (`Broker`), a registry of named live handles, and a `PaperBroker`
//! test double — concrete vendor SDK bindings (Alpaca/IBKR/Schwab/Tradier)
//! are out of scope per spec §1.

pub mod error;
pub mod paper;
pub mod registry;

use async_trait::async_trait;
use core_types::{AccountId, AccountType, Bar, BrokerName, Order, OrderSide, OrderType, Quote};
use rust_decimal::Decimal;
use uuid::Uuid;

pub use error::BrokerError;
pub use registry::BrokerRegistry;

#[derive(Debug, Clone)]
pub struct BrokerAccount {
    pub account_id: AccountId,
    pub account_type: AccountType,
    pub equity: Decimal,
    pub buying_power: Decimal,
    pub day_trading_buying_power: Decimal,
    pub is_pattern_day_trader: bool,
}

#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub client_order_id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
}

/// The broker capability set from spec §4.2. Every method returns a typed
/// `BrokerError`; callers must not assume `get_quote`/`get_bars` are
/// supported — a broker that cannot provide them returns
/// `BrokerError::Unsupported` rather than panicking or faking data.
#[async_trait]
pub trait Broker: Send + Sync {
    fn name(&self) -> &str;

    async fn connect(&self) -> Result<(), BrokerError>;
    async fn disconnect(&self) -> Result<(), BrokerError>;
    async fn health_check(&self) -> Result<bool, BrokerError>;

    async fn get_accounts(&self) -> Result<Vec<BrokerAccount>, BrokerError>;
    async fn get_positions(&self, account_id: &str) -> Result<Vec<core_types::Position>, BrokerError>;

    async fn submit_order(&self, order: &OrderRequest) -> Result<Order, BrokerError>;
    async fn cancel_order(&self, order_id: &str) -> Result<(), BrokerError>;
    async fn get_order(&self, order_id: &str) -> Result<Order, BrokerError>;
    async fn get_open_orders(&self) -> Result<Vec<Order>, BrokerError>;

    async fn get_quote(&self, symbol: &str) -> Result<Quote, BrokerError> {
        let _ = symbol;
        Err(BrokerError::Unsupported(self.name().to_string()))
    }

    async fn get_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Bar>, BrokerError> {
        let _ = (symbol, timeframe, limit);
        Err(BrokerError::Unsupported(self.name().to_string()))
    }
}

pub type BrokerHandle = std::sync::Arc<dyn Broker>;
pub type BrokerKey = BrokerName;
