//! Order Pipeline (spec §4.6): the single path every order-producing
//! component — bots, manual submission, the optimizer's live trial — must
//! go through. Six steps, always in this order:
//!
//! 1. throttle (process-wide daily order counter, resets on day rollover)
//! 2. price resolution (data source; no placeholder fallback)
//! 3. compliance gate
//! 4. risk gate
//! 5. broker dispatch (bounded by a timeout)
//! 6. record (portfolio + order index), forward closed-trade PnL to the
//!    auto-optimizer, and emit telemetry
//!
//! The per-symbol in-flight check (spec §1, "at-most-one-in-flight per bot")
//! runs alongside step 1 but is a distinct constraint: the daily counter
//! bounds total order volume, the in-flight check bounds concurrency on one
//! symbol.
//!
//! Lock ordering within a call: Compliance before Risk before the order
//! index, matching the project-wide discipline (Supervisor → Bot →
//! Compliance → Risk → Order).

pub mod error;

pub use error::PipelineError;

use std::sync::Arc;
use std::time::Duration;

use broker::{Broker, OrderRequest as BrokerOrderRequest};
use calendar::Calendar;
use chrono::{NaiveDate, Utc};
use compliance::ComplianceManager;
use core_types::{ConfirmPolicy, Execution, Order, OrderSide};
use data_source::DataSource;
use events::{TelemetryEvent, TelemetrySink};
use executor::{OrderIndex, Portfolio};
use fees::FeeTracker;
use optimizer::AutoOptimizerManager;
use risk::{RiskDecision, SimpleRiskManager};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, warn};

const DEFAULT_BROKER_TIMEOUT: Duration = Duration::from_secs(30);

/// Process-wide daily order count (spec §4.6 step 1), keyed off the calendar
/// date rather than the `Calendar` trait's business-day machinery: orders
/// only ever flow on business days in practice, so a raw date comparison is
/// enough to detect rollover.
struct DailyThrottleState {
    day: NaiveDate,
    count: u32,
}

pub struct OrderPipeline {
    broker: Arc<dyn Broker>,
    data_source: Arc<dyn DataSource>,
    calendar: Arc<dyn Calendar>,
    compliance: Arc<Mutex<ComplianceManager>>,
    risk: Arc<Mutex<SimpleRiskManager>>,
    order_index: Arc<OrderIndex>,
    portfolio: Arc<Mutex<Portfolio>>,
    telemetry: TelemetrySink,
    fee_tracker: Arc<Mutex<FeeTracker>>,
    optimizer: Arc<AutoOptimizerManager>,
    max_orders_per_day: u32,
    daily_throttle: Mutex<DailyThrottleState>,
    broker_timeout: Duration,
}

impl OrderPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        broker: Arc<dyn Broker>,
        data_source: Arc<dyn DataSource>,
        calendar: Arc<dyn Calendar>,
        compliance: Arc<Mutex<ComplianceManager>>,
        risk: Arc<Mutex<SimpleRiskManager>>,
        order_index: Arc<OrderIndex>,
        portfolio: Arc<Mutex<Portfolio>>,
        telemetry: TelemetrySink,
        fee_tracker: Arc<Mutex<FeeTracker>>,
        optimizer: Arc<AutoOptimizerManager>,
        max_orders_per_day: u32,
    ) -> Self {
        Self {
            broker,
            data_source,
            calendar,
            compliance,
            risk,
            order_index,
            portfolio,
            telemetry,
            fee_tracker,
            optimizer,
            max_orders_per_day,
            daily_throttle: Mutex::new(DailyThrottleState { day: Utc::now().date_naive(), count: 0 }),
            broker_timeout: DEFAULT_BROKER_TIMEOUT,
        }
    }

    pub fn with_broker_timeout(mut self, timeout: Duration) -> Self {
        self.broker_timeout = timeout;
        self
    }

    /// Resolves a tradable price for `symbol` from the data source: a
    /// quote's midpoint if available, else the most recent bar's close.
    /// Returns `PipelineError::PriceUnavailable` rather than ever
    /// substituting a placeholder price (spec §9 Design Notes).
    async fn resolve_price(&self, symbol: &str) -> Result<Decimal, PipelineError> {
        match self.data_source.get_quote(symbol).await {
            Ok(quote) => return Ok((quote.bid + quote.ask) / Decimal::TWO),
            Err(e) => warn!(symbol, error = %e, "quote lookup failed, falling back to last bar"),
        }

        match self.data_source.get_bars(symbol, "1m", 1).await {
            Ok(bars) => bars
                .last()
                .map(|b| b.close)
                .ok_or_else(|| PipelineError::PriceUnavailable(symbol.to_string())),
            Err(e) => {
                warn!(symbol, error = %e, "bar lookup failed");
                Err(PipelineError::PriceUnavailable(symbol.to_string()))
            }
        }
    }

    /// Reads the current position for `symbol`, if any. Callers building an
    /// order (e.g. a bot deciding `is_closing`) use this instead of reaching
    /// into the portfolio directly.
    pub async fn position(&self, symbol: &str) -> Option<core_types::Position> {
        self.portfolio.lock().await.get_position(symbol).cloned()
    }

    /// Runs an order through the full pipeline and returns the broker's
    /// resulting `Order`. `is_closing` tells the compliance gate whether this
    /// order reduces an existing position (needed for PDT/good-faith checks).
    pub async fn submit_order(
        &self,
        bot_id: &str,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        strategy_name: &str,
        is_closing: bool,
        confirm_policy: ConfirmPolicy,
    ) -> Result<Order, PipelineError> {
        {
            let today = Utc::now().date_naive();
            let mut throttle = self.daily_throttle.lock().await;
            if throttle.day != today {
                throttle.day = today;
                throttle.count = 0;
            }
            throttle.count += 1;
            if throttle.count > self.max_orders_per_day {
                return Err(PipelineError::Throttled(format!(
                    "daily order limit of {} exceeded",
                    self.max_orders_per_day
                )));
            }
        }

        if self.order_index.has_in_flight(symbol).await {
            return Err(PipelineError::Throttled(format!(
                "an order for {symbol} is already in flight"
            )));
        }

        let price = self.resolve_price(symbol).await?;
        let now = Utc::now();

        let check = {
            let compliance = self.compliance.lock().await;
            compliance
                .check_order(self.calendar.as_ref(), now, symbol, side, quantity, price, is_closing)
                .map_err(|e| PipelineError::External(e.to_string()))?
        };

        if check.stop_trading || !check.allowed {
            self.emit_violations(bot_id, &check.violations);
            return Err(PipelineError::Compliance(format!(
                "{:?}: {} violation(s)",
                check.action,
                check.violations.len()
            )));
        }

        if check.requires_confirmation {
            self.emit_violations(bot_id, &check.violations);
            match confirm_policy {
                ConfirmPolicy::Reject => {
                    let mut compliance = self.compliance.lock().await;
                    if let Some(v) = check.violations.first() {
                        compliance.declined_confirmation(v.kind, now);
                    }
                    return Err(PipelineError::RequiresConfirmation(
                        "confirm policy is Reject; order declined automatically".to_string(),
                    ));
                }
                ConfirmPolicy::Surface => {
                    return Err(PipelineError::RequiresConfirmation(
                        "order requires human confirmation before resubmission".to_string(),
                    ));
                }
            }
        }

        let quantity = {
            let risk = self.risk.lock().await;
            match risk
                .check_order(symbol, quantity, price, side)
                .map_err(|e| PipelineError::Risk(e.to_string()))?
            {
                RiskDecision::Approved => quantity,
                RiskDecision::Reduced { quantity, reason } => {
                    info!(symbol, %reason, new_quantity = %quantity, "risk manager reduced order size");
                    quantity
                }
                RiskDecision::Rejected { reason } => return Err(PipelineError::Risk(reason)),
            }
        };

        let request = BrokerOrderRequest {
            client_order_id: uuid::Uuid::new_v4(),
            symbol: symbol.to_string(),
            side,
            order_type: core_types::OrderType::Market,
            quantity,
            limit_price: None,
            stop_price: None,
        };

        let order = tokio::time::timeout(self.broker_timeout, self.broker.submit_order(&request))
            .await
            .map_err(|_| PipelineError::Timeout(self.broker_timeout))?
            .map_err(|e| PipelineError::External(e.to_string()))?;

        self.order_index.insert(order.clone()).await;
        self.telemetry.publish(TelemetryEvent::OrderSubmitted {
            bot_id: bot_id.to_string(),
            order: order.clone(),
        });

        if order.status.is_terminal() && order.filled_quantity > Decimal::ZERO {
            self.record_fill(bot_id, strategy_name, &order, now).await?;
        }

        Ok(order)
    }

    async fn record_fill(
        &self,
        bot_id: &str,
        strategy_name: &str,
        order: &Order,
        now: chrono::DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        let fill_price = order.avg_fill_price.unwrap_or(order.limit_price.unwrap_or_default());

        let fee = {
            let mut fee_tracker = self.fee_tracker.lock().await;
            let computed = fee_tracker.calculate_stock_fee(
                order.filled_quantity,
                fill_price,
                None,
                order.side == OrderSide::Sell,
            );
            let total: Decimal = computed.values().copied().sum();
            fee_tracker.record_trade_fee(
                order.order_id.to_string(),
                &order.symbol,
                order.filled_quantity,
                fill_price,
                computed,
                self.broker.name().to_string(),
                Some(bot_id.to_string()),
            );
            total
        };

        let execution = Execution {
            order_id: order.order_id,
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.filled_quantity,
            price: fill_price,
            fee,
            timestamp: now,
        };

        let realized_pnl = {
            let mut portfolio = self.portfolio.lock().await;
            portfolio.update_with_execution(&execution)?
        };

        if let Some(pnl) = realized_pnl {
            self.optimizer.record_trade(bot_id, pnl, now).await;
        }

        {
            let mut compliance = self.compliance.lock().await;
            compliance.record_trade(
                self.calendar.as_ref(),
                &order.symbol,
                order.side,
                order.filled_quantity,
                fill_price,
                now,
            );
        }

        let _ = strategy_name;
        self.telemetry.publish(TelemetryEvent::OrderFilled {
            bot_id: bot_id.to_string(),
            order: order.clone(),
        });

        Ok(())
    }

    /// Cancels a tracked order. Idempotent: cancelling an already-terminal
    /// or unknown order is not an error.
    pub async fn cancel(&self, order_id: uuid::Uuid) -> Result<(), PipelineError> {
        if let Some(order) = self.order_index.get(order_id).await {
            if order.status.is_terminal() {
                return Ok(());
            }
            self.broker
                .cancel_order(&order_id.to_string())
                .await
                .map_err(|e| PipelineError::External(e.to_string()))?;
            self.order_index
                .apply_status(order_id, core_types::OrderStatus::Cancelled, None)
                .await?;
        }
        Ok(())
    }

    fn emit_violations(&self, bot_id: &str, violations: &[core_types::ComplianceViolation]) {
        for v in violations {
            self.telemetry.publish(TelemetryEvent::ComplianceViolation {
                bot_id: Some(bot_id.to_string()),
                broker: self.broker.name().to_string(),
                action: v.action,
                severity: v.severity,
                message: v.description.clone(),
                timestamp: v.timestamp,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker::paper::PaperBroker;
    use calendar::UsEquityCalendar;
    use compliance::ComplianceManager;
    use core_types::{AccountType, ComplianceScope};
    use data_source::paper::PaperDataSource;
    use fees::FeeTracker;
    use optimizer::AutoOptimizerManager;
    use risk::{RiskLimits, SimpleRiskManager};
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;

    fn pipeline() -> OrderPipeline {
        pipeline_with_daily_limit(20)
    }

    fn pipeline_with_daily_limit(max_orders_per_day: u32) -> OrderPipeline {
        let scope = ComplianceScope {
            broker_name: "paper".to_string(),
            account_id: "paper-account".to_string(),
            account_type: AccountType::Paper,
        };
        OrderPipeline::new(
            Arc::new(PaperBroker::new("paper")),
            Arc::new(PaperDataSource::new("paper")),
            Arc::new(UsEquityCalendar::new(BTreeSet::new())),
            Arc::new(Mutex::new(ComplianceManager::new(scope))),
            Arc::new(Mutex::new(SimpleRiskManager::new(RiskLimits::default()))),
            Arc::new(OrderIndex::new()),
            Arc::new(Mutex::new(Portfolio::new("paper-account".to_string(), dec!(100_000)))),
            TelemetrySink::new(64),
            Arc::new(Mutex::new(FeeTracker::new("paper"))),
            Arc::new(AutoOptimizerManager::new(TelemetrySink::new(64))),
            max_orders_per_day,
        )
    }

    #[tokio::test]
    async fn a_paper_account_order_fills_and_is_recorded() {
        let pipeline = pipeline();
        let order = pipeline
            .submit_order("bot-1", "AAPL", OrderSide::Buy, dec!(10), "test", false, ConfirmPolicy::Reject)
            .await
            .unwrap();
        assert_eq!(order.status, core_types::OrderStatus::Filled);

        let portfolio = pipeline.portfolio.lock().await;
        assert!(portfolio.get_position("AAPL").is_some());
    }

    #[tokio::test]
    async fn a_second_order_for_the_same_symbol_is_throttled_while_the_first_is_open() {
        let pipeline = pipeline();
        // Pre-populate the order index with a synthetic open order.
        let mut open = Order {
            order_id: uuid::Uuid::new_v4(),
            client_order_id: uuid::Uuid::new_v4(),
            symbol: "AAPL".to_string(),
            side: OrderSide::Buy,
            order_type: core_types::OrderType::Market,
            quantity: dec!(10),
            limit_price: None,
            stop_price: None,
            status: core_types::OrderStatus::Submitted,
            filled_quantity: Decimal::ZERO,
            avg_fill_price: None,
            strategy_name: "test".to_string(),
            broker_name: "paper".to_string(),
            submitted_at: None,
            updated_at: Utc::now(),
            reason: None,
        };
        open.status = core_types::OrderStatus::Submitted;
        pipeline.order_index.insert(open).await;

        let result = pipeline
            .submit_order("bot-1", "AAPL", OrderSide::Buy, dec!(5), "test", false, ConfirmPolicy::Reject)
            .await;
        assert!(matches!(result, Err(PipelineError::Throttled(_))));
    }

    #[tokio::test]
    async fn an_order_past_the_daily_limit_is_throttled() {
        let pipeline = pipeline_with_daily_limit(1);
        pipeline
            .submit_order("bot-1", "AAPL", OrderSide::Buy, dec!(1), "test", false, ConfirmPolicy::Reject)
            .await
            .unwrap();

        let result = pipeline
            .submit_order("bot-1", "MSFT", OrderSide::Buy, dec!(1), "test", false, ConfirmPolicy::Reject)
            .await;
        assert!(matches!(result, Err(PipelineError::Throttled(_))));
    }

    #[tokio::test]
    async fn closing_a_position_reports_realized_pnl_to_the_optimizer() {
        use optimizer::OptimizerConfig;
        use std::collections::HashMap as StdHashMap;
        use std::sync::Mutex as StdMutex;

        let pipeline = pipeline();
        let params: Arc<StdMutex<StdHashMap<String, Decimal>>> = Arc::new(StdMutex::new(StdHashMap::new()));
        let get_params = Arc::clone(&params);
        let set_params = Arc::clone(&params);
        pipeline
            .optimizer
            .register_bot(
                "bot-1".to_string(),
                move || get_params.lock().unwrap().clone(),
                move |p| *set_params.lock().unwrap() = p,
                OptimizerConfig { min_trades_for_analysis: 1, ..OptimizerConfig::default() },
            )
            .await
            .unwrap();

        pipeline
            .submit_order("bot-1", "AAPL", OrderSide::Buy, dec!(10), "test", false, ConfirmPolicy::Reject)
            .await
            .unwrap();
        pipeline
            .submit_order("bot-1", "AAPL", OrderSide::Sell, dec!(10), "test", true, ConfirmPolicy::Reject)
            .await
            .unwrap();

        let status = pipeline.optimizer.get_status("bot-1", Utc::now()).await.unwrap();
        let metrics = status.current_metrics.expect("one closing trade should be enough to analyze");
        assert_eq!(metrics.total_trades, 1);
    }
}
