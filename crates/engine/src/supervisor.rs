//! Bot Supervisor (spec §4.8). Owns the `bot_id -> BotHandle` map, enforces
//! `max_bots`, and fans out lifecycle operations across all registered bots
//! without letting one bot's failure abort the others. Generalizes the
//! teacher's `Engine { bots: HashMap<String, Bot> }`, whose single map
//! becomes `Mutex<HashMap<BotId, Arc<BotHandle>>>` behind the supervisor's
//! own mutex (spec §5 lock ordering: Supervisor before Bot).

use std::collections::HashMap;
use std::sync::Arc;

use core_types::{BotConfig, BotId};
use data_source::DataSource;
use order_pipeline::OrderPipeline;
use tokio::sync::Mutex;
use tracing::info;

use crate::bot::{BotHandle, StatusSnapshot};
use crate::error::EngineError;

const DEFAULT_MAX_BOTS: usize = 25;

/// Aggregated view across every registered bot (spec §4.8 `get_status`).
#[derive(Debug, Clone, Default)]
pub struct SupervisorStatus {
    pub bot_count: usize,
    pub running_count: usize,
    pub paused_count: usize,
    pub stopped_count: usize,
    pub total_daily_pnl: rust_decimal::Decimal,
    pub total_trades_today: u64,
    pub total_errors: u64,
    pub bots: Vec<StatusSnapshot>,
}

/// Lightweight per-bot listing entry (spec §4.8 `get_bot_summary`).
#[derive(Debug, Clone)]
pub struct BotSummary {
    pub id: BotId,
    pub status: core_types::BotStatus,
    pub symbols: Vec<String>,
}

pub struct BotSupervisor {
    bots: Mutex<HashMap<BotId, Arc<BotHandle>>>,
    max_bots: usize,
    pipeline: Arc<OrderPipeline>,
    data_source: Arc<dyn DataSource>,
}

impl BotSupervisor {
    pub fn new(pipeline: Arc<OrderPipeline>, data_source: Arc<dyn DataSource>) -> Self {
        Self::with_capacity(pipeline, data_source, DEFAULT_MAX_BOTS)
    }

    pub fn with_capacity(pipeline: Arc<OrderPipeline>, data_source: Arc<dyn DataSource>, max_bots: usize) -> Self {
        Self { bots: Mutex::new(HashMap::new()), max_bots, pipeline, data_source }
    }

    /// Rejects when the cap is reached or `bot_id` is already present;
    /// otherwise constructs and registers a new, not-yet-started bot.
    pub async fn create_bot(&self, bot_id: BotId, config: BotConfig) -> Result<Arc<BotHandle>, EngineError> {
        let mut bots = self.bots.lock().await;
        if bots.len() >= self.max_bots {
            return Err(EngineError::CapacityReached(self.max_bots));
        }
        if bots.contains_key(&bot_id) {
            return Err(EngineError::BotAlreadyExists(bot_id));
        }

        let handle = BotHandle::new(bot_id.clone(), config, Arc::clone(&self.pipeline), Arc::clone(&self.data_source));
        bots.insert(bot_id.clone(), Arc::clone(&handle));
        info!(bot_id = %bot_id, "bot created");
        Ok(handle)
    }

    /// Stops the bot if running, then removes it from the map.
    pub async fn delete_bot(&self, bot_id: &str) -> Result<(), EngineError> {
        let handle = {
            let mut bots = self.bots.lock().await;
            bots.remove(bot_id)
        };
        match handle {
            Some(handle) => {
                handle.stop().await;
                info!(bot_id, "bot deleted");
                Ok(())
            }
            None => Err(EngineError::BotNotFound(bot_id.to_string())),
        }
    }

    async fn snapshot(&self) -> Vec<Arc<BotHandle>> {
        self.bots.lock().await.values().cloned().collect()
    }

    /// Fan-out helper shared by `start_all`/`stop_all`/`pause_all`/
    /// `resume_all`: one bot's failure never aborts the rest (spec §4.8).
    /// Each lifecycle op has a different async body, so the closure returns
    /// a boxed future rather than a plain `fn` pointer.
    async fn fan_out(
        &self,
        op: impl Fn(Arc<BotHandle>) -> std::pin::Pin<Box<dyn std::future::Future<Output = bool> + Send>>,
    ) -> HashMap<BotId, bool> {
        let bots = self.snapshot().await;
        let mut results = HashMap::new();
        for bot in bots {
            let id = bot.id().to_string();
            let ok = op(bot).await;
            results.insert(id, ok);
        }
        results
    }

    pub async fn start_all(&self) -> HashMap<BotId, bool> {
        self.fan_out(|bot| Box::pin(async move { bot.start().await })).await
    }

    pub async fn stop_all(&self) -> HashMap<BotId, bool> {
        self.fan_out(|bot| Box::pin(async move { bot.stop().await })).await
    }

    pub async fn pause_all(&self) -> HashMap<BotId, bool> {
        self.fan_out(|bot| Box::pin(async move { bot.pause() })).await
    }

    pub async fn resume_all(&self) -> HashMap<BotId, bool> {
        self.fan_out(|bot| Box::pin(async move { bot.resume() })).await
    }

    pub async fn start_bot(&self, bot_id: &str) -> Result<bool, EngineError> {
        let handle = self.get(bot_id).await?;
        Ok(handle.start().await)
    }

    pub async fn stop_bot(&self, bot_id: &str) -> Result<bool, EngineError> {
        let handle = self.get(bot_id).await?;
        Ok(handle.stop().await)
    }

    async fn get(&self, bot_id: &str) -> Result<Arc<BotHandle>, EngineError> {
        self.bots
            .lock()
            .await
            .get(bot_id)
            .cloned()
            .ok_or_else(|| EngineError::BotNotFound(bot_id.to_string()))
    }

    /// Aggregates every bot's snapshot: totals, summed stats, per-bot detail.
    /// A strict snapshot: bots are read from the map once, up front, so a
    /// concurrent `delete_bot` either excludes the bot entirely or includes
    /// its pre-deletion snapshot, never a half-torn state.
    pub async fn get_status(&self) -> SupervisorStatus {
        let bots = self.snapshot().await;
        let mut status = SupervisorStatus { bot_count: bots.len(), ..Default::default() };

        for bot in &bots {
            let snapshot = bot.get_status().await;
            match snapshot.status {
                core_types::BotStatus::Running => status.running_count += 1,
                core_types::BotStatus::Paused => status.paused_count += 1,
                core_types::BotStatus::Stopped => status.stopped_count += 1,
                _ => {}
            }
            status.total_daily_pnl += snapshot.stats.daily_pnl;
            status.total_trades_today += snapshot.stats.trades_today;
            status.total_errors += snapshot.stats.errors_count;
            status.bots.push(snapshot);
        }

        status
    }

    pub async fn get_bot_summary(&self) -> Vec<BotSummary> {
        let bots = self.snapshot().await;
        let mut summaries = Vec::with_capacity(bots.len());
        for bot in &bots {
            let snapshot = bot.get_status().await;
            let symbols = bot.symbols().await;
            summaries.push(BotSummary { id: snapshot.id, status: snapshot.status, symbols });
        }
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker::paper::PaperBroker;
    use calendar::UsEquityCalendar;
    use compliance::ComplianceManager;
    use core_types::{AccountType, ComplianceScope, InstrumentType};
    use data_source::paper::PaperDataSource;
    use events::TelemetrySink;
    use executor::{OrderIndex, Portfolio};
    use fees::FeeTracker;
    use optimizer::AutoOptimizerManager;
    use risk::{RiskLimits, SimpleRiskManager};
    use rust_decimal_macros::dec;
    use std::collections::{BTreeSet, HashMap};

    fn test_supervisor(max_bots: usize) -> BotSupervisor {
        let scope = ComplianceScope {
            broker_name: "paper".to_string(),
            account_id: "paper-account".to_string(),
            account_type: AccountType::Paper,
        };
        let pipeline = Arc::new(OrderPipeline::new(
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
            20,
        ));
        let data_source: Arc<dyn DataSource> = Arc::new(PaperDataSource::new("paper"));
        BotSupervisor::with_capacity(pipeline, data_source, max_bots)
    }

    fn config() -> BotConfig {
        BotConfig {
            name: "test-bot".to_string(),
            instrument_type: InstrumentType::Stock,
            symbols: vec!["AAPL".to_string()],
            strategies: vec!["always_hold".to_string()],
            strategy_weights: HashMap::new(),
            max_position_size: dec!(1000),
            max_positions: 5,
            max_daily_loss_pct: dec!(3),
            trade_frequency_seconds: 60,
            confirm_policy: core_types::ConfirmPolicy::Reject,
            options: None,
            futures: None,
            commodity: None,
            crypto: None,
        }
    }

    #[tokio::test]
    async fn create_bot_rejects_duplicate_ids() {
        let supervisor = test_supervisor(25);
        supervisor.create_bot("bot-1".to_string(), config()).await.unwrap();
        let result = supervisor.create_bot("bot-1".to_string(), config()).await;
        assert!(matches!(result, Err(EngineError::BotAlreadyExists(_))));
    }

    #[tokio::test]
    async fn create_bot_rejects_past_capacity() {
        let supervisor = test_supervisor(1);
        supervisor.create_bot("bot-1".to_string(), config()).await.unwrap();
        let result = supervisor.create_bot("bot-2".to_string(), config()).await;
        assert!(matches!(result, Err(EngineError::CapacityReached(1))));
    }

    #[tokio::test]
    async fn start_all_reports_per_bot_success() {
        let supervisor = test_supervisor(25);
        supervisor.create_bot("bot-1".to_string(), config()).await.unwrap();
        let results = supervisor.start_all().await;
        assert_eq!(results.get("bot-1"), Some(&true));
        supervisor.stop_all().await;
    }

    #[tokio::test]
    async fn get_status_aggregates_across_bots() {
        let supervisor = test_supervisor(25);
        supervisor.create_bot("bot-1".to_string(), config()).await.unwrap();
        supervisor.create_bot("bot-2".to_string(), config()).await.unwrap();
        let status = supervisor.get_status().await;
        assert_eq!(status.bot_count, 2);
        assert_eq!(status.total_trades_today, 0);
    }

    #[tokio::test]
    async fn delete_bot_removes_it_from_status() {
        let supervisor = test_supervisor(25);
        supervisor.create_bot("bot-1".to_string(), config()).await.unwrap();
        supervisor.delete_bot("bot-1").await.unwrap();
        let status = supervisor.get_status().await;
        assert_eq!(status.bot_count, 0);
    }

    #[tokio::test]
    async fn get_bot_summary_reports_each_bots_symbols() {
        let supervisor = test_supervisor(25);
        supervisor.create_bot("bot-1".to_string(), config()).await.unwrap();
        let summaries = supervisor.get_bot_summary().await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].symbols, vec!["AAPL".to_string()]);
    }
}
