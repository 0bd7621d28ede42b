//! Bot Instance (spec §4.7). One cooperative worker per bot: a single
//! `tokio::task`, not an OS thread with its own nested event loop, per the
//! §9 "Thread-per-bot model" Design Note. Control (`start`/`stop`/`pause`/
//! `resume`/`update_config`) all go through `BotHandle`, shared with the
//! `BotSupervisor` as an `Arc`; the worker task only ever reads from it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::Utc;
use core_types::{BotConfig, BotId, BotStats, BotStatus, OrderSide, Signal, SignalKind};
use data_source::DataSource;
use optimizer::adjustable_parameters;
use order_pipeline::OrderPipeline;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::EngineError;
use crate::strategy_factory;

/// Signed margin threshold a weighted vote must clear before a symbol's
/// combined signal is considered actionable (spec §4.7 step 3c).
const VOTE_MARGIN_THRESHOLD: Decimal = dec!(0.15);
/// Cycle backoff after an uncaught worker error (spec §4.7 Failure semantics).
const ERROR_BACKOFF: Duration = Duration::from_secs(5);
/// Consecutive cycle errors before the bot's status moves to `Error`.
const MAX_CONSECUTIVE_ERRORS: u32 = 3;
/// Grace period `stop()` waits for the worker to observe cancellation.
const STOP_GRACE_PERIOD: Duration = Duration::from_secs(10);
/// Poll interval while paused, between checks of the resume flag.
const PAUSE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A lock-free-readable snapshot of one bot's state (spec §4.7 `get_status`).
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub id: BotId,
    pub status: BotStatus,
    pub paused: bool,
    pub stats: BotStats,
}

fn status_from_u8(v: u8) -> BotStatus {
    match v {
        0 => BotStatus::Created,
        1 => BotStatus::Starting,
        2 => BotStatus::Running,
        3 => BotStatus::Paused,
        4 => BotStatus::Stopping,
        5 => BotStatus::Stopped,
        _ => BotStatus::Error,
    }
}

fn status_to_u8(s: BotStatus) -> u8 {
    match s {
        BotStatus::Created => 0,
        BotStatus::Starting => 1,
        BotStatus::Running => 2,
        BotStatus::Paused => 3,
        BotStatus::Stopping => 4,
        BotStatus::Stopped => 5,
        BotStatus::Error => 6,
    }
}

/// Shared handle for one bot. Owned by the `BotSupervisor`'s map and cloned
/// (as an `Arc`) into the worker task it spawns. `status`/`paused` are
/// atomics so `get_status` never blocks on the worker's own locks — exactly
/// the "copy-on-read of atomic fields + a mutex-guarded stats snapshot" the
/// spec calls for.
pub struct BotHandle {
    id: BotId,
    config: RwLock<BotConfig>,
    status: std::sync::atomic::AtomicU8,
    paused: AtomicBool,
    consecutive_errors: AtomicU32,
    uptime_seconds: AtomicU64,
    stats: Mutex<BotStats>,
    // Replaced wholesale on every `start()`: a `CancellationToken` cannot be
    // reset once cancelled, and a bot stopped then restarted needs a fresh
    // one for its new worker generation.
    cancel: Mutex<CancellationToken>,
    worker: Mutex<Option<tokio::task::JoinHandle<()>>>,
    pipeline: Arc<OrderPipeline>,
    data_source: Arc<dyn DataSource>,
    // Tunable strategy parameters the auto-optimizer reads and writes back
    // (spec §4.9). A plain `std::sync::Mutex`, not the async `config` lock:
    // `AutoOptimizerManager::register_bot` takes synchronous `Fn` closures.
    params: StdMutex<HashMap<String, Decimal>>,
}

impl BotHandle {
    pub fn new(
        id: BotId,
        config: BotConfig,
        pipeline: Arc<OrderPipeline>,
        data_source: Arc<dyn DataSource>,
    ) -> Arc<Self> {
        let params = adjustable_parameters()
            .into_iter()
            .map(|(name, limits)| (name, (limits.min + limits.max) / Decimal::TWO))
            .collect();

        Arc::new(Self {
            id,
            config: RwLock::new(config),
            status: std::sync::atomic::AtomicU8::new(status_to_u8(BotStatus::Created)),
            paused: AtomicBool::new(false),
            consecutive_errors: AtomicU32::new(0),
            uptime_seconds: AtomicU64::new(0),
            stats: Mutex::new(BotStats::default()),
            cancel: Mutex::new(CancellationToken::new()),
            worker: Mutex::new(None),
            pipeline,
            data_source,
            params: StdMutex::new(params),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current tunable strategy parameters, seeded at creation from
    /// `optimizer::adjustable_parameters()`'s midpoint. Called synchronously
    /// from the `get_params` closure passed to `AutoOptimizerManager::register_bot`.
    pub fn get_params(&self) -> HashMap<String, Decimal> {
        self.params.lock().unwrap().clone()
    }

    /// Overwrites the parameter map wholesale. Called from the
    /// `set_params` closure passed to `AutoOptimizerManager::register_bot`.
    pub fn set_params(&self, params: HashMap<String, Decimal>) {
        *self.params.lock().unwrap() = params;
    }

    pub async fn symbols(&self) -> Vec<String> {
        self.config.read().await.symbols.clone()
    }

    fn status(&self) -> BotStatus {
        status_from_u8(self.status.load(Ordering::SeqCst))
    }

    fn set_status(&self, s: BotStatus) {
        self.status.store(status_to_u8(s), Ordering::SeqCst);
    }

    /// Transitions `Created|Stopped -> Starting -> Running` and spawns the
    /// worker. Idempotent when already running.
    pub async fn start(self: &Arc<Self>) -> bool {
        if self.status() == BotStatus::Running {
            return true;
        }
        if !self.status().can_start() {
            warn!(bot_id = %self.id, status = ?self.status(), "start() called from a non-startable state");
            return false;
        }

        self.set_status(BotStatus::Starting);
        self.paused.store(false, Ordering::SeqCst);
        self.consecutive_errors.store(0, Ordering::SeqCst);

        let cancel = {
            let mut guard = self.cancel.lock().await;
            *guard = CancellationToken::new();
            guard.clone()
        };
        let handle = Arc::clone(self);
        let join = tokio::spawn(async move { handle.run(cancel).await });
        *self.worker.lock().await = Some(join);
        self.set_status(BotStatus::Running);
        true
    }

    /// Signals cancellation and waits up to `STOP_GRACE_PERIOD` for the
    /// worker to exit.
    pub async fn stop(&self) -> bool {
        if !self.status().can_stop() {
            return self.status() == BotStatus::Stopped;
        }
        self.set_status(BotStatus::Stopping);
        self.cancel.lock().await.cancel();

        let join = self.worker.lock().await.take();
        if let Some(join) = join {
            match tokio::time::timeout(STOP_GRACE_PERIOD, join).await {
                Ok(_) => {}
                Err(_) => {
                    error!(bot_id = %self.id, "worker did not observe cancellation within the grace period");
                    self.set_status(BotStatus::Error);
                    return false;
                }
            }
        }
        self.set_status(BotStatus::Stopped);
        true
    }

    pub fn pause(&self) -> bool {
        if !self.status().can_pause() {
            return false;
        }
        self.paused.store(true, Ordering::SeqCst);
        self.set_status(BotStatus::Paused);
        true
    }

    pub fn resume(&self) -> bool {
        if !self.status().can_resume() {
            return false;
        }
        self.paused.store(false, Ordering::SeqCst);
        self.set_status(BotStatus::Running);
        true
    }

    /// Thread-safe field-wise update; applied atomically and takes effect
    /// next cycle since the worker re-reads `config` at the top of each one.
    pub async fn update_config(&self, patch: impl FnOnce(&mut BotConfig)) {
        let mut config = self.config.write().await;
        patch(&mut config);
    }

    pub async fn get_status(&self) -> StatusSnapshot {
        let mut stats = self.stats.lock().await.clone();
        stats.uptime_seconds = self.uptime_seconds.load(Ordering::SeqCst);
        StatusSnapshot {
            id: self.id.clone(),
            status: self.status(),
            paused: self.paused.load(Ordering::SeqCst),
            stats,
        }
    }

    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(bot_id = %self.id, "bot worker starting");
        let start = std::time::Instant::now();

        loop {
            if cancel.is_cancelled() {
                break;
            }
            if self.paused.load(Ordering::SeqCst) {
                tokio::time::sleep(PAUSE_POLL_INTERVAL).await;
                continue;
            }

            let interval = {
                let config = self.config.read().await;
                Duration::from_secs(config.trade_frequency_seconds.max(1))
            };

            match self.run_cycle().await {
                Ok(()) => {
                    self.consecutive_errors.store(0, Ordering::SeqCst);
                    if self.status() == BotStatus::Error {
                        info!(bot_id = %self.id, "bot recovered after a clean cycle, resuming");
                        self.set_status(BotStatus::Running);
                    }
                }
                Err(e) => {
                    warn!(bot_id = %self.id, error = %e, "bot cycle failed");
                    let mut stats = self.stats.lock().await;
                    stats.errors_count += 1;
                    drop(stats);

                    let errors = self.consecutive_errors.fetch_add(1, Ordering::SeqCst) + 1;
                    if errors >= MAX_CONSECUTIVE_ERRORS {
                        error!(bot_id = %self.id, errors, "bot hit the consecutive-error limit, marking Error");
                        self.set_status(BotStatus::Error);
                    }
                    self.uptime_seconds.store(start.elapsed().as_secs(), Ordering::SeqCst);
                    tokio::time::sleep(ERROR_BACKOFF).await;
                    continue;
                }
            }

            self.uptime_seconds.store(start.elapsed().as_secs(), Ordering::SeqCst);
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => break,
            }
        }

        info!(bot_id = %self.id, "bot worker exiting");
    }

    /// One evaluation cycle: fetch bars, fan out to strategies, combine
    /// signals via weighted vote, size, submit (spec §4.7 worker loop steps
    /// 3a-3d).
    async fn run_cycle(&self) -> Result<(), EngineError> {
        let (symbols, strategy_names, strategy_weights, instrument) = {
            let config = self.config.read().await;
            (
                config.symbols.clone(),
                config.strategies.clone(),
                config.strategy_weights.clone(),
                config.instrument_type,
            )
        };
        let _ = instrument;

        let mut strategies = strategy_names
            .iter()
            .map(|name| strategy_factory::build(name))
            .collect::<Result<Vec<_>, _>>()?;

        for symbol in &symbols {
            let bars = self.data_source.get_bars(symbol, "1d", 200).await?;
            let seasonal_ctx = seasonal::context(Utc::now().date_naive(), symbol, 7);

            let mut signals = Vec::new();
            for strategy in strategies.iter_mut() {
                if let Some(signal) = strategy.analyze(symbol, &bars, &seasonal_ctx)? {
                    let mut stats = self.stats.lock().await;
                    stats.signals_generated += 1;
                    drop(stats);
                    signals.push(signal);
                }
            }

            if let Some(combined) = combine_votes(&signals, &strategy_weights) {
                self.act_on_signal(symbol, &combined, &bars).await?;
            }
        }

        Ok(())
    }

    async fn act_on_signal(
        &self,
        symbol: &str,
        signal: &Signal,
        bars: &[core_types::Bar],
    ) -> Result<(), EngineError> {
        let price = bars.last().map(|b| b.close).unwrap_or(Decimal::ZERO);
        if price <= Decimal::ZERO {
            return Ok(());
        }

        let (max_position_size, confirm_policy) = {
            let config = self.config.read().await;
            (config.max_position_size, config.confirm_policy)
        };

        let side = if signal.kind.is_bullish() { OrderSide::Buy } else { OrderSide::Sell };
        let quantity = (max_position_size * signal.strength.min(Decimal::ONE)) / price;
        if quantity <= Decimal::ZERO {
            return Ok(());
        }

        let is_closing = match self.pipeline.position(symbol).await {
            Some(position) => {
                (position.quantity.is_sign_positive() && side == OrderSide::Sell)
                    || (position.quantity.is_sign_negative() && side == OrderSide::Buy)
            }
            None => false,
        };

        match self
            .pipeline
            .submit_order(&self.id, symbol, side, quantity, &signal.strategy_name, is_closing, confirm_policy)
            .await
        {
            Ok(order) => {
                let mut stats = self.stats.lock().await;
                stats.trades_today += 1;
                stats.last_trade_time = Some(Utc::now());
                drop(stats);
                info!(bot_id = %self.id, symbol, order_id = %order.order_id, "order submitted from combined signal");
            }
            Err(order_pipeline::PipelineError::Throttled(_)) => {
                // Another order for this symbol is already in flight; not a
                // bot-level failure, just skip this cycle's signal.
            }
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }
}

/// Weighted vote combiner (spec §4.7 step 3c): sums `strength * confidence *
/// weight` separately for bullish and bearish signals, then requires the
/// margin between the two sides to clear `VOTE_MARGIN_THRESHOLD` before
/// calling a direction. Unweighted strategies (absent from `weights`) vote
/// with weight 1.
fn combine_votes(signals: &[Signal], weights: &std::collections::HashMap<String, Decimal>) -> Option<Signal> {
    if signals.is_empty() {
        return None;
    }

    let weight_of = |name: &str| weights.get(name).copied().unwrap_or(Decimal::ONE);

    let mut bullish = Decimal::ZERO;
    let mut bearish = Decimal::ZERO;
    for signal in signals {
        let vote = signal.strength * signal.confidence * weight_of(&signal.strategy_name);
        if signal.kind.is_bullish() {
            bullish += vote;
        } else if signal.kind.is_bearish() {
            bearish += vote;
        }
    }

    let margin = bullish - bearish;
    if margin.abs() < VOTE_MARGIN_THRESHOLD {
        return None;
    }

    let (kind, strength) = if margin.is_sign_positive() {
        (SignalKind::Buy, bullish)
    } else {
        (SignalKind::Sell, bearish)
    };

    Some(Signal {
        symbol: signals[0].symbol.clone(),
        kind,
        strategy_name: "combined".to_string(),
        strength: strength.min(Decimal::ONE),
        confidence: Decimal::ONE,
        entry_price: signals[0].entry_price,
        stop_loss: None,
        take_profit: None,
        metadata: std::collections::HashMap::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::SignalKind;
    use std::collections::HashMap;

    fn signal(kind: SignalKind, strength: Decimal, confidence: Decimal, name: &str) -> Signal {
        Signal {
            symbol: "AAPL".to_string(),
            kind,
            strategy_name: name.to_string(),
            strength,
            confidence,
            entry_price: None,
            stop_loss: None,
            take_profit: None,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn agreeing_signals_combine_bullish() {
        let signals = vec![
            signal(SignalKind::Buy, dec!(0.8), dec!(0.9), "a"),
            signal(SignalKind::StrongBuy, dec!(0.9), dec!(0.8), "b"),
        ];
        let combined = combine_votes(&signals, &HashMap::new()).unwrap();
        assert_eq!(combined.kind, SignalKind::Buy);
    }

    #[test]
    fn conflicting_signals_below_margin_produce_no_vote() {
        let signals = vec![
            signal(SignalKind::Buy, dec!(0.5), dec!(0.5), "a"),
            signal(SignalKind::Sell, dec!(0.5), dec!(0.5), "b"),
        ];
        assert!(combine_votes(&signals, &HashMap::new()).is_none());
    }

    #[test]
    fn weights_tip_a_close_vote() {
        let signals = vec![
            signal(SignalKind::Buy, dec!(0.5), dec!(0.5), "a"),
            signal(SignalKind::Sell, dec!(0.5), dec!(0.5), "b"),
        ];
        let mut weights = HashMap::new();
        weights.insert("a".to_string(), dec!(3));
        let combined = combine_votes(&signals, &weights).unwrap();
        assert_eq!(combined.kind, SignalKind::Buy);
    }

    #[test]
    fn empty_signals_produce_no_vote() {
        assert!(combine_votes(&[], &HashMap::new()).is_none());
    }
}
