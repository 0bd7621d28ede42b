use std::collections::BTreeSet;
use std::sync::Arc;

use alerter::{run_alerter_service, TelegramAlerter};
use anyhow::{Context, Result};
use broker::paper::PaperBroker;
use broker::{Broker, BrokerRegistry};
use calendar::UsEquityCalendar;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use compliance::ComplianceManager;
use core_types::{AccountType, BotStatus, ComplianceScope};
use data_source::paper::PaperDataSource;
use data_source::{DataSource, DataSourceRegistry};
use database::{connect, run_migrations, DbRepository};
use engine::{BotHandle, BotSupervisor};
use events::TelemetrySink;
use executor::{OrderIndex, Portfolio};
use fees::FeeTracker;
use optimizer::{AutoOptimizerManager, OptimizerConfig};
use order_pipeline::OrderPipeline;
use risk::{RiskLimits, SimpleRiskManager};
use tokio::sync::Mutex;

/// Everything the binary would otherwise reach for as global state (spec §9
/// "Singletons / global mutable state" Design Note). Built once in `run`,
/// passed explicitly into every task that needs it.
struct AppContext {
    brokers: Arc<BrokerRegistry>,
    data_sources: Arc<DataSourceRegistry>,
    supervisor: Arc<BotSupervisor>,
    optimizer: Arc<AutoOptimizerManager>,
    telemetry: TelemetrySink,
    compliance: Arc<Mutex<ComplianceManager>>,
    db: DbRepository,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = configuration::load_config(None).context("loading config.toml")?;
    let _log_guard = configuration::init_tracing(&config.logging)?;

    tracing::info!("trading engine starting");

    let cli = Cli::parse();
    match cli.command {
        Commands::Run => run(config).await?,
        Commands::Status => status(config).await?,
        Commands::ResetCompliance { account_id } => reset_compliance(config, account_id).await?,
    }

    tracing::info!("trading engine exiting");
    Ok(())
}

#[derive(Parser)]
#[command(author, version, about = "Multi-bot equities trading engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect configured brokers/data sources and run every persisted bot
    /// until a shutdown signal is received.
    Run,
    /// Print an aggregated snapshot of the persisted bot map.
    Status,
    /// Wipe an account's compliance state (day trades, restrictions, the
    /// trading-halted flag) back to a clean slate.
    ResetCompliance {
        account_id: String,
    },
}

fn compliance_scope(config: &configuration::Config, account_id: String) -> ComplianceScope {
    let account_type = match config.trading_mode {
        configuration::TradingMode::Paper => AccountType::Paper,
        configuration::TradingMode::Live => AccountType::Margin,
    };
    ComplianceScope { broker_name: config.default_broker.clone(), account_id, account_type }
}

async fn build_context(config: &configuration::Config) -> Result<(AppContext, Arc<Mutex<SimpleRiskManager>>)> {
    let db_pool = connect().await.context("connecting to the database")?;
    run_migrations(&db_pool).await.context("running database migrations")?;
    let db = DbRepository::new(db_pool);

    let telemetry = TelemetrySink::new(events::DEFAULT_CAPACITY);

    if let Some(alerter) = TelegramAlerter::new(&config.alerter) {
        let alerter_telemetry = telemetry.clone();
        tokio::spawn(async move { run_alerter_service(alerter, &alerter_telemetry).await });
        tracing::info!("telegram alerter service started");
    } else {
        tracing::info!("telegram alerter not configured, skipping");
    }

    let brokers = Arc::new(BrokerRegistry::new());
    let paper_broker: Arc<dyn Broker> = Arc::new(PaperBroker::new(&config.default_broker));
    brokers
        .connect(config.default_broker.clone(), paper_broker)
        .await
        .context("connecting the default broker")?;
    let broker_handle = brokers.default_broker().await.context("no default broker connected")?;
    let initial_cash = broker_handle
        .get_accounts()
        .await
        .ok()
        .and_then(|accounts| accounts.first().map(|a| a.equity))
        .unwrap_or(rust_decimal_macros::dec!(100_000));

    let data_sources = Arc::new(DataSourceRegistry::new());
    let paper_source: Arc<dyn DataSource> = Arc::new(PaperDataSource::new(&config.default_broker));
    data_sources
        .register(config.default_broker.clone(), paper_source)
        .await
        .context("registering the default data source")?;

    let scope = compliance_scope(config, "primary".to_string());
    let compliance_manager = match db.load_compliance_snapshot(&scope).await? {
        Some(snapshot) => {
            tracing::info!(account_id = %scope.account_id, "restored compliance state from the database");
            ComplianceManager::from_snapshot(snapshot)
        }
        None => ComplianceManager::new(scope.clone()),
    };
    let compliance = Arc::new(Mutex::new(compliance_manager));

    let risk_limits = RiskLimits {
        max_position_size: config.max_position_size,
        max_portfolio_pct: config.max_portfolio_pct,
        daily_loss_limit_pct: config.daily_loss_limit_pct,
        weekly_loss_limit_pct: config.weekly_loss_limit_pct,
        max_drawdown_pct: config.max_drawdown_pct,
        vix_pause_threshold: config.vix_pause_threshold,
        vix_extreme_threshold: config.vix_extreme_threshold,
    };
    let risk = Arc::new(Mutex::new(SimpleRiskManager::new(risk_limits)));

    let calendar = Arc::new(UsEquityCalendar::new(BTreeSet::new()));
    let order_index = Arc::new(OrderIndex::new());
    let portfolio = Arc::new(Mutex::new(Portfolio::new(scope.account_id.clone(), initial_cash)));
    let fee_tracker = Arc::new(Mutex::new(FeeTracker::new(config.default_broker.clone())));
    let optimizer = Arc::new(AutoOptimizerManager::new(telemetry.clone()));

    let pipeline = Arc::new(OrderPipeline::new(
        broker_handle,
        Arc::clone(&data_sources) as Arc<dyn DataSource>,
        calendar,
        Arc::clone(&compliance),
        Arc::clone(&risk),
        order_index,
        portfolio,
        telemetry.clone(),
        fee_tracker,
        Arc::clone(&optimizer),
        config.max_orders_per_day,
    ));

    let data_source_for_bots = Arc::clone(&data_sources) as Arc<dyn DataSource>;
    let supervisor = Arc::new(BotSupervisor::new(pipeline, data_source_for_bots));

    let ctx = AppContext { brokers, data_sources, supervisor, optimizer, telemetry, compliance, db };
    Ok((ctx, risk))
}

/// Bridges a freshly created bot to the auto-optimizer (spec §4.9): the
/// closures read and write the bot's live parameter map directly, so an
/// adjustment the optimizer makes takes effect on the bot's very next cycle.
async fn register_with_optimizer(optimizer: &Arc<AutoOptimizerManager>, bot_id: &str, handle: &Arc<BotHandle>) -> Result<()> {
    let get_handle = Arc::clone(handle);
    let set_handle = Arc::clone(handle);
    optimizer
        .register_bot(
            bot_id.to_string(),
            move || get_handle.get_params(),
            move |p| set_handle.set_params(p),
            OptimizerConfig::default(),
        )
        .await?;
    Ok(())
}

async fn run(config: configuration::Config) -> Result<()> {
    let (ctx, _risk) = build_context(&config).await?;

    let persisted = ctx.db.load_bots().await.context("loading persisted bots")?;
    tracing::info!(count = persisted.len(), "restoring persisted bots");
    for (bot_id, bot_config, last_status) in persisted {
        let handle = ctx
            .supervisor
            .create_bot(bot_id.clone(), bot_config)
            .await
            .with_context(|| format!("recreating bot {bot_id}"))?;
        register_with_optimizer(&ctx.optimizer, &bot_id, &handle)
            .await
            .with_context(|| format!("registering bot {bot_id} with the auto-optimizer"))?;
        if last_status == BotStatus::Running {
            ctx.supervisor.start_bot(&bot_id).await.with_context(|| format!("starting bot {bot_id}"))?;
        }
    }

    let optimizer_tick = Arc::clone(&ctx.optimizer);
    let evaluation_interval =
        std::time::Duration::from_secs(config.evaluation_interval_minutes.max(1) as u64 * 60);
    let optimizer_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(evaluation_interval);
        loop {
            ticker.tick().await;
            optimizer_tick.tick(chrono::Utc::now()).await;
        }
    });

    tracing::info!("all bots started, awaiting shutdown signal");
    tokio::signal::ctrl_c().await.context("listening for shutdown signal")?;
    tracing::info!("shutdown signal received, stopping bots");

    optimizer_task.abort();
    let stop_results = ctx.supervisor.stop_all().await;
    for (bot_id, stopped) in &stop_results {
        if !stopped {
            tracing::warn!(bot_id, "bot did not stop cleanly");
        }
    }

    let summaries = ctx.supervisor.get_bot_summary().await;
    for summary in summaries {
        ctx.db.save_bot_status(&summary.id, summary.status).await.ok();
    }

    let snapshot = ctx.compliance.lock().await.to_snapshot();
    ctx.db.save_compliance_snapshot(&snapshot).await.context("persisting compliance state on shutdown")?;

    let disconnect_errors = ctx.brokers.disconnect_all().await;
    for (broker, error) in disconnect_errors {
        tracing::warn!(broker, %error, "broker disconnect failed during shutdown");
    }

    Ok(())
}

async fn status(config: configuration::Config) -> Result<()> {
    let db_pool = connect().await.context("connecting to the database")?;
    run_migrations(&db_pool).await.context("running database migrations")?;
    let db = DbRepository::new(db_pool);

    let bots = db.load_bots().await.context("loading persisted bots")?;
    if bots.is_empty() {
        println!("No bots have been persisted yet. Run with `run` after creating one.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Bot ID", "Name", "Symbols", "Status", "Last Updated"]);

    for (bot_id, bot_config, last_status) in &bots {
        let last_updated = db
            .bot_last_updated(bot_id)
            .await?
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string());
        table.add_row(vec![
            Cell::new(bot_id),
            Cell::new(&bot_config.name),
            Cell::new(bot_config.symbols.join(", ")),
            Cell::new(format!("{last_status:?}")),
            Cell::new(last_updated),
        ]);
    }

    println!("{table}");
    let _ = config;
    Ok(())
}

async fn reset_compliance(config: configuration::Config, account_id: String) -> Result<()> {
    let db_pool = connect().await.context("connecting to the database")?;
    run_migrations(&db_pool).await.context("running database migrations")?;
    let db = DbRepository::new(db_pool);

    let scope = compliance_scope(&config, account_id);
    if db.load_compliance_snapshot(&scope).await?.is_none() {
        println!("No compliance state found for account '{}'; nothing to reset.", scope.account_id);
        return Ok(());
    }

    let fresh = ComplianceManager::new(scope.clone());
    db.save_compliance_snapshot(&fresh.to_snapshot()).await.context("saving reset compliance state")?;
    println!("Compliance state for account '{}' has been reset.", scope.account_id);
    Ok(())
}
