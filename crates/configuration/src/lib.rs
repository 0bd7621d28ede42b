use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;
use crate::settings::LoggingConfig;

pub mod error;
pub mod settings;

pub use settings::{AlerterConfig, Config, LoggingConfig as LoggingSettings, TradingMode};

/// Loads the application configuration document (spec §6.5): `config.toml`
/// by default, or the path given in `path`, overlaid with `ENGINE__`-prefixed
/// environment variables (e.g. `ENGINE__MAX_POSITION_SIZE=500`) so secrets
/// and per-deployment overrides never need to touch the checked-in file.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path.unwrap_or("config")))
        .add_source(config::Environment::with_prefix("ENGINE").separator("__"))
        .build()?;

    Ok(builder.try_deserialize::<Config>()?)
}

/// Initializes the global `tracing` subscriber: an `EnvFilter` seeded from
/// `logging.level` (overridable via `RUST_LOG`), plus an optional rolling
/// file appender when `file_logging` is set. Callers invoke this exactly
/// once at startup.
pub fn init_tracing(
    logging: &LoggingConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, ConfigError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.file_logging {
        let file_appender = tracing_appender::rolling::daily(&logging.log_dir, "engine.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(non_blocking)
            .try_init()
            .map_err(|e| ConfigError::LoggingInit(e.to_string()))?;
        Ok(Some(guard))
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| ConfigError::LoggingInit(e.to_string()))?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use settings::TradingMode;

    fn load_toml(body: &str) -> Result<Config, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(body, config::FileFormat::Toml))
            .build()?;
        Ok(builder.try_deserialize::<Config>()?)
    }

    const MINIMAL: &str = r#"
        trading_mode = "paper"
        default_broker = "paper"
        max_position_size = 10000
        max_portfolio_pct = 10
        daily_loss_limit_pct = 3
        weekly_loss_limit_pct = 8
        max_drawdown_pct = 10
        vix_pause_threshold = 35
        vix_extreme_threshold = 50
        max_open_positions = 5
        max_orders_per_day = 20
        evaluation_interval_minutes = 60
    "#;

    #[test]
    fn a_minimal_document_parses_with_defaulted_optional_fields() {
        let config = load_toml(MINIMAL).unwrap();
        assert_eq!(config.trading_mode, TradingMode::Paper);
        assert!(!config.mcp_enabled);
        assert!(config.broker_configs.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn an_unknown_trading_mode_fails_to_parse() {
        let body = MINIMAL.replace("\"paper\"", "\"sandbox\"");
        assert!(load_toml(&body).is_err());
    }
}
