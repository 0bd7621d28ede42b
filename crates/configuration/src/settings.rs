use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// The root configuration document (spec §6.5): every recognized option,
/// nothing else. `broker_configs`/`data_source_configs` are opaque JSON
/// blobs — this crate doesn't know the shape of a given broker's config,
/// only that one exists per broker name.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub trading_mode: TradingMode,
    pub default_broker: String,

    pub max_position_size: Decimal,
    pub max_portfolio_pct: Decimal,
    pub daily_loss_limit_pct: Decimal,
    pub weekly_loss_limit_pct: Decimal,
    pub max_drawdown_pct: Decimal,
    pub vix_pause_threshold: Decimal,
    pub vix_extreme_threshold: Decimal,

    pub max_open_positions: u32,
    pub max_orders_per_day: u32,
    pub evaluation_interval_minutes: u32,

    /// Inert: the AI-assistant/MCP control surface is out of scope (spec
    /// Non-goals), but the key is part of the documented schema so a config
    /// file written for a fuller deployment still loads here unmodified.
    #[serde(default)]
    pub mcp_enabled: bool,

    #[serde(default)]
    pub broker_configs: HashMap<String, JsonValue>,
    #[serde(default)]
    pub data_source_configs: HashMap<String, JsonValue>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub alerter: AlerterConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    Paper,
    Live,
}

/// Drives `init_tracing`. Not part of spec §6.5's recognized-options list
/// (that section is silent on logging), but every teacher binary reads its
/// logging setup from the same config document rather than hardcoding it,
/// so it's nested here under its own key rather than a separate file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file_logging: bool,
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), file_logging: false, log_dir: "logs".to_string() }
    }
}

/// Drives the `alerter` crate's `TelegramAlerter`. Like `logging`, not part
/// of spec §6.5's recognized-options list — every teacher binary reads its
/// ambient consumers' config from the same document rather than env vars
/// scattered across crates, so it's nested here too.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AlerterConfig {
    pub telegram_token: String,
    pub telegram_chat_id: String,
}
