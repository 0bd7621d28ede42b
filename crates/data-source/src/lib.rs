//! Data-Source Registry (spec §4.3, §6.3). Same shape as the broker
//! registry, with per-call failover on `get_quote`/`get_bars`.

pub mod error;
pub mod paper;
pub mod registry;

use async_trait::async_trait;
use core_types::{Bar, Quote};

pub use error::DataSourceError;
pub use registry::DataSourceRegistry;

/// Sources are expected to be idempotent readers; the registry never caches.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &str;
    async fn get_quote(&self, symbol: &str) -> Result<Quote, DataSourceError>;
    async fn get_bars(&self, symbol: &str, timeframe: &str, limit: usize) -> Result<Vec<Bar>, DataSourceError>;
}

pub type DataSourceHandle = std::sync::Arc<dyn DataSource>;
