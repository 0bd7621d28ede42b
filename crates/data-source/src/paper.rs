use async_trait::async_trait;
use chrono::Utc;
use core_types::{Bar, Quote};
use rust_decimal_macros::dec;

use crate::{DataSource, DataSourceError};

/// Deterministic synthetic quotes/bars used for `trading_mode: paper` and in
/// tests, since concrete vendor data-feed integrations are out of scope.
pub struct PaperDataSource {
    name: String,
}

impl PaperDataSource {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

#[async_trait]
impl DataSource for PaperDataSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, DataSourceError> {
        Ok(Quote {
            symbol: symbol.to_string(),
            bid: dec!(99.95),
            ask: dec!(100.05),
            last: dec!(100.00),
            bid_size: dec!(100),
            ask_size: dec!(100),
            volume: dec!(1_000_000),
            timestamp: Utc::now(),
            source: self.name.clone(),
        })
    }

    async fn get_bars(&self, _symbol: &str, _timeframe: &str, limit: usize) -> Result<Vec<Bar>, DataSourceError> {
        let now = Utc::now();
        Ok((0..limit)
            .map(|i| Bar {
                timestamp: now - chrono::Duration::minutes(limit as i64 - i as i64),
                open: dec!(100),
                high: dec!(100.5),
                low: dec!(99.5),
                close: dec!(100),
                volume: dec!(10_000),
            })
            .collect())
    }
}
