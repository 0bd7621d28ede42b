use std::collections::HashMap;

use async_trait::async_trait;
use core_types::{Bar, Quote};
use tokio::sync::RwLock;
use tracing::warn;

use crate::{DataSource, DataSourceError, DataSourceHandle};

/// Priority-ordered failover registry (spec §4.3 / scenario S6). Failover is
/// per-call, never sticky: a source that fails once is not demoted from the
/// priority list.
pub struct DataSourceRegistry {
    handles: RwLock<HashMap<String, DataSourceHandle>>,
    priority: RwLock<Vec<String>>,
}

impl Default for DataSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSourceRegistry {
    pub fn new() -> Self {
        Self {
            handles: RwLock::new(HashMap::new()),
            priority: RwLock::new(Vec::new()),
        }
    }

    pub async fn register(&self, name: String, handle: DataSourceHandle) -> Result<(), DataSourceError> {
        let mut handles = self.handles.write().await;
        if handles.contains_key(&name) {
            return Err(DataSourceError::AlreadyConnected(name));
        }
        handles.insert(name.clone(), handle);
        self.priority.write().await.push(name);
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Option<DataSourceHandle> {
        self.handles.read().await.get(name).cloned()
    }

    /// Attempts `preferred` (if given) then walks the priority list,
    /// returning the first successful quote.
    pub async fn get_quote(&self, symbol: &str, preferred: Option<&str>) -> Result<Quote, DataSourceError> {
        for name in self.candidate_order(preferred).await {
            if let Some(handle) = self.get(&name).await {
                match handle.get_quote(symbol).await {
                    Ok(quote) => return Ok(quote),
                    Err(e) => warn!(source = %name, symbol, error = %e, "quote source failed, trying next"),
                }
            }
        }
        Err(DataSourceError::NotFound(symbol.to_string()))
    }

    pub async fn get_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
        preferred: Option<&str>,
    ) -> Result<Vec<Bar>, DataSourceError> {
        for name in self.candidate_order(preferred).await {
            if let Some(handle) = self.get(&name).await {
                match handle.get_bars(symbol, timeframe, limit).await {
                    Ok(bars) => return Ok(bars),
                    Err(e) => warn!(source = %name, symbol, error = %e, "bars source failed, trying next"),
                }
            }
        }
        Err(DataSourceError::NotFound(symbol.to_string()))
    }

    async fn candidate_order(&self, preferred: Option<&str>) -> Vec<String> {
        let priority = self.priority.read().await.clone();
        match preferred {
            Some(p) => {
                let mut order = vec![p.to_string()];
                order.extend(priority.into_iter().filter(|n| n != p));
                order
            }
            None => priority,
        }
    }
}

/// The registry is itself a `DataSource`: callers (the `engine` crate's
/// `BotHandle`/`BotSupervisor`, which take a single `Arc<dyn DataSource>`)
/// get failover transparently by depending on the registry rather than one
/// named source.
#[async_trait]
impl DataSource for DataSourceRegistry {
    fn name(&self) -> &str {
        "registry"
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, DataSourceError> {
        self.get_quote(symbol, None).await
    }

    async fn get_bars(&self, symbol: &str, timeframe: &str, limit: usize) -> Result<Vec<Bar>, DataSourceError> {
        self.get_bars(symbol, timeframe, limit, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::PaperDataSource;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FailingSource;

    #[async_trait]
    impl DataSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }
        async fn get_quote(&self, symbol: &str) -> Result<Quote, DataSourceError> {
            Err(DataSourceError::NotFound(symbol.to_string()))
        }
        async fn get_bars(&self, _: &str, _: &str, _: usize) -> Result<Vec<Bar>, DataSourceError> {
            Err(DataSourceError::NotFound("x".into()))
        }
    }

    #[tokio::test]
    async fn failover_tries_next_source_on_error() {
        let registry = DataSourceRegistry::new();
        registry
            .register("a".into(), Arc::new(FailingSource))
            .await
            .unwrap();
        registry
            .register("b".into(), Arc::new(PaperDataSource::new("b")))
            .await
            .unwrap();

        let quote = registry.get_quote("XYZ", None).await.unwrap();
        assert_eq!(quote.source, "b");
        // A is not demoted from the priority list.
        assert_eq!(registry.priority.read().await.clone(), vec!["a", "b"]);
    }
}
