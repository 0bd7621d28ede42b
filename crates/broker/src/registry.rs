use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{Broker, BrokerError, BrokerHandle, BrokerKey};

/// Map of named brokers to polymorphic handles, plus a priority list,
/// exactly the shape spec §4.2 describes. `connect`/`disconnect_all` are the
/// only write paths; `get`/`default` never block on I/O.
pub struct BrokerRegistry {
    handles: RwLock<HashMap<BrokerKey, BrokerHandle>>,
    priority: RwLock<Vec<BrokerKey>>,
    default: RwLock<Option<BrokerKey>>,
}

impl Default for BrokerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerRegistry {
    pub fn new() -> Self {
        Self {
            handles: RwLock::new(HashMap::new()),
            priority: RwLock::new(Vec::new()),
            default: RwLock::new(None),
        }
    }

    /// Instantiates the given handle, calls `connect`, and inserts it on
    /// success. Sets it as the default broker if none is set yet.
    pub async fn connect(&self, name: BrokerKey, handle: BrokerHandle) -> Result<(), BrokerError> {
        {
            let handles = self.handles.read().await;
            if handles.contains_key(&name) {
                return Err(BrokerError::AlreadyConnected(name));
            }
        }
        handle.connect().await.map_err(|e| {
            warn!(broker = %name, error = %e, "broker connection failed");
            e
        })?;

        let mut handles = self.handles.write().await;
        let mut priority = self.priority.write().await;
        let mut default = self.default.write().await;

        handles.insert(name.clone(), handle);
        priority.push(name.clone());
        if default.is_none() {
            *default = Some(name.clone());
        }
        info!(broker = %name, "broker connected");
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Option<BrokerHandle> {
        self.handles.read().await.get(name).cloned()
    }

    pub async fn default_broker(&self) -> Option<BrokerHandle> {
        let default = self.default.read().await.clone()?;
        self.get(&default).await
    }

    pub async fn set_default(&self, name: &str) -> Result<(), BrokerError> {
        if !self.handles.read().await.contains_key(name) {
            return Err(BrokerError::UnknownBroker(name.to_string()));
        }
        *self.default.write().await = Some(name.to_string());
        Ok(())
    }

    /// Disconnects every broker in reverse priority order, best-effort,
    /// collecting (not short-circuiting on) errors.
    pub async fn disconnect_all(&self) -> Vec<(BrokerKey, BrokerError)> {
        let mut errors = Vec::new();
        let priority = self.priority.read().await.clone();
        let handles = self.handles.read().await;
        for name in priority.into_iter().rev() {
            if let Some(handle) = handles.get(&name) {
                if let Err(e) = handle.disconnect().await {
                    errors.push((name, e));
                }
            }
        }
        errors
    }

    pub async fn priority_list(&self) -> Vec<BrokerKey> {
        self.priority.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::PaperBroker;

    #[tokio::test]
    async fn first_connected_broker_becomes_default() {
        let registry = BrokerRegistry::new();
        let paper: Arc<dyn Broker> = Arc::new(PaperBroker::new("paper-1"));
        registry.connect("paper-1".into(), paper).await.unwrap();
        assert!(registry.default_broker().await.is_some());
    }

    #[tokio::test]
    async fn duplicate_connect_is_rejected() {
        let registry = BrokerRegistry::new();
        let paper: Arc<dyn Broker> = Arc::new(PaperBroker::new("paper-1"));
        registry.connect("paper-1".into(), paper.clone()).await.unwrap();
        let err = registry.connect("paper-1".into(), paper).await.unwrap_err();
        assert!(matches!(err, BrokerError::AlreadyConnected(_)));
    }
}
