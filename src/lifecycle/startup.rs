//! Startup orchestration.
//!
//! Builds every long-lived dependency once from validated configuration:
//! the counter table, the downstream client matching the target kind, and
//! the proxy that borrows both.

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::admin::AdminState;
use crate::config::HitCounterConfig;
use crate::downstream::{DownstreamClient, HandlerRef, HttpDownstream, LocalDownstream, TargetError};
use crate::handlers::greeting::{GreetingHandler, GREETING};
use crate::proxy::CountingProxy;
use crate::store::{MemoryCounterStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid downstream target: {0}")]
    Target(#[from] TargetError),

    #[error("no in-process handler named '{0}'")]
    UnknownHandler(String),

    #[error("failed to open counter table: {0}")]
    Store(#[from] StoreError),
}

/// Long-lived services shared by the servers and background tasks.
pub struct Services {
    pub store: Arc<MemoryCounterStore>,
    pub proxy: Arc<CountingProxy>,
}

impl Services {
    pub fn build(config: &HitCounterConfig) -> Result<Self, StartupError> {
        let store = Arc::new(match &config.store.data_dir {
            Some(dir) => MemoryCounterStore::open(&config.store.table, Path::new(dir), config.store.read_capacity)?,
            None => MemoryCounterStore::new(&config.store.table, config.store.read_capacity),
        });

        let target: HandlerRef = config.downstream.target.parse()?;
        let downstream: Arc<dyn DownstreamClient> = match &target {
            HandlerRef::Local(name) => {
                let local = LocalDownstream::new(config.downstream.timeout())
                    .register(GREETING, Arc::new(GreetingHandler));
                if !local.contains(name) {
                    return Err(StartupError::UnknownHandler(name.clone()));
                }
                Arc::new(local)
            }
            HandlerRef::Http(_) => Arc::new(HttpDownstream::new(config.downstream.timeout())),
        };

        let proxy = CountingProxy::from_config(config, store.clone(), downstream)?;

        tracing::info!(
            table = %store.table(),
            durable = store.is_durable(),
            downstream = %proxy.target(),
            policy = ?proxy.policy(),
            "Services initialized"
        );

        Ok(Self {
            store,
            proxy: Arc::new(proxy),
        })
    }

    /// State for the reporting API.
    pub fn admin_state(&self, config: &HitCounterConfig) -> AdminState {
        AdminState {
            store: self.store.clone(),
            table: self.store.table().to_string(),
            target: self.proxy.target().to_string(),
            title: config.admin.title.clone(),
        }
    }
}
