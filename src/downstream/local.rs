//! In-process downstream handlers.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::downstream::handler::Handler;
use crate::downstream::target::HandlerRef;
use crate::downstream::{DownstreamClient, InvokeError};
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;

/// Dispatches `local:<name>` targets to registered handlers.
#[derive(Clone)]
pub struct LocalDownstream {
    handlers: HashMap<String, Arc<dyn Handler>>,
    timeout: Duration,
}

impl LocalDownstream {
    pub fn new(timeout: Duration) -> Self {
        Self {
            handlers: HashMap::new(),
            timeout,
        }
    }

    /// Register `handler` under `name`, replacing any previous registration.
    pub fn register(mut self, name: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

#[async_trait]
impl DownstreamClient for LocalDownstream {
    async fn invoke(
        &self,
        target: &HandlerRef,
        request: &RequestEnvelope,
    ) -> Result<ResponseEnvelope, InvokeError> {
        let name = match target {
            HandlerRef::Local(name) => name,
            HandlerRef::Http(_) => {
                return Err(InvokeError::Failed(format!(
                    "target {} is not an in-process handler",
                    target
                )))
            }
        };

        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| InvokeError::Failed(format!("no handler registered as '{}'", name)))?;

        let start = Instant::now();
        let result = with_deadline(self.timeout, handler.handle(request)).await;
        metrics::record_downstream(start);

        result?.map_err(|e| InvokeError::Failed(format!("handler '{}' failed: {}", name, e)))
    }
}
