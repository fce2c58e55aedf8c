//! Request handler contract.

use async_trait::async_trait;
use thiserror::Error;

use crate::envelope::{RequestEnvelope, ResponseEnvelope};

/// Errors a handler may raise instead of producing a response.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A field the handler requires is absent from the request.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("handler failed: {0}")]
    Internal(String),
}

/// A request-processing function reachable by the proxy.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: &RequestEnvelope) -> Result<ResponseEnvelope, HandlerError>;
}
