//! Downstream invocation subsystem.
//!
//! # Data Flow
//! ```text
//! CountingProxy
//!     → DownstreamClient::invoke(target, request)
//!         → local.rs   (HandlerRef::Local: in-process Handler by name)
//!         → http.rs    (HandlerRef::Http: POST envelope JSON, parse envelope JSON)
//!     ← ResponseEnvelope, any status
//!
//! endpoint.rs exposes any Handler on POST /_invoke with the same wire contract.
//! ```
//!
//! # Design Decisions
//! - A 4xx/5xx envelope is a successful invocation; only transport failures are errors
//! - Every invocation is bounded by the client's configured timeout
//! - No retries

pub mod endpoint;
pub mod handler;
pub mod http;
pub mod local;
pub mod target;

pub use endpoint::handler_router;
pub use handler::{Handler, HandlerError};
pub use http::HttpDownstream;
pub use local::LocalDownstream;
pub use target::{HandlerRef, TargetError};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::resilience::timeouts::TimedOut;

/// Path on which envelope-speaking endpoints accept invocations.
pub const INVOKE_PATH: &str = "/_invoke";

/// Errors that can occur while invoking a downstream handler.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// No response within the configured timeout.
    #[error("downstream did not respond within {0:?}")]
    Timeout(Duration),

    /// The call itself failed (connection, transport status, handler failure).
    #[error("{0}")]
    Failed(String),

    /// The call completed but its payload is not a response envelope.
    #[error("{0}")]
    Malformed(String),
}

impl From<TimedOut> for InvokeError {
    fn from(e: TimedOut) -> Self {
        InvokeError::Timeout(e.0)
    }
}

/// Client for invoking a downstream handler synchronously.
#[async_trait]
pub trait DownstreamClient: Send + Sync {
    async fn invoke(
        &self,
        target: &HandlerRef,
        request: &RequestEnvelope,
    ) -> Result<ResponseEnvelope, InvokeError>;
}
