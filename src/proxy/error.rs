//! Proxy error taxonomy.

use axum::http::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::downstream::InvokeError;
use crate::envelope::EnvelopeError;

/// Errors surfaced by `CountingProxy::handle`.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Request failed local validation; no collaborator was contacted.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Counter increment failed or timed out under the strict policy.
    #[error("counter store unavailable: {0}")]
    CounterUnavailable(String),

    #[error("downstream invocation timed out after {0:?}")]
    InvocationTimeout(Duration),

    #[error("downstream invocation failed: {0}")]
    InvocationError(String),

    /// Downstream answered with something that is not a response envelope.
    #[error("downstream response malformed: {0}")]
    DownstreamResponseMalformed(String),
}

impl ProxyError {
    /// Stable snake_case code, used in error bodies and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::MalformedRequest(_) => "malformed_request",
            ProxyError::CounterUnavailable(_) => "counter_unavailable",
            ProxyError::InvocationTimeout(_) => "invocation_timeout",
            ProxyError::InvocationError(_) => "invocation_error",
            ProxyError::DownstreamResponseMalformed(_) => "downstream_response_malformed",
        }
    }

    /// HTTP status reported to callers.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::CounterUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::InvocationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::InvocationError(_) | ProxyError::DownstreamResponseMalformed(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl From<InvokeError> for ProxyError {
    fn from(e: InvokeError) -> Self {
        match e {
            InvokeError::Timeout(d) => ProxyError::InvocationTimeout(d),
            InvokeError::Failed(msg) => ProxyError::InvocationError(msg),
            InvokeError::Malformed(msg) => ProxyError::DownstreamResponseMalformed(msg),
        }
    }
}

impl From<EnvelopeError> for ProxyError {
    fn from(e: EnvelopeError) -> Self {
        ProxyError::MalformedRequest(e.to_string())
    }
}
