//! Downstream handlers reachable over HTTP.
//!
//! # Wire Contract
//! - Request: `POST <target>` with the request envelope as the JSON body
//! - 2xx transport status: body must decode as a response envelope
//! - Any other transport status: invocation failure
//!
//! The envelope's own `statusCode` is independent of the transport status.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::time::{Duration, Instant};

use crate::downstream::target::HandlerRef;
use crate::downstream::{DownstreamClient, InvokeError};
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;

/// Upper bound on a downstream response payload.
const MAX_RESPONSE_BYTES: usize = 6 * 1024 * 1024;

/// Invokes `http://` targets with a pooled hyper client.
#[derive(Clone)]
pub struct HttpDownstream {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl HttpDownstream {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, timeout }
    }

    async fn exchange(&self, request: Request<Body>) -> Result<ResponseEnvelope, InvokeError> {
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| InvokeError::Failed(format!("downstream request failed: {}", e)))?;

        let status = response.status();
        let body = read_body(response).await?;

        if !status.is_success() {
            return Err(InvokeError::Failed(format!(
                "downstream transport returned {}: {}",
                status,
                String::from_utf8_lossy(&body)
            )));
        }

        ResponseEnvelope::from_slice(&body).map_err(|e| InvokeError::Malformed(e.to_string()))
    }
}

async fn read_body(
    response: hyper::Response<hyper::body::Incoming>,
) -> Result<axum::body::Bytes, InvokeError> {
    axum::body::to_bytes(Body::new(response.into_body()), MAX_RESPONSE_BYTES)
        .await
        .map_err(|e| InvokeError::Failed(format!("failed to read downstream response: {}", e)))
}

#[async_trait]
impl DownstreamClient for HttpDownstream {
    async fn invoke(
        &self,
        target: &HandlerRef,
        request: &RequestEnvelope,
    ) -> Result<ResponseEnvelope, InvokeError> {
        let url = match target {
            HandlerRef::Http(url) => url,
            HandlerRef::Local(_) => {
                return Err(InvokeError::Failed(format!(
                    "target {} is not reachable over HTTP",
                    target
                )))
            }
        };

        let outbound = Request::builder()
            .method(Method::POST)
            .uri(url.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(request.raw().get().to_owned()))
            .map_err(|e| InvokeError::Failed(format!("failed to build downstream request: {}", e)))?;

        let start = Instant::now();
        let result = with_deadline(self.timeout, self.exchange(outbound)).await;
        metrics::record_downstream(start);

        if let Err(ref elapsed) = result {
            tracing::warn!(handler = %target, error = %elapsed, "Downstream timed out");
        }
        result?
    }
}
