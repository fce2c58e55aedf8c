//! Greeting handler: echoes the caller identity and path.

use async_trait::async_trait;

use crate::downstream::handler::{Handler, HandlerError};
use crate::envelope::{RequestEnvelope, ResponseEnvelope};

/// Name the greeting handler is registered under (`local:greeting`).
pub const GREETING: &str = "greeting";

pub struct GreetingHandler;

#[async_trait]
impl Handler for GreetingHandler {
    async fn handle(&self, request: &RequestEnvelope) -> Result<ResponseEnvelope, HandlerError> {
        tracing::debug!(request = %request.raw().get(), "Greeting request");

        let user = request
            .identity()
            .ok_or(HandlerError::MissingField("requestContext.identity.user"))?;
        let path = request.path().ok_or(HandlerError::MissingField("path"))?;

        Ok(ResponseEnvelope::new(200)
            .with_header("Content-Type", "text/plain")
            .with_body(format!("Hello, {}! You have hit {}\n", user, path)))
    }
}
