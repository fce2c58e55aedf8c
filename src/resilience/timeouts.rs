//! Timeout enforcement.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// A deadline expired before the wrapped operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation timed out after {0:?}")]
pub struct TimedOut(pub Duration);

/// Run `fut` with a deadline. The future is dropped (cancelled) on expiry.
pub async fn with_deadline<F: Future>(limit: Duration, fut: F) -> Result<F::Output, TimedOut> {
    tokio::time::timeout(limit, fut).await.map_err(|_| TimedOut(limit))
}
