//! Counting proxy: the request path through the service.
//!
//! # Data Flow
//! ```text
//! RequestEnvelope
//!     → validate path (MalformedRequest, nothing contacted)
//!     → CounterStore::increment(path)   (bounded by store timeout, policy on failure)
//!     → DownstreamClient::invoke(target, request)
//!     ← ResponseEnvelope, returned unchanged
//! ```
//!
//! # Design Decisions
//! - Increment strictly before invoke, so a timed-out call is still counted
//! - No state between invocations; collaborators arrive as `Arc`s
//! - Failures are surfaced, never replaced with a fabricated response

pub mod counting;
pub mod error;

pub use counting::CountingProxy;
pub use error::ProxyError;
