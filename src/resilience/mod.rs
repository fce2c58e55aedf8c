//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to an external collaborator (counter store, downstream handler):
//!     → timeouts.rs (enforce a deadline)
//!     → on expiry the caller maps TimedOut to its own error kind
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - No retries at this layer; a failed call is reported, not repeated

pub mod timeouts;
