//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → open counter table → register handlers → build CountingProxy
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs, serve.rs):
//!     broadcast → servers drain → flusher's own signal → final snapshot → exit
//! ```
//!
//! # Design Decisions
//! - Expensive clients are built once here and handed out as `Arc`s
//! - Fail fast: any startup error is fatal

pub mod serve;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use serve::serve;
pub use shutdown::Shutdown;
pub use startup::{Services, StartupError};
