//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, defaults for missing fields)
//!     → loader.rs (DOWNSTREAM_FUNCTION_NAME / HITS_TABLE_NAME overrides)
//!     → validation.rs (semantic checks, all errors collected)
//!     → HitCounterConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults so the service runs with no file at all

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, CountingConfig, CountingPolicy, DownstreamConfig, HitCounterConfig,
    ListenerConfig, ObservabilityConfig, StoreConfig,
};
