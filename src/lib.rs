//! Hit counter: a counting proxy that records per-path visits in a durable
//! counter table and forwards each request, unchanged, to a downstream handler.

pub mod admin;
pub mod config;
pub mod downstream;
pub mod envelope;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod resilience;
pub mod store;

pub use config::HitCounterConfig;
pub use envelope::{RequestEnvelope, ResponseEnvelope};
pub use http::HttpServer;
pub use lifecycle::{Services, Shutdown};
pub use proxy::{CountingProxy, ProxyError};
