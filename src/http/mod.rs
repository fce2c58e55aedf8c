//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, limits, timeouts, tracing)
//!     → request.rs (assign/propagate X-Request-ID)
//!     → POST /_invoke: body is a RequestEnvelope
//!       any other route: gateway.rs converts the HTTP request into a RequestEnvelope
//!     → CountingProxy::handle
//!     → response.rs (ResponseEnvelope → HTTP, ProxyError → JSON error)
//!     → Send to client
//! ```

pub mod gateway;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::HttpServer;
