//! Request and response envelopes.
//!
//! # Data Flow
//! ```text
//! caller JSON / gateway HTTP request
//!     → request.rs (RequestEnvelope: raw payload + typed view of path/identity)
//!     → proxy (inspects path only, never mutates)
//!     → downstream (receives the raw payload byte-for-byte)
//!     → response.rs (ResponseEnvelope: statusCode/headers/body)
//!     → caller, unchanged
//! ```
//!
//! # Design Decisions
//! - The request keeps its original JSON text; typed fields are a read-only view
//! - A response decoded from a downstream keeps its JSON text and is re-emitted byte-for-byte
//! - `null` and absent response fields read the same

pub mod request;
pub mod response;

pub use request::RequestEnvelope;
pub use response::ResponseEnvelope;

use thiserror::Error;

/// Errors raised while decoding an envelope from its wire form.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Payload is not valid JSON, or a modelled field has the wrong type.
    #[error("invalid envelope JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload is valid JSON but not an object.
    #[error("envelope must be a JSON object")]
    NotAnObject,

    /// `isBase64Encoded` is set but the body is not valid base64.
    #[error("invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),
}
