//! Inbound request envelope.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

use super::EnvelopeError;

/// One inbound invocation.
///
/// The original JSON text is retained verbatim and is what gets forwarded
/// downstream. `path`, `identity` and `request_id` are extracted once at
/// decode time and are never written back.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    raw: Box<RawValue>,
    path: Option<String>,
    identity: Option<String>,
    request_id: Option<String>,
}

#[derive(Deserialize, Default)]
struct EnvelopeView {
    #[serde(default)]
    path: Option<String>,
    #[serde(default, rename = "requestContext")]
    request_context: Option<RequestContextView>,
}

#[derive(Deserialize, Default)]
struct RequestContextView {
    #[serde(default)]
    identity: Option<IdentityView>,
    #[serde(default, rename = "requestId")]
    request_id: Option<String>,
}

#[derive(Deserialize, Default)]
struct IdentityView {
    #[serde(default)]
    user: Option<String>,
}

impl RequestEnvelope {
    /// Decode an envelope from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let raw: Box<RawValue> = serde_json::from_slice(bytes)?;
        Self::from_raw(raw)
    }

    /// Build an envelope from an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, EnvelopeError> {
        let raw = RawValue::from_string(value.to_string())?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: Box<RawValue>) -> Result<Self, EnvelopeError> {
        if !raw.get().trim_start().starts_with('{') {
            return Err(EnvelopeError::NotAnObject);
        }

        let view: EnvelopeView = serde_json::from_str(raw.get())?;
        let (identity, request_id) = match view.request_context {
            Some(ctx) => (ctx.identity.and_then(|i| i.user), ctx.request_id),
            None => (None, None),
        };

        Ok(Self {
            raw,
            path: view.path,
            identity,
            request_id,
        })
    }

    /// Routing key of the request, if present.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Caller identity from `requestContext.identity.user`.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Correlation ID from `requestContext.requestId`.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// The original payload exactly as received.
    pub fn raw(&self) -> &RawValue {
        &self.raw
    }

    /// The original payload as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.raw.get().as_bytes()
    }
}

impl PartialEq for RequestEnvelope {
    fn eq(&self, other: &Self) -> bool {
        self.raw.get() == other.raw.get()
    }
}

impl Serialize for RequestEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RequestEnvelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(serde::de::Error::custom)
    }
}
