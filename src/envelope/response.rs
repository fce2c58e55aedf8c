//! Outbound response envelope.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::{Map, Value};

use super::EnvelopeError;

/// One outbound result, as produced by a downstream handler.
///
/// An envelope decoded from a downstream keeps that downstream's JSON text
/// and serializes back to exactly those bytes. Envelopes built in-process
/// (or changed through a builder method) serialize from their typed fields.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    status_code: u16,
    headers: BTreeMap<String, String>,
    multi_value_headers: BTreeMap<String, Vec<String>>,
    body: String,
    is_base64_encoded: bool,
    extra: Map<String, Value>,
    raw: Option<Box<RawValue>>,
}

/// Inbound wire layout. `null` reads the same as an absent field.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIn {
    status_code: u16,
    #[serde(default)]
    headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    multi_value_headers: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    is_base64_encoded: Option<bool>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireOut<'a> {
    status_code: u16,
    headers: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "no_values")]
    multi_value_headers: &'a BTreeMap<String, Vec<String>>,
    body: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    is_base64_encoded: bool,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

fn no_values(map: &&BTreeMap<String, Vec<String>>) -> bool {
    map.is_empty()
}

impl ResponseEnvelope {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: BTreeMap::new(),
            multi_value_headers: BTreeMap::new(),
            body: String::new(),
            is_base64_encoded: false,
            extra: Map::new(),
            raw: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self.raw = None;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self.is_base64_encoded = false;
        self.raw = None;
        self
    }

    /// Binary body, carried base64-encoded with `isBase64Encoded: true`.
    pub fn with_binary_body(mut self, bytes: &[u8]) -> Self {
        self.body = STANDARD.encode(bytes);
        self.is_base64_encoded = true;
        self.raw = None;
        self
    }

    /// Attach a field the envelope does not model.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self.raw = None;
        self
    }

    /// Decode an envelope from JSON bytes, keeping the text as received.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let raw: Box<RawValue> = serde_json::from_slice(bytes)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: Box<RawValue>) -> Result<Self, EnvelopeError> {
        if !raw.get().trim_start().starts_with('{') {
            return Err(EnvelopeError::NotAnObject);
        }

        let wire: WireIn = serde_json::from_str(raw.get())?;
        Ok(Self {
            status_code: wire.status_code,
            headers: wire.headers.unwrap_or_default(),
            multi_value_headers: wire.multi_value_headers.unwrap_or_default(),
            body: wire.body.unwrap_or_default(),
            is_base64_encoded: wire.is_base64_encoded.unwrap_or(false),
            extra: wire.extra,
            raw: Some(raw),
        })
    }

    /// Wire form: the received text when there is one.
    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        match &self.raw {
            Some(raw) => Ok(raw.get().to_owned()),
            None => Ok(serde_json::to_string(&self.wire())?),
        }
    }

    fn wire(&self) -> WireOut<'_> {
        WireOut {
            status_code: self.status_code,
            headers: &self.headers,
            multi_value_headers: &self.multi_value_headers,
            body: &self.body,
            is_base64_encoded: self.is_base64_encoded,
            extra: &self.extra,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn multi_value_headers(&self) -> &BTreeMap<String, Vec<String>> {
        &self.multi_value_headers
    }

    /// Body as carried on the wire (base64 text when `is_base64_encoded`).
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn is_base64_encoded(&self) -> bool {
        self.is_base64_encoded
    }

    /// Fields the envelope does not model.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Body bytes to put on the wire, decoded when `isBase64Encoded` is set.
    pub fn body_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        if self.is_base64_encoded {
            Ok(STANDARD.decode(self.body.as_bytes())?)
        } else {
            Ok(self.body.as_bytes().to_vec())
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

impl PartialEq for ResponseEnvelope {
    fn eq(&self, other: &Self) -> bool {
        self.status_code == other.status_code
            && self.headers == other.headers
            && self.multi_value_headers == other.multi_value_headers
            && self.body == other.body
            && self.is_base64_encoded == other.is_base64_encoded
            && self.extra == other.extra
    }
}

impl Serialize for ResponseEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.raw {
            Some(raw) => raw.serialize(serializer),
            None => self.wire().serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ResponseEnvelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(serde::de::Error::custom)
    }
}
