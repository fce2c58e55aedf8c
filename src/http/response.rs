//! Rendering of proxy results as HTTP responses.
//!
//! - A response envelope becomes a response with exactly its status, headers and body
//! - A proxy error becomes a JSON body `{"error": kind, "message": text}`

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::envelope::ResponseEnvelope;
use crate::proxy::ProxyError;

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// Render an envelope as a plain HTTP response.
///
/// `multiValueHeaders` are appended after `headers`, and a body flagged
/// `isBase64Encoded` is decoded. An envelope whose status, headers or body
/// cannot be expressed as HTTP is reported as `DownstreamResponseMalformed`
/// rather than altered.
pub fn render_envelope(envelope: ResponseEnvelope) -> Response {
    match build_response(&envelope) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Downstream envelope cannot be rendered as HTTP");
            e.into_response()
        }
    }
}

fn build_response(envelope: &ResponseEnvelope) -> Result<Response, ProxyError> {
    let status = StatusCode::from_u16(envelope.status_code()).map_err(|_| {
        ProxyError::DownstreamResponseMalformed(format!("invalid status code {}", envelope.status_code()))
    })?;

    let single = envelope.headers().iter().map(|(k, v)| (k, v));
    let multi = envelope
        .multi_value_headers()
        .iter()
        .flat_map(|(k, values)| values.iter().map(move |v| (k, v)));

    let mut headers = HeaderMap::with_capacity(envelope.headers().len());
    for (name, value) in single.chain(multi) {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ProxyError::DownstreamResponseMalformed(format!("invalid header '{}'", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ProxyError::DownstreamResponseMalformed(format!("invalid value for header '{}'", name)))?;
        headers.append(name, value);
    }

    let body = envelope
        .body_bytes()
        .map_err(|e| ProxyError::DownstreamResponseMalformed(e.to_string()))?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
