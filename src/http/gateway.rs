//! Conversion of a plain HTTP request into a request envelope.
//!
//! The envelope follows the API-gateway proxy event layout, so handlers
//! written against that shape work unchanged:
//!
//! ```text
//! { "resource": "/{proxy+}", "path", "httpMethod", "headers",
//!   "queryStringParameters", "body", "isBase64Encoded",
//!   "requestContext": { "requestId", "httpMethod", "path",
//!                       "identity": { "user", "sourceIp" } } }
//! ```

use axum::body::Body;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use axum::extract::ConnectInfo;
use axum::http::Request;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;

use crate::envelope::RequestEnvelope;
use crate::http::request::request_id;
use crate::proxy::ProxyError;

/// Header carrying the caller identity.
pub const X_USER: &str = "x-user";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GatewayEvent<'a> {
    resource: &'static str,
    path: &'a str,
    http_method: &'a str,
    headers: BTreeMap<String, String>,
    query_string_parameters: Option<BTreeMap<String, String>>,
    body: Option<String>,
    is_base64_encoded: bool,
    request_context: GatewayContext<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GatewayContext<'a> {
    request_id: Option<&'a str>,
    http_method: &'a str,
    path: &'a str,
    identity: GatewayIdentity<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GatewayIdentity<'a> {
    user: Option<&'a str>,
    source_ip: Option<String>,
}

/// Read the full request and build its envelope.
pub async fn into_envelope(request: Request<Body>, max_body_bytes: usize) -> Result<RequestEnvelope, ProxyError> {
    let (parts, body) = request.into_parts();

    let bytes = axum::body::to_bytes(body, max_body_bytes)
        .await
        .map_err(|e| ProxyError::MalformedRequest(format!("unreadable request body: {}", e)))?;

    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in parts.headers.iter() {
        let Ok(value) = value.to_str() else { continue };
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    let query_string_parameters = parts.uri.query().map(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .into_owned()
            .collect::<BTreeMap<String, String>>()
    });

    let (body, is_base64_encoded) = if bytes.is_empty() {
        (None, false)
    } else {
        match std::str::from_utf8(&bytes) {
            Ok(text) => (Some(text.to_owned()), false),
            Err(_) => (Some(STANDARD.encode(&bytes)), true),
        }
    };

    let source_ip = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let path = parts.uri.path();
    let method = parts.method.as_str();
    let event = GatewayEvent {
        resource: "/{proxy+}",
        path,
        http_method: method,
        query_string_parameters,
        body,
        is_base64_encoded,
        request_context: GatewayContext {
            request_id: request_id(&parts.headers),
            http_method: method,
            path,
            identity: GatewayIdentity {
                user: parts.headers.get(X_USER).and_then(|v| v.to_str().ok()),
                source_ip,
            },
        },
        headers,
    };

    let json = serde_json::to_vec(&event)
        .map_err(|e| ProxyError::MalformedRequest(format!("unencodable request: {}", e)))?;
    Ok(RequestEnvelope::from_slice(&json)?)
}
