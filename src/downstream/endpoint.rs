//! Exposes a `Handler` over HTTP so it can be invoked as a remote downstream.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::Arc;

use crate::downstream::handler::{Handler, HandlerError};
use crate::downstream::INVOKE_PATH;
use crate::envelope::RequestEnvelope;

/// Router serving `handler` on `POST /_invoke`.
pub fn handler_router(handler: Arc<dyn Handler>) -> Router {
    Router::new()
        .route(INVOKE_PATH, post(invoke_handler))
        .with_state(handler)
}

async fn invoke_handler(State(handler): State<Arc<dyn Handler>>, body: Bytes) -> Response {
    let request = match RequestEnvelope::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected invalid request envelope");
            return error_body(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    match handler.handle(&request).await {
        Ok(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
        Err(e @ HandlerError::MissingField(_)) => error_body(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            tracing::error!(error = %e, "Handler failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downstream::{DownstreamClient, HandlerRef, HttpDownstream, InvokeError};
    use crate::handlers::GreetingHandler;
    use std::time::Duration;

    async fn serve(router: Router) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        addr
    }

    #[tokio::test]
    async fn test_http_round_trip_through_endpoint() {
        let addr = serve(handler_router(Arc::new(GreetingHandler))).await;
        let target: HandlerRef = format!("http://{}{}", addr, INVOKE_PATH).parse().unwrap();
        let client = HttpDownstream::new(Duration::from_secs(2));

        let request = RequestEnvelope::from_slice(
            br#"{"path":"/hello","requestContext":{"identity":{"user":"Amy"}}}"#,
        )
        .unwrap();
        let resp = client.invoke(&target, &request).await.unwrap();

        assert_eq!(resp.status_code(), 200);
        assert_eq!(resp.body(), "Hello, Amy! You have hit /hello\n");
        assert_eq!(resp.header("content-type"), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_handler_rejection_is_transport_failure() {
        let addr = serve(handler_router(Arc::new(GreetingHandler))).await;
        let target: HandlerRef = format!("http://{}{}", addr, INVOKE_PATH).parse().unwrap();
        let client = HttpDownstream::new(Duration::from_secs(2));

        let request = RequestEnvelope::from_slice(br#"{"path":"/hello"}"#).unwrap();
        let err = client.invoke(&target, &request).await.unwrap_err();
        assert!(matches!(err, InvokeError::Failed(_)));
    }
}
