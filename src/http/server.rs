//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway and envelope handlers
//! - Wire up middleware (tracing, body limit, timeout, request ID)
//! - Bind server to listener and drain on shutdown

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ListenerConfig;
use crate::downstream::INVOKE_PATH;
use crate::envelope::RequestEnvelope;
use crate::http::gateway;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::render_envelope;
use crate::lifecycle::shutdown;
use crate::proxy::{CountingProxy, ProxyError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<CountingProxy>,
    pub max_body_bytes: usize,
}

/// Public HTTP server in front of the counting proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &ListenerConfig, proxy: Arc<CountingProxy>) -> Self {
        let state = AppState {
            proxy,
            max_body_bytes: config.max_body_bytes,
        };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ListenerConfig, state: AppState) -> Router {
        Router::new()
            .route(INVOKE_PATH, post(invoke_handler))
            .route("/", any(gateway_handler))
            .route("/{*path}", any(gateway_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The router, for serving on a custom listener or in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Gateway mode: any method, any path.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let envelope = match gateway::into_envelope(request, state.max_body_bytes).await {
        Ok(e) => e,
        Err(e) => return e.into_response(),
    };

    match state.proxy.handle(envelope).await {
        Ok(response) => render_envelope(response),
        Err(e) => e.into_response(),
    }
}

/// Envelope mode: JSON request envelope in, the response envelope out as the downstream sent it.
async fn invoke_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let envelope = match RequestEnvelope::from_slice(&body) {
        Ok(e) => e,
        Err(e) => return ProxyError::from(e).into_response(),
    };

    let response = match state.proxy.handle(envelope).await {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };

    match response.to_json() {
        Ok(json) => (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], json).into_response(),
        Err(e) => ProxyError::DownstreamResponseMalformed(e.to_string()).into_response(),
    }
}
