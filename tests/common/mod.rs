//! Shared utilities for integration and load testing.

use axum::{body::Bytes, http::StatusCode, routing::post, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use hit_counter::admin::setup_admin_router;
use hit_counter::config::HitCounterConfig;
use hit_counter::downstream::INVOKE_PATH;
use hit_counter::{HttpServer, RequestEnvelope, Services, Shutdown};

/// A running proxy with its admin API.
#[allow(dead_code)]
pub struct TestService {
    pub proxy_addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub services: Services,
    pub shutdown: Shutdown,
}

#[allow(dead_code)]
impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.proxy_addr, path)
    }

    pub fn admin_url(&self, path: &str) -> String {
        format!("http://{}{}", self.admin_addr, path)
    }
}

/// Start the proxy and admin API on ephemeral loopback ports.
pub async fn start_service(config: HitCounterConfig) -> TestService {
    let services = Services::build(&config).expect("services");
    let shutdown = Shutdown::new();

    let admin_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let admin_addr = admin_listener.local_addr().unwrap();
    let admin_app = setup_admin_router(services.admin_state(&config));
    tokio::spawn(async move {
        let _ = axum::serve(admin_listener, admin_app).await;
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_addr = listener.local_addr().unwrap();
    let server = HttpServer::new(&config.listener, services.proxy.clone());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestService {
        proxy_addr,
        admin_addr,
        services,
        shutdown,
    }
}

/// Start a programmable envelope endpoint. `f` returns the transport status
/// and the raw response body.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(RequestEnvelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let f = Arc::new(f);
    let app = Router::new().route(
        INVOKE_PATH,
        post(move |body: Bytes| {
            let f = f.clone();
            async move {
                let request = RequestEnvelope::from_slice(&body).unwrap();
                let (status, body) = f(request).await;
                (StatusCode::from_u16(status).unwrap(), body)
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Config pointing at an envelope endpoint on `backend`.
#[allow(dead_code)]
pub fn http_config(backend: SocketAddr) -> HitCounterConfig {
    let mut config = HitCounterConfig::default();
    config.downstream.target = format!("http://{}{}", backend, INVOKE_PATH);
    config
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
}
