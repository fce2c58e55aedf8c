//! Serving and draining the public listener.

use std::time::Duration;
use tokio::net::TcpListener;

use crate::config::HitCounterConfig;
use crate::http::HttpServer;
use crate::lifecycle::{Services, Shutdown};
use crate::store::SnapshotFlusher;

/// Serve until `shutdown` fires, then write the final snapshot.
///
/// The flusher listens on its own signal, raised only after the server has
/// drained, so increments made by in-flight requests reach the snapshot.
pub async fn serve(
    config: &HitCounterConfig,
    services: &Services,
    listener: TcpListener,
    shutdown: &Shutdown,
) -> Result<(), std::io::Error> {
    let drained = Shutdown::new();
    let flusher = SnapshotFlusher::new(
        services.store.clone(),
        Duration::from_secs(config.store.flush_interval_secs),
    );
    let flusher_task = tokio::spawn(flusher.run(drained.subscribe()));

    let server = HttpServer::new(&config.listener, services.proxy.clone());
    let result = server.run(listener, shutdown.subscribe()).await;

    tracing::info!("Requests drained, stopping snapshot flusher");
    drained.trigger();
    if let Err(e) = flusher_task.await {
        tracing::error!(error = %e, "Snapshot flusher task failed");
    }

    result
}
