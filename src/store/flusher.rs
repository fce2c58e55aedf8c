//! Periodic snapshotting of a durable counter table.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::store::memory::MemoryCounterStore;

pub struct SnapshotFlusher {
    store: Arc<MemoryCounterStore>,
    interval: Duration,
}

impl SnapshotFlusher {
    pub fn new(store: Arc<MemoryCounterStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Snapshot on every tick until shutdown, then once more.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.store.is_durable() {
            tracing::info!(table = %self.store.table(), "Counter table is not durable, flusher disabled");
            return;
        }

        tracing::info!(
            table = %self.store.table(),
            interval_secs = self.interval.as_secs(),
            "Snapshot flusher starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.flush().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Snapshot flusher received shutdown signal, writing final snapshot");
                    self.flush().await;
                    break;
                }
            }
        }
    }

    async fn flush(&self) {
        let store = self.store.clone();
        match tokio::task::spawn_blocking(move || store.save_snapshot()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Failed to save counter snapshot"),
            Err(e) => tracing::error!(error = %e, "Snapshot task panicked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CounterStore;

    #[tokio::test]
    async fn test_final_snapshot_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryCounterStore::open("hits", dir.path(), 5).unwrap());
        store.increment("/hello").await.unwrap();

        let (tx, rx) = broadcast::channel(1);
        let flusher = SnapshotFlusher::new(store.clone(), Duration::from_secs(3600));
        let handle = tokio::spawn(flusher.run(rx));

        tx.send(()).unwrap();
        handle.await.unwrap();

        let reopened = MemoryCounterStore::open("hits", dir.path(), 5).unwrap();
        assert_eq!(reopened.get("/hello").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_non_durable_store_returns_immediately() {
        let store = Arc::new(MemoryCounterStore::new("hits", 5));
        let (_tx, rx) = broadcast::channel(1);
        SnapshotFlusher::new(store, Duration::from_millis(10)).run(rx).await;
    }
}
