//! In-process counter table with JSON snapshot persistence.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Semaphore;

use crate::observability::metrics;
use crate::store::types::{CounterRecord, StoreError, StoreResult};
use crate::store::CounterStore;

/// A thread-safe counter table keyed by request path.
///
/// Each record is an `AtomicU64`, so concurrent increments for the same path
/// are plain `fetch_add`s and cannot lose updates. First-time keys are
/// inserted under the DashMap shard lock.
pub struct MemoryCounterStore {
    table: String,
    counts: DashMap<String, AtomicU64>,
    snapshot_path: Option<PathBuf>,
    read_permits: Semaphore,
}

impl MemoryCounterStore {
    /// Create an empty, non-durable table.
    pub fn new(table: impl Into<String>, read_capacity: usize) -> Self {
        Self {
            table: table.into(),
            counts: DashMap::new(),
            snapshot_path: None,
            read_permits: Semaphore::new(read_capacity),
        }
    }

    /// Open a durable table stored under `data_dir`, loading any existing snapshot.
    pub fn open(table: impl Into<String>, data_dir: &Path, read_capacity: usize) -> StoreResult<Self> {
        let table = table.into();
        fs::create_dir_all(data_dir)?;
        let snapshot_path = data_dir.join(format!("{}.json", table));

        let mut store = Self::new(table, read_capacity);
        if snapshot_path.exists() {
            let reader = BufReader::new(File::open(&snapshot_path)?);
            let map: BTreeMap<String, u64> = serde_json::from_reader(reader)?;
            for (path, hits) in map {
                store.counts.insert(path, AtomicU64::new(hits));
            }
            metrics::record_tracked_paths(store.counts.len());
            tracing::info!(
                table = %store.table,
                records = store.counts.len(),
                "Loaded counter snapshot"
            );
        }
        store.snapshot_path = Some(snapshot_path);
        Ok(store)
    }

    /// Table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether this table is backed by a snapshot file.
    pub fn is_durable(&self) -> bool {
        self.snapshot_path.is_some()
    }

    /// Number of distinct paths tracked.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Write the table to its snapshot file. Returns the number of records written.
    ///
    /// The file is replaced via rename so a crash mid-write leaves the previous
    /// snapshot intact. No-op for non-durable tables.
    pub fn save_snapshot(&self) -> StoreResult<usize> {
        let Some(path) = &self.snapshot_path else {
            return Ok(0);
        };

        let map = self.snapshot();
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer(&mut writer, &map)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, path)?;

        metrics::record_tracked_paths(map.len());
        tracing::debug!(table = %self.table, records = map.len(), "Saved counter snapshot");
        Ok(map.len())
    }

    fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counts
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Acquire)))
            .collect()
    }

    fn add_one(&self, key: &str) -> u64 {
        if let Some(counter) = self.counts.get(key) {
            return counter.fetch_add(1, Ordering::AcqRel) + 1;
        }
        self.counts
            .entry(key.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::AcqRel)
            + 1
    }

    async fn read_permit(&self) -> StoreResult<tokio::sync::SemaphorePermit<'_>> {
        self.read_permits
            .acquire()
            .await
            .map_err(|_| StoreError::Unavailable(format!("table {} is closed", self.table)))
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str) -> StoreResult<()> {
        let hits = self.add_one(key);
        tracing::trace!(table = %self.table, path = key, hits, "Counter incremented");
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<u64> {
        let _permit = self.read_permit().await?;
        Ok(self
            .counts
            .get(key)
            .map(|c| c.load(Ordering::Acquire))
            .unwrap_or(0))
    }

    async fn list_all(&self) -> StoreResult<Vec<CounterRecord>> {
        let _permit = self.read_permit().await?;
        let records: Vec<CounterRecord> = self
            .snapshot()
            .into_iter()
            .map(|(path, hits)| CounterRecord { path, hits })
            .collect();
        metrics::record_tracked_paths(records.len());
        Ok(records)
    }
}
