//! Counter store subsystem.
//!
//! # Data Flow
//! ```text
//! CountingProxy
//!     → CounterStore::increment(path)   (atomic add 1 to `hits`)
//!
//! Admin API
//!     → CounterStore::get / list_all    (bounded by read capacity)
//!
//! MemoryCounterStore (memory.rs)
//!     → DashMap<path, AtomicU64>
//!     → flusher.rs snapshots to {data_dir}/{table}.json on an interval and at shutdown
//! ```
//!
//! # Design Decisions
//! - Increments are a single atomic add on the record; the client never reads then writes
//! - Records are created on first increment and never deleted here

pub mod flusher;
pub mod memory;
pub mod types;

pub use flusher::SnapshotFlusher;
pub use memory::MemoryCounterStore;
pub use types::{CounterRecord, StoreError, StoreResult};

use async_trait::async_trait;

/// Client for a durable per-key counter table.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically add one to the counter for `key`, creating it if unseen.
    async fn increment(&self, key: &str) -> StoreResult<()>;

    /// Current count for `key`; zero when the key has never been incremented.
    async fn get(&self, key: &str) -> StoreResult<u64>;

    /// Every record in the table, sorted by path.
    async fn list_all(&self) -> StoreResult<Vec<CounterRecord>>;
}
