// ============================================================================
// Backend collaborator interface
// ============================================================================
//
// The engine never touches the storage cluster directly. Every concrete
// lifecycle operation goes through this trait, implemented outside the core.
// Implementations are expected to bound their own calls with timeouts; the
// engine treats `IndexNotFound` as a normal recoverable outcome.

use crate::core::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Observable facts about one index, as reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    /// When the index was created.
    pub created_at: DateTime<Utc>,
    /// Primary store size in bytes.
    pub size_bytes: u64,
    /// Number of documents.
    pub doc_count: u64,
}

/// Reported state of a snapshot job started earlier via
/// [`IndexBackend::start_snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotState {
    InProgress,
    Success,
    Failed,
}

/// Node attribute routing rules applied by the allocation action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationRules {
    pub require: HashMap<String, String>,
    pub include: HashMap<String, String>,
    pub exclude: HashMap<String, String>,
}

/// Executor for the concrete index operations the engine orchestrates.
///
/// Synchronous operations complete within the call. `start_force_merge` and
/// `start_snapshot` only start a job; completion is observed by polling
/// `max_segments_per_shard` / `snapshot_state` from a gating condition.
#[async_trait]
pub trait IndexBackend: Send + Sync {
    async fn index_info(&self, index: &str) -> Result<IndexInfo>;

    /// Names of the indices currently behind `alias`.
    async fn alias_members(&self, alias: &str) -> Result<Vec<String>>;

    async fn update_allocation(&self, index: &str, rules: &AllocationRules) -> Result<()>;

    async fn close_index(&self, index: &str) -> Result<()>;

    async fn delete_index(&self, index: &str) -> Result<()>;

    /// Roll the write alias over to a fresh index. With `alias` absent the
    /// backend resolves the write alias of `index` itself.
    async fn rollover(&self, index: &str, alias: Option<&str>) -> Result<()>;

    async fn set_priority(&self, index: &str, priority: u32) -> Result<()>;

    /// Block writes to the index.
    async fn set_write_block(&self, index: &str) -> Result<()>;

    async fn set_replica_count(&self, index: &str, replicas: u32) -> Result<()>;

    async fn start_force_merge(&self, index: &str, max_num_segments: u32) -> Result<()>;

    /// Largest per-shard segment count of the index. A finished force merge
    /// leaves every shard at or below the requested segment count.
    async fn max_segments_per_shard(&self, index: &str) -> Result<u32>;

    async fn start_snapshot(&self, index: &str, snapshot: &str, repository: &str) -> Result<()>;

    async fn snapshot_state(&self, snapshot: &str, repository: &str) -> Result<SnapshotState>;
}
