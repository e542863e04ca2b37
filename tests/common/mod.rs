//! Shared test support: an in-memory fake backend, injected per test.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use indexwarden::{
    AllocationRules, IndexBackend, IndexInfo, LifecycleError, Result, SnapshotState,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
pub struct FakeIndex {
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub doc_count: u64,
    pub segments_per_shard: u32,
    pub priority: Option<u32>,
    pub replica_count: Option<u32>,
    pub write_blocked: bool,
    pub closed: bool,
    pub allocation: Option<AllocationRules>,
}

impl FakeIndex {
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            size_bytes: 0,
            doc_count: 0,
            segments_per_shard: 1,
            priority: None,
            replica_count: None,
            write_blocked: false,
            closed: false,
            allocation: None,
        }
    }

    pub fn aged_days(mut self, days: i64) -> Self {
        self.created_at = Utc::now() - Duration::days(days);
        self
    }

    pub fn size_gb(mut self, gb: u64) -> Self {
        self.size_bytes = gb * 1024 * 1024 * 1024;
        self
    }

    pub fn docs(mut self, count: u64) -> Self {
        self.doc_count = count;
        self
    }

    pub fn segments(mut self, per_shard: u32) -> Self {
        self.segments_per_shard = per_shard;
        self
    }
}

/// Test double for the backend collaborator. All behavior is injected per
/// test instance; nothing is process-wide.
#[derive(Default)]
pub struct FakeBackend {
    indices: Mutex<HashMap<String, FakeIndex>>,
    aliases: Mutex<HashMap<String, Vec<String>>>,
    snapshots: Mutex<HashMap<String, SnapshotState>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_index(&self, name: &str, index: FakeIndex) {
        self.indices.lock().unwrap().insert(name.to_string(), index);
    }

    pub fn update_index(&self, name: &str, f: impl FnOnce(&mut FakeIndex)) {
        let mut indices = self.indices.lock().unwrap();
        f(indices.get_mut(name).expect("index registered"));
    }

    pub fn index(&self, name: &str) -> Option<FakeIndex> {
        self.indices.lock().unwrap().get(name).cloned()
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indices.lock().unwrap().contains_key(name)
    }

    pub fn add_alias(&self, alias: &str, members: &[&str]) {
        self.aliases.lock().unwrap().insert(
            alias.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
    }

    /// Force every call of the named operation to fail until healed.
    pub fn fail_operation(&self, operation: &str) {
        self.failing.lock().unwrap().insert(operation.to_string());
    }

    pub fn heal_operation(&self, operation: &str) {
        self.failing.lock().unwrap().remove(operation);
    }

    /// Let an outstanding force merge reach its target.
    pub fn finish_merge(&self, index: &str) {
        self.update_index(index, |i| i.segments_per_shard = 1);
    }

    pub fn finish_snapshot(&self, snapshot: &str) {
        self.snapshots
            .lock()
            .unwrap()
            .insert(snapshot.to_string(), SnapshotState::Success);
    }

    pub fn snapshot_names(&self) -> Vec<String> {
        self.snapshots.lock().unwrap().keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(operation))
            .count()
    }

    /// Highest number of backend calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, operation: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(operation) {
            return Err(LifecycleError::Backend(format!(
                "injected failure for '{}'",
                operation
            )));
        }
        Ok(())
    }

    async fn enter(&self) {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        // Widen the race window so lost exclusion would be observed.
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl IndexBackend for FakeBackend {
    async fn index_info(&self, index: &str) -> Result<IndexInfo> {
        self.enter().await;
        self.record(format!("index_info {}", index));
        let result = self.check("index_info").and_then(|_| {
            self.indices
                .lock()
                .unwrap()
                .get(index)
                .map(|i| IndexInfo {
                    created_at: i.created_at,
                    size_bytes: i.size_bytes,
                    doc_count: i.doc_count,
                })
                .ok_or_else(|| LifecycleError::IndexNotFound(index.to_string()))
        });
        self.exit();
        result
    }

    async fn alias_members(&self, alias: &str) -> Result<Vec<String>> {
        self.record(format!("alias_members {}", alias));
        self.check("alias_members")?;
        Ok(self
            .aliases
            .lock()
            .unwrap()
            .get(alias)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_allocation(&self, index: &str, rules: &AllocationRules) -> Result<()> {
        self.record(format!("update_allocation {}", index));
        self.check("update_allocation")?;
        let mut indices = self.indices.lock().unwrap();
        let entry = indices
            .get_mut(index)
            .ok_or_else(|| LifecycleError::IndexNotFound(index.to_string()))?;
        entry.allocation = Some(rules.clone());
        Ok(())
    }

    async fn close_index(&self, index: &str) -> Result<()> {
        self.record(format!("close {}", index));
        self.check("close")?;
        let mut indices = self.indices.lock().unwrap();
        let entry = indices
            .get_mut(index)
            .ok_or_else(|| LifecycleError::IndexNotFound(index.to_string()))?;
        entry.closed = true;
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        self.record(format!("delete {}", index));
        self.check("delete")?;
        self.indices
            .lock()
            .unwrap()
            .remove(index)
            .map(|_| ())
            .ok_or_else(|| LifecycleError::IndexNotFound(index.to_string()))
    }

    async fn rollover(&self, index: &str, alias: Option<&str>) -> Result<()> {
        self.record(format!("rollover {} {}", index, alias.unwrap_or("-")));
        self.check("rollover")?;
        if !self.indices.lock().unwrap().contains_key(index) {
            return Err(LifecycleError::IndexNotFound(index.to_string()));
        }
        Ok(())
    }

    async fn set_priority(&self, index: &str, priority: u32) -> Result<()> {
        self.record(format!("set_priority {} {}", index, priority));
        self.check("set_priority")?;
        let mut indices = self.indices.lock().unwrap();
        let entry = indices
            .get_mut(index)
            .ok_or_else(|| LifecycleError::IndexNotFound(index.to_string()))?;
        entry.priority = Some(priority);
        Ok(())
    }

    async fn set_write_block(&self, index: &str) -> Result<()> {
        self.record(format!("set_write_block {}", index));
        self.check("set_write_block")?;
        let mut indices = self.indices.lock().unwrap();
        let entry = indices
            .get_mut(index)
            .ok_or_else(|| LifecycleError::IndexNotFound(index.to_string()))?;
        entry.write_blocked = true;
        Ok(())
    }

    async fn set_replica_count(&self, index: &str, replicas: u32) -> Result<()> {
        self.record(format!("set_replica_count {} {}", index, replicas));
        self.check("set_replica_count")?;
        let mut indices = self.indices.lock().unwrap();
        let entry = indices
            .get_mut(index)
            .ok_or_else(|| LifecycleError::IndexNotFound(index.to_string()))?;
        entry.replica_count = Some(replicas);
        Ok(())
    }

    async fn start_force_merge(&self, index: &str, max_num_segments: u32) -> Result<()> {
        self.record(format!("start_force_merge {} {}", index, max_num_segments));
        self.check("start_force_merge")?;
        if !self.indices.lock().unwrap().contains_key(index) {
            return Err(LifecycleError::IndexNotFound(index.to_string()));
        }
        Ok(())
    }

    async fn max_segments_per_shard(&self, index: &str) -> Result<u32> {
        self.record(format!("max_segments_per_shard {}", index));
        self.check("max_segments_per_shard")?;
        self.indices
            .lock()
            .unwrap()
            .get(index)
            .map(|i| i.segments_per_shard)
            .ok_or_else(|| LifecycleError::IndexNotFound(index.to_string()))
    }

    async fn start_snapshot(&self, index: &str, snapshot: &str, repository: &str) -> Result<()> {
        self.record(format!("start_snapshot {} {} {}", index, snapshot, repository));
        self.check("start_snapshot")?;
        self.snapshots
            .lock()
            .unwrap()
            .insert(snapshot.to_string(), SnapshotState::InProgress);
        Ok(())
    }

    async fn snapshot_state(&self, snapshot: &str, repository: &str) -> Result<SnapshotState> {
        self.record(format!("snapshot_state {} {}", snapshot, repository));
        self.check("snapshot_state")?;
        self.snapshots
            .lock()
            .unwrap()
            .get(snapshot)
            .copied()
            .ok_or_else(|| {
                LifecycleError::Backend(format!("snapshot '{}' does not exist", snapshot))
            })
    }
}
