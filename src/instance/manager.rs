// ============================================================================
// Policy Instance Manager
// ============================================================================
//
// Owns the bindings between managed indices and their policies, the
// per-index tick exclusion, and the bounded worker pool. The external
// scheduler only decides *when* to call `tick`/`tick_all`; everything about
// how a tick runs safely lives here.

use crate::backend::IndexBackend;
use crate::config::EngineSettings;
use crate::core::{LifecycleError, Result};
use crate::instance::engine::{PolicyInstance, TickOutcome};
use crate::instance::state::PolicyInstanceState;
use crate::instance::store::StateStore;
use crate::instance::ExecutionContext;
use crate::policy::Policy;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock, Semaphore};

/// Counters exposed for observability, in the spirit of pool statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerStats {
    pub managed_indices: usize,
    pub active_ticks: usize,
    pub completed_ticks: u64,
    pub failed_ticks: u64,
}

pub struct PolicyInstanceManager {
    backend: Arc<dyn IndexBackend>,
    store: Arc<dyn StateStore>,
    settings: EngineSettings,
    policies: RwLock<HashMap<String, Arc<Policy>>>,
    /// index name -> policy name
    bindings: RwLock<HashMap<String, String>>,
    /// Per-index tick exclusion; at most one tick per index at any time.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    limiter: Semaphore,
    active_ticks: AtomicUsize,
    completed_ticks: AtomicU64,
    failed_ticks: AtomicU64,
}

impl PolicyInstanceManager {
    pub fn new(
        settings: EngineSettings,
        backend: Arc<dyn IndexBackend>,
        store: Arc<dyn StateStore>,
    ) -> Result<Self> {
        settings.validate().map_err(LifecycleError::Validation)?;
        let limiter = Semaphore::new(settings.max_concurrent_ticks);
        Ok(Self {
            backend,
            store,
            settings,
            policies: RwLock::new(HashMap::new()),
            bindings: RwLock::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
            limiter,
            active_ticks: AtomicUsize::new(0),
            completed_ticks: AtomicU64::new(0),
            failed_ticks: AtomicU64::new(0),
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Register (or replace) a named policy.
    pub async fn put_policy(&self, name: impl Into<String>, policy: Policy) {
        self.policies
            .write()
            .await
            .insert(name.into(), Arc::new(policy));
    }

    pub async fn policy(&self, name: &str) -> Option<Arc<Policy>> {
        self.policies.read().await.get(name).cloned()
    }

    /// Put `index` under management of the named policy. A fresh state
    /// record is created unless a live one already exists; a record left
    /// behind in DELETED status is replaced.
    pub async fn manage(&self, index: &str, policy_name: &str) -> Result<()> {
        if self.policy(policy_name).await.is_none() {
            return Err(LifecycleError::Validation(format!(
                "policy '{}' does not exist",
                policy_name
            )));
        }
        let needs_fresh_state = match self.store.get(index).await? {
            Some(state) => state.status.is_deleted(),
            None => true,
        };
        if needs_fresh_state {
            self.store
                .put(index, &PolicyInstanceState::new(policy_name))
                .await?;
        }
        self.bindings
            .write()
            .await
            .insert(index.to_string(), policy_name.to_string());
        debug!("index '{}' now managed by policy '{}'", index, policy_name);
        Ok(())
    }

    /// Stop managing `index` and drop its state record. Called when the
    /// index itself ceases to exist.
    pub async fn retire(&self, index: &str) -> Result<()> {
        self.bindings.write().await.remove(index);
        self.locks.lock().await.remove(index);
        self.store.remove(index).await
    }

    pub async fn managed_indices(&self) -> Vec<String> {
        let mut indices: Vec<String> = self.bindings.read().await.keys().cloned().collect();
        indices.sort_unstable();
        indices
    }

    /// Run one tick for `index` with a wall-clock context.
    pub async fn tick(&self, index: &str) -> Result<TickOutcome> {
        let ctx = ExecutionContext::new(self.backend.clone());
        self.tick_with_context(index, ctx).await
    }

    /// Run one tick with a scheduler-supplied context (clock, identity,
    /// simulate flag).
    pub async fn tick_with_context(
        &self,
        index: &str,
        ctx: ExecutionContext,
    ) -> Result<TickOutcome> {
        let (policy_name, policy) = self.binding_for(index).await?;

        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| LifecycleError::Store("tick limiter is closed".to_string()))?;
        let lock = self.lock_for(index).await;
        let _guard = lock.lock().await;

        self.active_ticks.fetch_add(1, Ordering::SeqCst);
        let instance = PolicyInstance::new(index, policy_name, policy, self.store.clone());
        let result = instance.tick(&ctx).await;
        self.active_ticks.fetch_sub(1, Ordering::SeqCst);

        match &result {
            Ok(TickOutcome::Deleted) => {
                self.completed_ticks.fetch_add(1, Ordering::SeqCst);
                self.bindings.write().await.remove(index);
                info!("policy instance for index '{}' retired after delete", index);
            }
            Ok(_) => {
                self.completed_ticks.fetch_add(1, Ordering::SeqCst);
            }
            Err(error) => {
                self.failed_ticks.fetch_add(1, Ordering::SeqCst);
                warn!("tick failed for index '{}': {}", index, error);
            }
        }
        result
    }

    /// Administrative force retry: re-run the tick immediately, outside the
    /// scheduler cadence. State-only in effect and otherwise identical to a
    /// normal tick.
    pub async fn execute_retry(&self, index: &str) -> Result<TickOutcome> {
        info!("force retry requested for index '{}'", index);
        self.tick(index).await
    }

    /// Evaluate what the next tick would do without executing actions or
    /// persisting state.
    pub async fn simulate(&self, index: &str) -> Result<TickOutcome> {
        let ctx = ExecutionContext::new(self.backend.clone()).simulated();
        self.tick_with_context(index, ctx).await
    }

    /// Tick every managed index, bounded by `max_concurrent_ticks`. No
    /// cross-index ordering is guaranteed.
    pub async fn tick_all(&self) -> Vec<(String, Result<TickOutcome>)> {
        let indices = self.managed_indices().await;
        let ticks = indices.into_iter().map(|index| async move {
            let outcome = self.tick(&index).await;
            (index, outcome)
        });
        futures::future::join_all(ticks).await
    }

    pub async fn stats(&self) -> ManagerStats {
        ManagerStats {
            managed_indices: self.bindings.read().await.len(),
            active_ticks: self.active_ticks.load(Ordering::SeqCst),
            completed_ticks: self.completed_ticks.load(Ordering::SeqCst),
            failed_ticks: self.failed_ticks.load(Ordering::SeqCst),
        }
    }

    async fn binding_for(&self, index: &str) -> Result<(String, Arc<Policy>)> {
        let policy_name = self
            .bindings
            .read()
            .await
            .get(index)
            .cloned()
            .ok_or_else(|| {
                LifecycleError::Validation(format!("index '{}' is not managed", index))
            })?;
        let policy = self.policy(&policy_name).await.ok_or_else(|| {
            LifecycleError::Validation(format!("policy '{}' does not exist", policy_name))
        })?;
        Ok((policy_name, policy))
    }

    async fn lock_for(&self, index: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(index.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
