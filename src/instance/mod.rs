pub mod engine;
pub mod manager;
pub mod state;
pub mod store;

pub use engine::{PolicyInstance, TickOutcome};
pub use manager::{ManagerStats, PolicyInstanceManager};
pub use state::{ActionState, ConditionState, ErrorInfo, PolicyInstanceState, StepState, Status};
pub use store::{FileStateStore, MemoryStateStore, StateStore};

use crate::backend::IndexBackend;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Per-tick execution environment handed to conditions and actions.
///
/// The scheduler supplies the clock, the acting identity and the simulate
/// flag; the engine injects the backend handle. Conditions and actions must
/// read time from `now` rather than the wall clock so ticks stay
/// deterministic under test.
#[derive(Clone)]
pub struct ExecutionContext {
    pub backend: Arc<dyn IndexBackend>,
    pub now: DateTime<Utc>,
    /// Identity on whose behalf the tick runs, if the caller tracks one.
    pub principal: Option<String>,
    /// Evaluate and report only; no backend mutation, no state persisted.
    pub simulate: bool,
}

impl ExecutionContext {
    pub fn new(backend: Arc<dyn IndexBackend>) -> Self {
        Self {
            backend,
            now: Utc::now(),
            principal: None,
            simulate: false,
        }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn principal(mut self, principal: &str) -> Self {
        self.principal = Some(principal.to_string());
        self
    }

    pub fn simulated(mut self) -> Self {
        self.simulate = true;
        self
    }
}
